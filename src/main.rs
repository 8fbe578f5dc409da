// Entry point for the protochain node and its command-line clients
// One process either serves the chain (startnode) or talks to a running node
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use protochain::cli::{mine_next, send_funds};
use protochain::network::{send_request, ApiResponse, NodeApi, Request, Server, WalletInfo};
use protochain::{BlockchainError, Blockchain, Command, Opt, Wallet, GLOBAL_CONFIG};
use std::process;
use std::thread;
use std::time::Duration;

// How long the miner waits before asking again when there is nothing to mine
const MINER_POLL_INTERVAL: u64 = 5;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Some(node) = opt.node {
        GLOBAL_CONFIG.set_node_addr(node);
    }

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn print_body(response: ApiResponse) -> Result<(), Box<dyn std::error::Error>> {
    let status = response.status;
    let pretty = serde_json::to_string_pretty(&response.body)?;
    if response.is_success() {
        println!("{pretty}");
        Ok(())
    } else {
        Err(format!("Node answered {status}: {pretty}").into())
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let node = GLOBAL_CONFIG.get_node_addr();
    match command {
        Command::StartNode { genesis_address } => {
            if let Some(address) = genesis_address {
                GLOBAL_CONFIG.set_genesis_wallet(address);
            }
            let genesis_address = match GLOBAL_CONFIG.get_genesis_wallet() {
                Some(address) => address,
                None => {
                    // Nobody named a founder, so I mint one and show its key once
                    let wallet = Wallet::new()?;
                    println!("Genesis wallet private key: {}", wallet.get_private_key());
                    wallet.get_address().to_string()
                }
            };

            let chain = Blockchain::new(&genesis_address)?;
            info!("Genesis reward goes to {genesis_address}");
            Server::new(NodeApi::new(chain))
                .run(&node)
                .map_err(|e| format!("Server error: {e}"))?
        }
        Command::Createwallet => {
            let wallet = Wallet::new()?;
            println!("Private key: {}", wallet.get_private_key());
            println!("Your new address: {}", wallet.get_address());
        }
        Command::Mine { wallet, once } => {
            if let Some(private_key) = wallet {
                GLOBAL_CONFIG.set_miner_wallet(private_key);
            }
            let private_key = GLOBAL_CONFIG.get_miner_wallet().ok_or_else(|| {
                BlockchainError::Config("no miner wallet: pass --wallet or set MINER_WALLET".into())
            })?;
            let miner = Wallet::from_private_key(&private_key)?;
            println!("Mining for {} on {node}", miner.get_address());

            loop {
                match mine_next(&node, &miner) {
                    Ok(Some(block)) => println!("Mined block #{} {}", block.get_index(), block.get_hash()),
                    Ok(None) => {
                        if once {
                            println!("Nothing to mine");
                        }
                    }
                    // A stale template or a lost race is routine; I just ask again
                    Err(e) => warn!("Mining round failed: {e}"),
                }
                if once {
                    break;
                }
                thread::sleep(Duration::from_secs(MINER_POLL_INTERVAL));
            }
        }
        Command::Send {
            from_private_key,
            to,
            amount,
        } => {
            if amount < 1 {
                return Err("Amount must be positive".into());
            }
            let wallet = Wallet::from_private_key(&from_private_key)?;
            let tx = send_funds(&node, &wallet, &to, amount)?;
            println!("Success! Transaction {}", tx.get_id());
        }
        Command::Status => print_body(send_request(&node, &Request::Status)?)?,
        Command::GetBalance { address } => {
            let request = Request::GetWallet {
                address: address.clone(),
            };
            let info: WalletInfo = send_request(&node, &request)?.into_result()?;
            println!("Balance of {address}: {}", info.balance);
        }
        Command::GetBlock { key } => print_body(send_request(&node, &Request::GetBlock { key })?)?,
        Command::GetTx { hash } => {
            print_body(send_request(&node, &Request::GetTransaction { hash })?)?
        }
    }
    Ok(())
}
