use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "protochain")]
pub struct Opt {
    #[arg(
        long = "node",
        global = true,
        help = "Node address, overrides NODE_ADDRESS"
    )]
    pub node: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a node holding a fresh chain")]
    StartNode {
        #[arg(help = "Address credited by the genesis block, overrides GENESIS_WALLET")]
        genesis_address: Option<String>,
    },
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "mine", about = "Mine pending transactions on a node")]
    Mine {
        #[arg(
            long = "wallet",
            help = "Private key that receives rewards, overrides MINER_WALLET"
        )]
        wallet: Option<String>,
        #[arg(long = "once", help = "Mine at most one block, then exit")]
        once: bool,
    },
    #[command(name = "send", about = "Send funds to an address")]
    Send {
        #[arg(help = "Private key of the paying wallet")]
        from_private_key: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: i64,
    },
    #[command(name = "status", about = "Show the node status")]
    Status,
    #[command(
        name = "getbalance",
        about = "Get the wallet balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "getblock", about = "Show a block by index or hash")]
    GetBlock {
        #[arg(help = "Block index or block hash")]
        key: String,
    },
    #[command(name = "gettx", about = "Locate a transaction in the mempool or the chain")]
    GetTx {
        #[arg(help = "Transaction hash")]
        hash: String,
    },
}
