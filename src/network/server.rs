use crate::error::{BlockchainError, Result};
use crate::network::api::{ApiResponse, NodeApi, STATUS_UNPROCESSABLE};
use crate::utils::serialize;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Deserializer, Value};
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 60;

/// One call against the node. Requests stream over a connection as
/// back-to-back JSON values; each gets exactly one `ApiResponse` back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Status,
    NextBlock,
    GetBlock { key: String },
    Mempool,
    SubmitBlock { block: Value },
    SubmitTransaction { transaction: Value },
    GetTransaction { hash: String },
    GetWallet { address: String },
}

pub struct Server {
    api: NodeApi,
}

impl Server {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    pub fn bind(addr: &str) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))
    }

    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = Self::bind(addr)?;
        self.serve(listener)
    }

    /// Accepts connections forever, one handler thread each
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("Server listening on {local_addr}");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let api = self.api.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&api, stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(api: &NodeApi, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        let reader = BufReader::new(&stream);
        let requests = Deserializer::from_reader(reader).into_iter::<Request>();

        for request in requests {
            let response = match request {
                Ok(request) => {
                    debug!("Received request from {peer_addr}: {request:?}");
                    Self::dispatch(api, request)
                }
                Err(e) => {
                    // The stream cannot resync after a malformed value
                    warn!("Malformed request from {peer_addr}: {e}");
                    let response = ApiResponse::message(STATUS_UNPROCESSABLE, &e.to_string());
                    Self::send_response(&stream, &response)?;
                    break;
                }
            };
            Self::send_response(&stream, &response)?;
        }

        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    pub fn dispatch(api: &NodeApi, request: Request) -> ApiResponse {
        match request {
            Request::Status => api.status(),
            Request::NextBlock => api.next_block_template(),
            Request::GetBlock { key } => api.block_by_index_or_hash(&key),
            Request::Mempool => api.mempool(),
            Request::SubmitBlock { block } => api.submit_block(block),
            Request::SubmitTransaction { transaction } => api.submit_transaction(transaction),
            Request::GetTransaction { hash } => api.transaction_by_hash(&hash),
            Request::GetWallet { address } => api.wallet_info(&address),
        }
    }

    fn send_response(mut stream: &TcpStream, response: &ApiResponse) -> Result<()> {
        let bytes = serialize(response)?;
        stream
            .write_all(&bytes)
            .map_err(|e| BlockchainError::Network(format!("Failed to send response: {e}")))?;
        stream.flush()?;
        Ok(())
    }
}
