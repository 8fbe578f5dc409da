use crate::error::{BlockchainError, Result};
use crate::network::api::ApiResponse;
use crate::network::server::Request;
use crate::utils::serialize;
use log::debug;
use serde_json::Deserializer;
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const TCP_TIMEOUT: u64 = 5000;

/// Sends one request to the node at `addr` and waits for its reply
pub fn send_request(addr: &str, request: &Request) -> Result<ApiResponse> {
    let socket_addr = addr
        .parse::<SocketAddr>()
        .map_err(|e| BlockchainError::Network(format!("Invalid address {addr}: {e}")))?;

    debug!("Sending request to {socket_addr}: {request:?}");
    let mut stream = TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_TIMEOUT))
        .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;

    stream
        .set_write_timeout(Some(Duration::from_millis(TCP_TIMEOUT)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
    stream
        .set_read_timeout(Some(Duration::from_millis(TCP_TIMEOUT)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

    stream
        .write_all(&serialize(request)?)
        .map_err(|e| BlockchainError::Network(format!("Failed to send data: {e}")))?;
    stream.flush()?;

    let reader = BufReader::new(&stream);
    match Deserializer::from_reader(reader)
        .into_iter::<ApiResponse>()
        .next()
    {
        Some(response) => Ok(response?),
        None => Err(BlockchainError::Network(format!(
            "Connection to {addr} closed without a response"
        ))),
    }
}
