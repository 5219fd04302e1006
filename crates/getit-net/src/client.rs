//! One-shot TCP client.

use crate::NetResult;
use getit_protocol::{read_frame, write_frame, Request, Response, Status};
use tokio::net::TcpStream;
use tracing::debug;

/// Client for sending a single framed request to a getit server.
pub struct TcpClient {
    addr: String,
}

impl TcpClient {
    /// Create a client for `127.0.0.1:<port>`.
    pub fn new(port: u16) -> Self {
        Self {
            addr: format!("127.0.0.1:{port}"),
        }
    }

    /// Send one request and collect its responses.
    ///
    /// A unary request yields one response. A stream request yields every
    /// Ok frame followed by the terminal frame (StreamDone, or the error
    /// status that ended the stream).
    pub async fn call(&self, request: &Request) -> NetResult<Vec<Response>> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        debug!(%request, addr = %self.addr, "Sending request");

        write_frame(&mut stream, &request.encode()).await?;

        let mut responses = Vec::new();
        loop {
            let payload = read_frame(&mut stream).await?;
            let response = Response::decode(&payload)?;
            debug!(%response, "Received response");

            let done = !request.is_stream() || response.status != Status::Ok;
            responses.push(response);
            if done {
                break;
            }
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_failure() {
        // port 1 is never listening on loopback in the test environment
        let client = TcpClient::new(1);
        let result = client.call(&Request::new(getit_protocol::Verb::Count)).await;
        assert!(result.is_err());
    }
}
