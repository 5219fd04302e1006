//! TCP server implementation.
//!
//! Every connection carries exactly one framed request and is closed after
//! its response (or response stream) has been written. The `Exit` verb
//! additionally cancels the listener once its response is out.

use crate::NetResult;
use getit_protocol::{next_request_id, read_frame, write_frame, Request, Response, Status, Verb};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The result of dispatching one request.
pub enum Outcome {
    /// A single response frame.
    Single(Response),
    /// A stream of response frames; the server filters NotFound markers and
    /// appends the terminal StreamDone frame.
    Stream(mpsc::Receiver<Response>),
}

/// Handler function type for dispatching decoded requests.
type HandlerFn = Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Outcome> + Send>> + Send + Sync>;

/// TCP server that listens on localhost and hands decoded requests to a
/// dispatcher.
pub struct TcpServer {
    listener: TcpListener,
    handler: HandlerFn,
    shutdown: CancellationToken,
}

impl TcpServer {
    /// Bind the listener on `127.0.0.1:<port>` (0 picks an ephemeral port).
    pub async fn bind<F, Fut>(port: u16, handler: F) -> NetResult<Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let handler: HandlerFn = Arc::new(move |request| Box::pin(handler(request)));

        Ok(Self {
            listener,
            handler,
            shutdown: CancellationToken::new(),
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A token that stops the accept loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown. In-flight connections drain on
    /// their own tasks.
    pub async fn run(self) -> NetResult<()> {
        info!(addr = %self.local_addr()?, "Listening");

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let handler = self.handler.clone();
                            let shutdown = self.shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handler, shutdown).await {
                                    error!(error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handle a single client connection: one request, one response or stream.
async fn handle_connection(
    mut stream: TcpStream,
    handler: HandlerFn,
    shutdown: CancellationToken,
) -> NetResult<()> {
    let payload = read_frame(&mut stream).await?;

    let request = match Request::decode(&payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Failed to decode request");
            let response = Response::with_status(next_request_id(), Status::InvalidRequest);
            write_frame(&mut stream, &response.encode()).await?;
            return Ok(());
        }
    };
    info!(%request, "Received request");
    let verb = request.verb;

    match handler(request).await {
        Outcome::Single(response) => {
            debug!(%response, "Sending response");
            write_frame(&mut stream, &response.encode()).await?;
        }
        Outcome::Stream(mut responses) => {
            let mut id = 0;
            while let Some(response) = responses.recv().await {
                // unset slot markers never reach the client
                if response.status == Status::NotFound {
                    continue;
                }
                id = response.id;
                write_frame(&mut stream, &response.encode()).await?;
            }
            let done = Response::with_status(id, Status::StreamDone);
            debug!(%done, "Stream complete");
            write_frame(&mut stream, &done.encode()).await?;
        }
    }

    if verb == Verb::Exit {
        info!("Exit requested; closing listener");
        shutdown.cancel();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TcpClient;
    use getit_protocol::Value;

    async fn spawn_echo_server() -> (SocketAddr, CancellationToken) {
        let server = TcpServer::bind(0, |request: Request| async move {
            Outcome::Single(Response::ok(request.id, request.value))
        })
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        let token = server.shutdown_token();
        tokio::spawn(server.run());
        (addr, token)
    }

    #[tokio::test]
    async fn test_single_request_response() {
        let (addr, token) = spawn_echo_server().await;
        let client = TcpClient::new(addr.port());

        let request = Request::with_key_value(Verb::Store, "k", Value::Int(7));
        let responses = client.call(&request).await.unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status, Status::Ok);
        assert_eq!(responses[0].value, Some(Value::Int(7)));
        token.cancel();
    }

    #[tokio::test]
    async fn test_stream_filters_markers_and_terminates() {
        let server = TcpServer::bind(0, |request: Request| async move {
            let (tx, rx) = mpsc::channel(8);
            tokio::spawn(async move {
                for i in 0..3 {
                    tx.send(Response::ok(request.id, Some(Value::Int(i))))
                        .await
                        .unwrap();
                    tx.send(Response::with_status(request.id, Status::NotFound))
                        .await
                        .unwrap();
                }
            });
            Outcome::Stream(rx)
        })
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let client = TcpClient::new(addr.port());
        let responses = client.call(&Request::new(Verb::Keys)).await.unwrap();

        // three Ok frames, then exactly one StreamDone; no NotFound markers
        assert_eq!(responses.len(), 4);
        assert!(responses[..3].iter().all(|r| r.status == Status::Ok));
        assert!(responses[3].is_stream_done());
    }

    #[tokio::test]
    async fn test_malformed_request_gets_invalid_request() {
        let (addr, token) = spawn_echo_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_frame(&mut stream, &[0xFF, 0x01]).await.unwrap();
        let payload = read_frame(&mut stream).await.unwrap();
        let response = Response::decode(&payload).unwrap();

        assert_eq!(response.status, Status::InvalidRequest);
        token.cancel();
    }

    #[tokio::test]
    async fn test_exit_cancels_listener() {
        let (addr, token) = spawn_echo_server().await;
        let client = TcpClient::new(addr.port());

        let responses = client.call(&Request::new(Verb::Exit)).await.unwrap();
        assert_eq!(responses[0].status, Status::Ok);

        tokio::time::timeout(std::time::Duration::from_secs(1), token.cancelled())
            .await
            .expect("listener did not shut down");
    }

    #[tokio::test]
    async fn test_connection_per_request() {
        let (addr, token) = spawn_echo_server().await;
        let client = TcpClient::new(addr.port());

        for i in 0..5 {
            let request = Request::with_key_value(Verb::Store, "k", Value::Int(i));
            let responses = client.call(&request).await.unwrap();
            assert_eq!(responses[0].value, Some(Value::Int(i)));
        }
        token.cancel();
    }
}
