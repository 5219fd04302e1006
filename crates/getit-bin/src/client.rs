//! Client mode: build one request from command words, send it, print the
//! responses.

use anyhow::{bail, Context};
use getit_net::TcpClient;
use getit_protocol::{Request, Status};

/// Send one request and print each response's data payload. StreamDone
/// frames are never printed; error statuses abort with a nonzero exit.
pub async fn run_client(port: u16, command: &[String]) -> anyhow::Result<()> {
    let request = Request::from_args(command)?;
    let client = TcpClient::new(port);
    let responses = client
        .call(&request)
        .await
        .with_context(|| format!("request to 127.0.0.1:{port} failed"))?;

    for response in &responses {
        match response.status {
            Status::Ok => {
                if request.verb.produces_data() {
                    println!("{}", response.data_payload());
                }
            }
            // a missing key prints as an empty line (an impossible value)
            Status::NotFound => println!(),
            Status::StreamDone => {}
            Status::ServerError => bail!("server error"),
            Status::InvalidRequest => bail!("invalid request"),
        }
    }
    Ok(())
}
