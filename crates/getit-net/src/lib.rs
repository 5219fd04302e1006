//! TCP layer for the getit server and client.
//!
//! This crate provides:
//! - The accept loop and per-connection request/response handling
//! - Stream fan-out to the socket (with the terminal StreamDone frame)
//! - The one-shot TCP client

mod client;
mod error;
mod server;

pub use client::TcpClient;
pub use error::{NetError, NetResult};
pub use server::{Outcome, TcpServer};
