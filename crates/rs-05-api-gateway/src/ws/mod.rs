//! Websocket endpoints for the shell relay.

pub mod handler;
pub mod transport;

pub use handler::Endpoint;
pub use transport::WsTransport;
