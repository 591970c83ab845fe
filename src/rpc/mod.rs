//! RPC module
//!
//! - JSON-RPC 2.0 over HTTP and WebSocket (jsonrpsee), namespace `beacon`
//! - Maps `DutiesError` kinds onto JSON-RPC error codes; nothing below this layer knows
//!   about transport codes
//!
//! To integrate: build a `DutyServices` and pass it to `RpcServer::new()`.

pub mod handlers;
pub mod server;

pub use handlers::{to_rpc_error, BeaconDutiesApiClient, BeaconDutiesApiServer, DutiesRpc};
pub use server::RpcServer;
