pub mod cli;
pub mod config;
pub mod node;
pub mod service_handle;

pub use cli::run_cli;
pub use config::DutiesConfig;
pub use node::Node;
pub use service_handle::ServiceHandle;
