pub mod config;
pub mod error;
pub mod graph;

pub use config::{Config, SshPolicy};
pub use error::ConfigError;
pub use graph::*;
