pub mod config;
pub mod error;
pub mod provenance;
pub mod types;

pub use config::Config;
pub use error::DaybookError;
pub use types::*;
