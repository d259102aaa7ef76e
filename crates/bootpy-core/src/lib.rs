pub mod config;
pub mod error;
pub mod lockfile;

pub use error::{ProvisionError, Result};
