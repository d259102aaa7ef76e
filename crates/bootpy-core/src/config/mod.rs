//! bootpy configuration layer.
//!
//! All environment variable reads are centralised here; the provisioner only
//! sees a resolved [`ProvisionConfig`] and never calls `std::env::var` itself.
//!
//! - `loader`: `.env` parsing and the `env_or` / `env_optional` / `env_bool` helpers
//! - `schema`: `ProvisionConfig`, `PackageSource`, `InstallerKind`, `ObservabilityConfig`
//! - `env_keys`: key constants, including legacy aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv, DotenvLayer, EnvLookup};
pub use schema::{
    InstallerKind, InterpreterConfig, ObservabilityConfig, PackageSource, ProvisionConfig,
};
