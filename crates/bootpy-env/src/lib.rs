//! Provision an isolated Python environment and delegate to a package inside it.
//!
//! `builder::Provisioner` runs the whole sequence; the other modules are its
//! building blocks and are public so `bootpy-admin` can inspect state.

pub mod activation;
pub mod builder;
pub mod command;
pub mod delegate;
pub mod installer;
pub mod interpreter;
pub mod lock;
pub mod log;
pub mod marker;

pub use activation::Activation;
pub use builder::{Provisioned, Provisioner};
pub use interpreter::{Interpreter, InterpreterSource, PathProbe, SearchPath};
pub use marker::{CompletionMarker, EnvState};
