//! Command handlers.
//!
//!   run       - the wrapper: provision, then delegate
//!   status    - report configuration and environment state
//!   provision - provision / reprovision without delegating
//!   clean     - remove the environment

pub mod clean;
pub mod provision;
pub mod run;
pub mod status;
