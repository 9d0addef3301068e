//! Edge access gate for the Agents of Chaos research site.
//!
//! Each request is handled in three steps:
//! 1. preview hosts (e.g. `*.pages.dev`) get a `301` to the canonical host, path and query intact
//! 2. anything without the shared password in a Basic `Authorization` header gets a `401`
//! 3. everything else is passed unchanged to the static site handler
//!
//! The gate is stateless. Configuration is resolved once at startup and injected.

pub mod canonical;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod server;
pub mod site;

pub use config::{Cli, GateConfig, ServeConfig};
pub use error::{GateError, Result};
pub use gate::{AccessGate, Decision};
