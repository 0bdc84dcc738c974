pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod maze;
pub mod position;
pub mod rng;
pub mod runtime;
pub mod server_protocol;
pub mod session;
pub mod targeting;
pub mod types;
