pub mod audit;
pub mod config;
pub mod error;
pub mod estimator;
pub mod gate;
pub mod impact;
pub mod output;
pub mod plan;
pub mod server;
pub mod types;
