pub mod client;
pub mod config;
pub mod controllers;
pub mod endpoints;
pub mod errors;
pub mod pipeline;
pub mod scores;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub mod testing;
