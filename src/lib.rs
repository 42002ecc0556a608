//! # Minecraft Exporter
//!
//! Publishes the state of a Minecraft server as Prometheus metrics. Every
//! scrape sends administrative commands over RCON, parses the free-text
//! replies and serves the result as OpenMetrics text.
//!
//! ## Architecture
//!
//! - **`rcon`**: The `Transport` seam and the Source RCON client behind it
//! - **`metrics`**: Metric descriptors and the samples emitted against them
//! - **`collectors`**: Reply parsing, the collector registry and the scrape orchestrator
//! - **`http`**: The axum server and OpenMetrics encoding
//! - **`logging`**: Error report and tracing subscriber setup
//!
//! ## Usage
//!
//! ```bash
//! # Serve metrics on :9940/metrics
//! minecraft-exporter --rcon.address=127.0.0.1:25575 --rcon.password=secret
//!
//! # Also collect world time and difficulty, and print a single scrape
//! minecraft-exporter --collector.enable=world --once
//! ```

#[macro_use]
extern crate tracing;

pub mod collectors;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod rcon;

pub use collectors::{
    register_builtin,
    Orchestrator,
    Registry,
};
pub use logging::{
    init_errors,
    init_logging,
};
pub use minecraft_exporter_config::{
    Args,
    Config,
};
