//! # Collectors Module
//!
//! This module turns RCON replies into metric samples.
//!
//! ## Architecture
//!
//! - **`Collector` trait**: Interface every metric collector implements
//! - **`Registry`**: Startup-time catalogue of collectors and their default state
//! - **`PlayerCollector`**: One sample per online player with position, dimension and experience
//! - **`ServerCollector`**: Online and maximum player counts
//! - **`WorldCollector`**: World clock and difficulty
//! - **`Orchestrator`**: Runs the enabled collectors concurrently on every scrape
//!
//! ## Data Sources
//!
//! - **RCON**: Every value comes from the text reply of an administrative command,
//!   parsed by the functions in [`reply`]

pub mod collector;
pub mod orchestrator;
pub mod players;
pub mod registry;
pub mod reply;
pub mod server;
pub mod world;

pub use collector::{
    Collector,
    SampleSink,
    UpdateError,
};
pub use orchestrator::Orchestrator;
pub use players::PlayerCollector;
pub use registry::{
    CollectorFactory,
    NamedCollector,
    Registry,
    RegistryError,
};
pub use server::ServerCollector;
pub use world::WorldCollector;

/// Registers every collector shipped with the exporter.
pub fn register_builtin(registry: &mut Registry) -> Result<(), RegistryError> {
    players::register(registry)?;
    server::register(registry)?;
    world::register(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_collectors_register_once() {
        let mut registry = Registry::new();
        register_builtin(&mut registry).unwrap();

        assert_eq!(registry.entries().collect::<Vec<_>>(), vec![
            ("players", true),
            ("server", true),
            ("world", false),
        ]);
        assert!(matches!(
            register_builtin(&mut registry),
            Err(RegistryError::Duplicate("players"))
        ));
    }
}
