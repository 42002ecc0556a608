use crate::{
    collectors::Collector,
    rcon::Transport,
};
use std::{
    collections::BTreeMap,
    sync::Arc,
};

/// Builds a collector around the shared transport.
pub type CollectorFactory = fn(Arc<dyn Transport>) -> eyre::Result<Arc<dyn Collector>>;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("collector {0:?} is already registered")]
    Duplicate(&'static str),
    #[error("unknown collector {name:?} in overrides, known collectors: {known}")]
    UnknownCollector { name: String, known: String },
    #[error("failed to build collector {name:?}: {report}")]
    Factory { name: &'static str, report: eyre::Report },
}

struct Entry {
    enabled_by_default: bool,
    factory: CollectorFactory,
}

/// A collector selected for this process, together with its registry name.
#[derive(Clone)]
pub struct NamedCollector {
    pub name: &'static str,
    pub collector: Arc<dyn Collector>,
}

impl std::fmt::Debug for NamedCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedCollector").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Startup-time record of every collector the exporter knows about.
///
/// Entries are only ever added, and only before the enabled set is built.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Entry>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.enabled_by_default)))
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &'static str,
        enabled_by_default: bool,
        factory: CollectorFactory,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.entries.insert(
            name,
            Entry {
                enabled_by_default,
                factory,
            },
        );
        Ok(())
    }

    /// Registered names with their default state, in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.entries
            .iter()
            .map(|(name, entry)| (*name, entry.enabled_by_default))
    }

    /// Applies `overrides` on top of the defaults and instantiates every
    /// enabled collector, in name order.
    pub fn build_enabled_set(
        &self,
        overrides: &BTreeMap<String, bool>,
        transport: Arc<dyn Transport>,
    ) -> Result<Vec<NamedCollector>, RegistryError> {
        if let Some(name) = overrides.keys().find(|name| !self.entries.contains_key(name.as_str())) {
            return Err(RegistryError::UnknownCollector {
                name: name.clone(),
                known: self.entries.keys().copied().collect::<Vec<_>>().join(", "),
            });
        }

        let mut enabled = Vec::new();
        for (&name, entry) in &self.entries {
            let is_enabled = overrides.get(name).copied().unwrap_or(entry.enabled_by_default);
            if !is_enabled {
                debug!(collector = name, "Collector disabled");
                continue;
            }

            let collector = (entry.factory)(Arc::clone(&transport))
                .map_err(|report| RegistryError::Factory { name, report })?;
            info!(collector = name, "Collector enabled");
            enabled.push(NamedCollector { name, collector });
        }

        Ok(enabled)
    }
}
