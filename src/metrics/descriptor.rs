use super::{
    build_fq_name,
    NAMESPACE,
};
use std::sync::Arc;

/// The immutable shape of one metric: its fully-qualified name, help text and
/// the ordered label names every sample has to fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    fq_name: String,
    help: String,
    label_names: Vec<&'static str>,
}

impl Descriptor {
    /// Builds a descriptor under the [`NAMESPACE`] namespace.
    pub fn new(subsystem: &str, name: &str, help: impl Into<String>, label_names: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            fq_name: build_fq_name(NAMESPACE, subsystem, name),
            help: help.into(),
            label_names: label_names.to_vec(),
        })
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[&'static str] {
        &self.label_names
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{{}}}", self.fq_name, self.label_names.join(","))
    }
}
