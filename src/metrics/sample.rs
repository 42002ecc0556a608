use super::{
    Descriptor,
    ValueType,
};
use std::sync::Arc;

/// Raised when a sample's label values do not line up with its descriptor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{fq_name} expects {expected} label values, got {actual}")]
pub struct InconsistentLabels {
    pub fq_name: String,
    pub expected: usize,
    pub actual: usize,
}

/// One labeled observation produced during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    descriptor: Arc<Descriptor>,
    label_values: Vec<String>,
    value: f64,
    value_type: ValueType,
    scrape: u64,
}

impl Sample {
    /// Creates a sample, checking that the label values match the descriptor's
    /// label names in arity.
    pub fn new(
        descriptor: &Arc<Descriptor>,
        value_type: ValueType,
        value: f64,
        label_values: Vec<String>,
        scrape: u64,
    ) -> Result<Self, InconsistentLabels> {
        let expected = descriptor.label_names().len();
        if label_values.len() != expected {
            return Err(InconsistentLabels {
                fq_name: descriptor.fq_name().to_string(),
                expected,
                actual: label_values.len(),
            });
        }

        Ok(Self {
            descriptor: Arc::clone(descriptor),
            label_values,
            value,
            value_type,
            scrape,
        })
    }

    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Label names zipped with their values, in descriptor order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.descriptor
            .label_names()
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Value of a single label, if the descriptor has it.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(key, _)| *key == name).map(|(_, value)| value)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Sequence number of the scrape that produced this sample.
    pub fn scrape(&self) -> u64 {
        self.scrape
    }
}
