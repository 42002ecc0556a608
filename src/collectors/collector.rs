use crate::{
    metrics::{
        Descriptor,
        InconsistentLabels,
        Sample,
        ValueType,
    },
    rcon::TransportError,
};
use futures::future::BoxFuture;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    InconsistentLabels(#[from] InconsistentLabels),
}

/// Trait for one observable domain of the game server
pub trait Collector: Send + Sync {
    /// Get the name of this collector
    fn name(&self) -> &'static str;

    /// Metric shapes this collector may emit
    fn descriptors(&self) -> Vec<Arc<Descriptor>>;

    /// Query the server and emit the current samples into `sink`.
    ///
    /// Collectors keep no state between calls; everything is rebuilt from
    /// fresh transport replies.
    fn update<'a>(&'a self, sink: &'a mut SampleSink) -> BoxFuture<'a, Result<(), UpdateError>>;
}

/// Receives the samples of one collector during one scrape and tags each with
/// the scrape's sequence number.
#[derive(Debug)]
pub struct SampleSink {
    scrape: u64,
    samples: Vec<Sample>,
}

impl SampleSink {
    pub fn new(scrape: u64) -> Self {
        Self {
            scrape,
            samples: Vec::new(),
        }
    }

    pub fn scrape(&self) -> u64 {
        self.scrape
    }

    pub fn emit<I, S>(
        &mut self,
        descriptor: &Arc<Descriptor>,
        value_type: ValueType,
        value: f64,
        label_values: I,
    ) -> Result<(), InconsistentLabels>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label_values = label_values.into_iter().map(Into::into).collect();
        self.samples
            .push(Sample::new(descriptor, value_type, value, label_values, self.scrape)?);
        Ok(())
    }

    pub fn gauge<I, S>(&mut self, descriptor: &Arc<Descriptor>, value: f64, label_values: I) -> Result<(), InconsistentLabels>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emit(descriptor, ValueType::Gauge, value, label_values)
    }

    pub fn counter<I, S>(
        &mut self,
        descriptor: &Arc<Descriptor>,
        value: f64,
        label_values: I,
    ) -> Result<(), InconsistentLabels>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emit(descriptor, ValueType::Counter, value, label_values)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}
