use crate::{
    collectors::{
        NamedCollector,
        SampleSink,
    },
    metrics::{
        Descriptor,
        InconsistentLabels,
        Sample,
    },
};
use futures::FutureExt as _;
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
    },
    time::{
        Duration,
        Instant,
    },
};
use tokio::task::JoinSet;
use tracing::Instrument as _;

const SUBSYSTEM: &str = "scrape";

/// How one collector fared during a scrape.
#[derive(Debug)]
struct CollectorReport {
    name: &'static str,
    success: bool,
    duration: Duration,
    samples: Vec<Sample>,
}

/// Runs every enabled collector on each scrape and merges their samples with
/// per-collector success and duration metrics.
pub struct Orchestrator {
    collectors: Vec<NamedCollector>,
    scrapes: AtomicU64,
    collector_duration: Arc<Descriptor>,
    collector_success: Arc<Descriptor>,
}

impl Orchestrator {
    pub fn new(collectors: Vec<NamedCollector>) -> Self {
        Self {
            collectors,
            scrapes: AtomicU64::new(0),
            collector_duration: Descriptor::new(
                SUBSYSTEM,
                "collector_duration_seconds",
                "minecraft_exporter: Duration of a collector scrape.",
                &["collector"],
            ),
            collector_success: Descriptor::new(
                SUBSYSTEM,
                "collector_success",
                "minecraft_exporter: Whether a collector succeeded.",
                &["collector"],
            ),
        }
    }

    /// Names of the collectors run on every scrape.
    pub fn collector_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collectors.iter().map(|named| named.name)
    }

    /// Runs one scrape.
    ///
    /// Collectors run concurrently. One collector failing or panicking only
    /// marks that collector as unsuccessful. Dropping the returned future
    /// aborts every collector still in flight.
    pub async fn run_scrape(&self) -> Vec<Sample> {
        let scrape = self.scrapes.fetch_add(1, Ordering::Relaxed) + 1;

        async move {
            let start = Instant::now();
            let mut tasks = JoinSet::new();
            for named in &self.collectors {
                tasks.spawn(run_collector(named.clone(), scrape));
            }

            let mut reports = Vec::with_capacity(self.collectors.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => error!(error = %e, "Collector task did not complete"),
                }
            }
            let missing = missing_reports(&self.collectors, &reports, start.elapsed());
            reports.extend(missing);
            reports.sort_by_key(|report| report.name);

            let mut meta = SampleSink::new(scrape);
            let mut samples = Vec::new();
            for report in reports {
                if let Err(e) = self.record_report(&mut meta, &report) {
                    error!(collector = report.name, error = %e, "Failed to record collector metrics");
                }
                samples.extend(report.samples);
            }

            let mut merged = meta.into_samples();
            merged.extend(samples);
            debug!(samples = merged.len(), elapsed = ?start.elapsed(), "Scrape finished");
            merged
        }
        .instrument(info_span!("scrape", scrape))
        .await
    }

    fn record_report(&self, meta: &mut SampleSink, report: &CollectorReport) -> Result<(), InconsistentLabels> {
        meta.gauge(&self.collector_duration, report.duration.as_secs_f64(), [report.name])?;
        meta.gauge(&self.collector_success, if report.success { 1.0 } else { 0.0 }, [report.name])
    }
}

async fn run_collector(named: NamedCollector, scrape: u64) -> CollectorReport {
    let NamedCollector { name, collector } = named;
    let mut sink = SampleSink::new(scrape);
    let start = Instant::now();

    let outcome = AssertUnwindSafe(async { collector.update(&mut sink).await })
        .catch_unwind()
        .await;
    let duration = start.elapsed();

    let (success, samples) = match outcome {
        Ok(Ok(())) => {
            debug!(collector = name, duration_seconds = duration.as_secs_f64(), "Collector succeeded");
            (true, sink.into_samples())
        }
        Ok(Err(e)) => {
            error!(collector = name, duration_seconds = duration.as_secs_f64(), error = %e, "Collector failed");
            (false, sink.into_samples())
        }
        Err(panic) => {
            error!(collector = name, panic = panic_message(panic.as_ref()), "Collector panicked");
            (false, Vec::new())
        }
    };

    CollectorReport {
        name,
        success,
        duration,
        samples,
    }
}

/// Failed reports for collectors whose task ended without reporting.
fn missing_reports(collectors: &[NamedCollector], reports: &[CollectorReport], elapsed: Duration) -> Vec<CollectorReport> {
    collectors
        .iter()
        .filter(|named| !reports.iter().any(|report| report.name == named.name))
        .map(|named| CollectorReport {
            name: named.name,
            success: false,
            duration: elapsed,
            samples: Vec::new(),
        })
        .collect()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
