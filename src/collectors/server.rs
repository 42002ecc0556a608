use crate::{
    collectors::{
        reply,
        Collector,
        Registry,
        RegistryError,
        SampleSink,
        UpdateError,
    },
    metrics::Descriptor,
    rcon::Transport,
};
use futures::future::BoxFuture;
use std::sync::Arc;

pub const NAME: &str = "server";
const SUBSYSTEM: &str = "server";

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(NAME, true, ServerCollector::factory)
}

/// Player counts from the header of the `list` reply
pub struct ServerCollector {
    transport: Arc<dyn Transport>,
    players_online: Arc<Descriptor>,
    players_max: Arc<Descriptor>,
}

impl ServerCollector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            players_online: Descriptor::new(
                SUBSYSTEM,
                "players_online_count",
                "Number of players currently online.",
                &[],
            ),
            players_max: Descriptor::new(SUBSYSTEM, "players_max", "Maximum number of players allowed online.", &[]),
        }
    }

    fn factory(transport: Arc<dyn Transport>) -> eyre::Result<Arc<dyn Collector>> {
        Ok(Arc::new(Self::new(transport)))
    }
}

impl Collector for ServerCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn descriptors(&self) -> Vec<Arc<Descriptor>> {
        vec![Arc::clone(&self.players_online), Arc::clone(&self.players_max)]
    }

    fn update<'a>(&'a self, sink: &'a mut SampleSink) -> BoxFuture<'a, Result<(), UpdateError>> {
        Box::pin(async move {
            let raw = self.transport.execute("list").await?;
            let Some(counts) = reply::extract_player_counts(&raw) else {
                debug!(raw = %raw, "No player counts in list reply");
                return Ok(());
            };

            sink.gauge(&self.players_online, f64::from(counts.online), Vec::<String>::new())?;
            sink.gauge(&self.players_max, f64::from(counts.max), Vec::<String>::new())?;
            Ok(())
        })
    }
}
