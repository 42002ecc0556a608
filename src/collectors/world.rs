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

pub const NAME: &str = "world";
const SUBSYSTEM: &str = "world";

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(NAME, false, WorldCollector::factory)
}

/// World clock and difficulty of the default world.
///
/// Disabled by default since `time query` requires the RCON user to have
/// operator level 2.
pub struct WorldCollector {
    transport: Arc<dyn Transport>,
    daytime: Arc<Descriptor>,
    gametime: Arc<Descriptor>,
    day: Arc<Descriptor>,
    difficulty: Arc<Descriptor>,
}

impl WorldCollector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            daytime: Descriptor::new(SUBSYSTEM, "daytime_ticks", "Ticks since the start of the current day.", &[]),
            gametime: Descriptor::new(SUBSYSTEM, "gametime_ticks", "Ticks since the world was created.", &[]),
            day: Descriptor::new(SUBSYSTEM, "day", "Number of in-game days elapsed.", &[]),
            difficulty: Descriptor::new(SUBSYSTEM, "difficulty", "Current world difficulty.", &["difficulty"]),
        }
    }

    fn factory(transport: Arc<dyn Transport>) -> eyre::Result<Arc<dyn Collector>> {
        Ok(Arc::new(Self::new(transport)))
    }

    async fn query_time(&self, query: &str) -> Result<Option<f64>, UpdateError> {
        let raw = self.transport.execute(&format!("time query {query}")).await?;
        let ticks = reply::parse_time(&raw);
        if ticks.is_none() {
            debug!(query, raw = %raw, "Unrecognised time reply");
        }
        Ok(ticks.map(|ticks| ticks as f64))
    }
}

impl Collector for WorldCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn descriptors(&self) -> Vec<Arc<Descriptor>> {
        vec![
            Arc::clone(&self.daytime),
            Arc::clone(&self.gametime),
            Arc::clone(&self.day),
            Arc::clone(&self.difficulty),
        ]
    }

    fn update<'a>(&'a self, sink: &'a mut SampleSink) -> BoxFuture<'a, Result<(), UpdateError>> {
        Box::pin(async move {
            let no_labels = Vec::<String>::new;

            if let Some(ticks) = self.query_time("daytime").await? {
                sink.gauge(&self.daytime, ticks, no_labels())?;
            }
            if let Some(ticks) = self.query_time("gametime").await? {
                sink.counter(&self.gametime, ticks, no_labels())?;
            }
            if let Some(day) = self.query_time("day").await? {
                sink.gauge(&self.day, day, no_labels())?;
            }

            let raw = self.transport.execute("difficulty").await?;
            match reply::parse_difficulty(&raw) {
                Some(difficulty) => sink.gauge(&self.difficulty, 1.0, [difficulty])?,
                None => debug!(raw = %raw, "Unrecognised difficulty reply"),
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::ValueType,
        rcon::mock::MockTransport,
    };
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn reads_clock_and_difficulty() {
        let transport = MockTransport::new()
            .reply("time query daytime", "The time is 6000")
            .reply("time query gametime", "The time is 1234567")
            .reply("time query day", "The time is 51")
            .reply("difficulty", "The difficulty is Hard");
        let collector = WorldCollector::new(Arc::new(transport));
        let mut sink = SampleSink::new(1);
        collector.update(&mut sink).await.unwrap();

        let values: Vec<_> = sink
            .samples()
            .iter()
            .map(|s| (s.descriptor().fq_name(), s.value_type(), s.value(), s.label_values().to_vec()))
            .collect();
        assert_eq!(values, vec![
            ("minecraft_world_daytime_ticks", ValueType::Gauge, 6000.0, vec![]),
            ("minecraft_world_gametime_ticks", ValueType::Counter, 1234567.0, vec![]),
            ("minecraft_world_day", ValueType::Gauge, 51.0, vec![]),
            ("minecraft_world_difficulty", ValueType::Gauge, 1.0, vec!["hard".to_string()]),
        ]);
    }

    #[tokio::test]
    async fn unparseable_values_are_skipped() {
        let transport = MockTransport::new()
            .reply("time query daytime", "Unknown or incomplete command")
            .reply("time query gametime", "The time is 1234567")
            .reply("time query day", "")
            .reply("difficulty", "");
        let collector = WorldCollector::new(Arc::new(transport));
        let mut sink = SampleSink::new(1);
        collector.update(&mut sink).await.unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.samples()[0].descriptor().fq_name(), "minecraft_world_gametime_ticks");
    }
}
