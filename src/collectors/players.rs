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

pub const NAME: &str = "players";
const SUBSYSTEM: &str = "players";

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(NAME, true, PlayerCollector::factory)
}

/// Everything reported about one online player. Fields that could not be read
/// hold the parser fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDetails {
    pub username: String,
    pub dimension: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub experience: String,
}

impl PlayerDetails {
    /// Label values in the order of `minecraft_players_online`'s label names.
    fn into_label_values(self) -> [String; 6] {
        [self.username, self.dimension, self.x, self.y, self.z, self.experience]
    }
}

/// Emits one `minecraft_players_online` sample per player in the `list` reply
pub struct PlayerCollector {
    transport: Arc<dyn Transport>,
    players_online: Arc<Descriptor>,
}

impl PlayerCollector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            players_online: Descriptor::new(
                SUBSYSTEM,
                "online",
                "Minecraft players online.",
                &["username", "dimension", "x", "y", "z", "experience"],
            ),
        }
    }

    fn factory(transport: Arc<dyn Transport>) -> eyre::Result<Arc<dyn Collector>> {
        Ok(Arc::new(Self::new(transport)))
    }

    /// Runs an entity query. A failed query is reported as an empty reply so
    /// the parser falls back to its defaults for that field only.
    async fn query_entity(&self, username: &str, path: &str) -> String {
        let command = format!("data get entity @p[name={username}] {path}");
        match self.transport.execute(&command).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(username, path, error = %e, "Player query failed, using defaults");
                String::new()
            }
        }
    }

    async fn player_details(&self, username: String) -> PlayerDetails {
        let (position, dimension, experience) = tokio::join!(
            self.query_entity(&username, "Pos"),
            self.query_entity(&username, "Dimension"),
            self.query_entity(&username, "XpLevel"),
        );

        let [x, y, z] = reply::parse_position(&position);
        PlayerDetails {
            dimension: reply::parse_dimension(&dimension),
            experience: reply::parse_experience(&experience),
            username,
            x,
            y,
            z,
        }
    }
}

impl Collector for PlayerCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn descriptors(&self) -> Vec<Arc<Descriptor>> {
        vec![Arc::clone(&self.players_online)]
    }

    fn update<'a>(&'a self, sink: &'a mut SampleSink) -> BoxFuture<'a, Result<(), UpdateError>> {
        Box::pin(async move {
            let raw_list = self.transport.execute("list").await?;
            let players = reply::parse_player_list(&raw_list);
            if players.is_empty() {
                debug!(raw = %raw_list, "No players online");
                return Ok(());
            }

            for player in players {
                debug!(username = %player, "Minecraft user active");
                let details = self.player_details(player).await;
                sink.gauge(&self.players_online, 1.0, details.into_label_values())?;
            }

            Ok(())
        })
    }
}
