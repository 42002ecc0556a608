/// Namespace prepended to every metric this exporter produces.
pub const NAMESPACE: &str = "minecraft";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Gauge,
    Counter,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Gauge => "gauge",
            ValueType::Counter => "counter",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joins the non-empty parts with `_`, e.g. `("minecraft", "players", "online")`
/// becomes `minecraft_players_online`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}
