#[macro_use]
extern crate tracing;

mod app_config;
mod args;

use app_config::AppConfig;
pub use app_config::get_config_dir;
pub use args::Args;
use color_eyre::Result;
use eyre::Context as _;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    net::SocketAddr,
    path::Path,
    time::Duration,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RconConfig {
    pub address: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebConfig {
    pub listen_address: SocketAddr,
    pub telemetry_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    app_config: AppConfig,
    pub rcon: RconConfig,
    pub web: WebConfig,
    /// Collector name to enabled state. Names absent here keep their default.
    #[serde(default)]
    pub collectors: BTreeMap<String, bool>,
}

impl Config {
    /// Layers the built-in defaults, `config.yaml` in the config directory,
    /// the file passed with `--config` and finally the command-line flags.
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        Self::load(&get_config_dir(), args)
    }

    fn load(config_dir: &Path, args: &Args) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        if let Some(path) = &args.config {
            debug!(path = %path.display(), "Loading configuration file from args");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(args.clone());

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }

    /// Rejects settings the exporter cannot run with.
    pub fn validate(&self) -> Result<()> {
        eyre::ensure!(!self.rcon.address.trim().is_empty(), "rcon.address must not be empty");
        eyre::ensure!(self.rcon.timeout_seconds > 0, "rcon.timeout_seconds must be greater than zero");
        eyre::ensure!(
            self.web.telemetry_path.starts_with('/'),
            "web.telemetry_path must start with '/', got {:?}",
            self.web.telemetry_path
        );
        eyre::ensure!(
            self.web.telemetry_path != "/" && self.web.telemetry_path != "/healthz",
            "web.telemetry_path {:?} collides with a built-in route",
            self.web.telemetry_path
        );
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rcon.timeout_seconds)
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    /// The effective configuration as YAML, without the RCON password.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).context("Failed to serialize config")
    }
}
