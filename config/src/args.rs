use clap::Parser;
use std::path::PathBuf;

/// Prometheus exporter for a Minecraft server, scraped over RCON.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, long_version = long_version(), about, long_about = None)]
pub struct Args {
    /// Additional configuration file, layered over the one in the config directory.
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address of the server's RCON listener.
    #[clap(long = "rcon.address", env = "MC_RCON_ADDRESS", value_name = "HOST:PORT")]
    pub rcon_address: Option<String>,

    /// RCON password.
    #[clap(long = "rcon.password", env = "MC_RCON_PASSWORD", hide_env_values = true)]
    pub rcon_password: Option<String>,

    /// Upper bound for one RCON round-trip, including connect and login.
    #[clap(long = "rcon.timeout-seconds", value_name = "SECONDS")]
    pub rcon_timeout_seconds: Option<u64>,

    /// Address the HTTP server binds to.
    #[clap(long = "web.listen-address", value_name = "HOST:PORT")]
    pub web_listen_address: Option<String>,

    /// Path under which metrics are exposed.
    #[clap(long = "web.telemetry-path", value_name = "PATH")]
    pub web_telemetry_path: Option<String>,

    /// Enable a collector. Can be given multiple times.
    #[clap(long = "collector.enable", value_name = "NAME")]
    pub enable_collectors: Vec<String>,

    /// Disable a collector. Can be given multiple times and wins over `--collector.enable`.
    #[clap(long = "collector.disable", value_name = "NAME")]
    pub disable_collectors: Vec<String>,

    /// Print the known collectors with their default state and exit.
    #[clap(long, action)]
    pub list_collectors: bool,

    /// Run a single scrape, print the exposition text and exit.
    #[clap(long, action)]
    pub once: bool,

    /// Log at debug level.
    #[clap(short, long, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(address) = &self.rcon_address {
                cache.insert("rcon.address".to_string(), address.clone().into());
            }
            if let Some(password) = &self.rcon_password {
                cache.insert("rcon.password".to_string(), password.clone().into());
            }
            if let Some(timeout) = self.rcon_timeout_seconds {
                cache.insert("rcon.timeout_seconds".to_string(), timeout.into());
            }
            if let Some(address) = &self.web_listen_address {
                cache.insert("web.listen_address".to_string(), address.clone().into());
            }
            if let Some(path) = &self.web_telemetry_path {
                cache.insert("web.telemetry_path".to_string(), path.clone().into());
            }
            for name in &self.enable_collectors {
                cache.insert(format!("collectors.{name}"), true.into());
            }
            for name in &self.disable_collectors {
                cache.insert(format!("collectors.{name}"), false.into());
            }
            Ok(cache)
        }
    }
}

fn long_version() -> String {
    let version = clap::crate_version!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "\
{version}

Config directory: {config_dir_path}"
    )
}
