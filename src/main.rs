use clap::Parser;
use color_eyre::Result;
use eyre::Context as _;
use minecraft_exporter::{
    collectors::register_builtin,
    http,
    init_errors,
    init_logging,
    rcon::{
        RconClient,
        Transport,
    },
    Args,
    Config,
    Orchestrator,
    Registry,
};
use std::sync::Arc;
use tracing::{
    debug,
    info,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut registry = Registry::new();
    register_builtin(&mut registry)?;

    if args.list_collectors {
        for (name, enabled_by_default) in registry.entries() {
            let state = if enabled_by_default { "enabled" } else { "disabled" };
            println!("{name} ({state} by default)");
        }
        return Ok(());
    }

    let config = Config::new(&args).wrap_err("Failed to load configuration")?;
    config.validate()?;
    debug!(config = %config.to_yaml()?, config_dir = %config.config_dir().display(), "Configuration loaded");

    let transport: Arc<dyn Transport> = Arc::new(RconClient::new(
        config.rcon.address.clone(),
        config.rcon.password.clone(),
        config.timeout(),
    ));
    let collectors = registry.build_enabled_set(&config.collectors, transport)?;
    let orchestrator = Arc::new(Orchestrator::new(collectors));
    info!(
        rcon = %config.rcon.address,
        collectors = ?orchestrator.collector_names().collect::<Vec<_>>(),
        "Starting minecraft exporter"
    );

    if args.once {
        let samples = orchestrator.run_scrape().await;
        print!("{}", http::exposition::encode_samples(samples)?);
        return Ok(());
    }

    http::serve(&config.web, orchestrator).await
}
