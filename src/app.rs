use color_eyre::{
    eyre::WrapErr,
    Result,
};
use player_count_config::{
    Args,
    Config,
};
use player_count_stats_gatherer::{
    build_sink,
    MySqlInventory,
    ProviderRegistry,
    ReconciliationLoop,
    Scheduler,
    Tick,
};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

pub struct App {
    config: Config,
    once: bool,
}

impl App {
    /// Loads and validates the configuration. An invalid configuration is the only fatal error.
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(&args).wrap_err("Failed to load configuration")?;
        config.validate().wrap_err("Invalid configuration")?;
        debug!(config_dir = %config.config_dir().display(), "Loaded configuration");

        Ok(Self { config, once: args.once })
    }

    fn build_loop(&self) -> Result<ReconciliationLoop> {
        let timeout = self.config.request_timeout();
        let inventory = Arc::new(MySqlInventory::connect_lazy(&self.config.inventory, timeout));
        let registry = ProviderRegistry::from_config(&self.config.providers, timeout)
            .wrap_err("Failed to set up the stats providers")?;
        let sink = build_sink(&self.config.sink, timeout).wrap_err("Failed to set up the metric sink")?;

        info!(
            inventory = %format!("{}:{}/{}", self.config.inventory.host, self.config.inventory.port, self.config.inventory.database),
            providers = registry.len(),
            sink = sink.name(),
            "Initialized"
        );

        Ok(ReconciliationLoop::new(inventory, Arc::new(registry), sink)
            .with_max_concurrency(self.config.max_concurrency)
            .with_call_timeout(timeout))
    }

    pub async fn run(self) -> Result<()> {
        let reconciliation = self.build_loop()?;

        if self.once {
            let report = reconciliation.run_once().await;
            info!(written = report.written, skipped = report.skipped, "Single run finished");
            return Ok(());
        }

        let scheduler = Scheduler::new(self.config.interval());
        info!(interval = %humantime::format_duration(scheduler.interval()), "Starting the logger");

        let shutdown = CancellationToken::new();
        tokio::spawn(cancel_on_signal(shutdown.clone()));

        let ticks = scheduler.run(&reconciliation, shutdown).await;
        info!(ticks, "Stopped");
        Ok(())
    }
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, stopping after the current tick"),
        () = terminate => info!("Received SIGTERM, stopping after the current tick"),
    }
    shutdown.cancel();
}
