use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use spark_gateway::config::{LauncherConfig, RetryPolicy, ServerConfig};
use spark_gateway::gateway::SparkGateway;
use spark_gateway::http::{run_server, ApiState};
use spark_gateway::metrics::Metrics;
use spark_gateway::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "spark-gateway")]
#[command(version)]
#[command(about = "HTTP gateway that submits, queries and kills Spark applications via spark-submit")]
struct Args {
    /// Spark home directory
    #[arg(long, env = "SPARK_HOME", default_value = "/opt/spark")]
    spark_home: PathBuf,

    /// Directory with spark configuration presets
    #[arg(long, env = "SPARK_CONF_DIR")]
    spark_conf_dir: PathBuf,

    /// Spark master address
    #[arg(long, env = "SPARK_MASTER")]
    master: String,

    /// Write spark-submit output to the log
    #[arg(long, env = "DEBUG_SPARK_SUBMIT", value_parser = BoolishValueParser::new())]
    debug_submit: bool,

    /// Human-readable log output instead of JSON
    #[arg(long)]
    dev_mode: bool,

    /// Enable debug logs
    #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    debug: bool,

    /// Port for the HTTP server
    #[arg(long, env = "PORT", default_value = "7070")]
    port: u16,

    // === Submission retries ===
    /// Maximum spark-submit runs per submission
    #[arg(long, env = "SUBMIT_MAX_ATTEMPTS", default_value = "10",
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Delay after the first failed run, in milliseconds
    #[arg(long, env = "SUBMIT_INITIAL_DELAY_MS", default_value = "1000")]
    initial_delay_ms: u64,

    /// Factor applied to the delay after every failed run
    #[arg(long, env = "SUBMIT_BACKOFF_MULTIPLIER", default_value = "2",
          value_parser = clap::value_parser!(u32).range(1..))]
    backoff_multiplier: u32,

    /// Upper bound for a single delay, in milliseconds
    #[arg(long, env = "SUBMIT_MAX_DELAY_MS", default_value = "300000")]
    max_delay_ms: u64,
}

impl Args {
    fn launcher_config(&self) -> LauncherConfig {
        LauncherConfig::new(&self.spark_home, &self.spark_conf_dir, &self.master)
            .with_debug_output(self.debug_submit)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

fn init_tracing(args: &Args) {
    let default_level = if args.debug { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_timer(UtcTime::rfc_3339());

    if args.dev_mode {
        builder.pretty().init();
    } else {
        builder.json().init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args);

    let metrics = Arc::new(Metrics::new()?);
    let gateway =
        match SparkGateway::new(&args.launcher_config(), args.retry_policy(), metrics.clone())
            .await
        {
            Ok(gateway) => gateway,
            Err(e) => {
                tracing::error!(error = %e, "Couldn't initialize spark dependency");
                return Err(e.into());
            }
        };
    tracing::info!(
        presets = ?gateway.registry().names(),
        master = %gateway.master(),
        "Gateway ready"
    );

    let state = ApiState {
        control: Arc::new(gateway),
        metrics,
    };
    let server = ServerConfig::with_port(args.port);
    let shutdown = install_shutdown_handler();

    if let Err(e) = run_server(server.listen_addr, state, shutdown).await {
        tracing::error!(error = %e, "Couldn't start webserver");
        return Err(e.into());
    }

    Ok(())
}
