use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Relative location of the launcher binary inside the Spark home directory.
pub const LAUNCHER_RELATIVE_PATH: &str = "bin/spark-submit";

/// Configuration for invoking `spark-submit`.
///
/// Supplied once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Spark home directory; the launcher lives at `<home>/bin/spark-submit`
    pub spark_home: PathBuf,
    /// Directory holding one YAML document per preset
    pub preset_dir: PathBuf,
    /// Cluster master address (e.g., "k8s://https://kubernetes:443")
    pub master: String,
    /// Stream launcher output into the log instead of discarding it
    pub debug_output: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            spark_home: PathBuf::from("/opt/spark"),
            preset_dir: PathBuf::from("/etc/spark-gateway/presets"),
            master: String::new(),
            debug_output: false,
        }
    }
}

impl LauncherConfig {
    pub fn new(
        spark_home: impl Into<PathBuf>,
        preset_dir: impl Into<PathBuf>,
        master: impl Into<String>,
    ) -> Self {
        Self {
            spark_home: spark_home.into(),
            preset_dir: preset_dir.into(),
            master: master.into(),
            ..Default::default()
        }
    }

    pub fn with_debug_output(mut self, debug_output: bool) -> Self {
        self.debug_output = debug_output;
        self
    }

    pub fn binary_path(&self) -> PathBuf {
        self.spark_home.join(LAUNCHER_RELATIVE_PATH)
    }
}

/// Bounded exponential backoff applied to submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after every failed attempt
    pub backoff_multiplier: u32,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2,
            max_delay: Duration::from_secs(5 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: u32,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            max_delay,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 7070)),
        }
    }
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}
