//! Test harness for gateway integration tests.
//!
//! Provides fake `spark-submit` scripts, throwaway preset directories, a
//! recorder that captures attempts and outcomes, and a log capture.

use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use spark_gateway::config::{LauncherConfig, RetryPolicy};
use spark_gateway::gateway::SparkGateway;
use spark_gateway::metrics::{SubmitOutcome, SubmitRecorder};

pub const TEST_MASTER: &str = "k8s://http://localhost:8000";

pub const PI_PRESET: &str = r#"main: local:///opt/spark/examples/src/main/python/pi.py
args:
  - "10000000"
sparkConf:
  spark.kubernetes.namespace: spark
  spark.executor.instances: 2
"#;

/// A Spark home with a scripted `bin/spark-submit` and a preset directory.
pub struct TestSpark {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestSpark {
    /// `script` is the body of the fake launcher, run by `/bin/sh`.
    pub fn new(script: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::create_dir_all(dir.path().join("presets")).unwrap();
        write_script(&dir.path().join("bin/spark-submit"), script);
        Self { dir }
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    pub fn preset_dir(&self) -> PathBuf {
        self.dir.path().join("presets")
    }

    pub fn binary(&self) -> PathBuf {
        self.dir.path().join("bin/spark-submit")
    }

    /// Scratch file the fake launcher can write to.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn add_preset(&self, name: &str, yaml: &str) -> &Self {
        std::fs::write(self.preset_dir().join(format!("{}.yaml", name)), yaml).unwrap();
        self
    }

    pub fn launcher_config(&self) -> LauncherConfig {
        LauncherConfig::new(self.home(), self.preset_dir(), TEST_MASTER)
    }

    pub async fn gateway(
        &self,
        retry: RetryPolicy,
        recorder: Arc<dyn SubmitRecorder>,
    ) -> SparkGateway {
        SparkGateway::new(&self.launcher_config(), retry, recorder)
            .await
            .expect("Failed to build gateway")
    }

    /// Lines appended to a scratch file by the fake launcher.
    pub fn read_lines(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.scratch(name))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

pub fn write_script(path: &Path, body: &str) {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)
        .expect("Failed to create fake launcher");
    writeln!(file, "#!/bin/sh").unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.sync_all().unwrap();
}

/// Short delays so retry tests finish quickly
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_attempts,
        Duration::from_millis(10),
        2,
        Duration::from_millis(40),
    )
}

/// Recorder that keeps everything it is told.
#[derive(Default)]
pub struct RecordingRecorder {
    attempts: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<(String, SubmitOutcome)>>,
}

#[allow(dead_code)]
impl RecordingRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<(String, SubmitOutcome)> {
        self.outcomes.lock().unwrap().clone()
    }

    pub async fn wait_for_outcomes(&self, count: usize, timeout: Duration) -> bool {
        wait_for(
            || async { self.outcomes.lock().unwrap().len() >= count },
            timeout,
            Duration::from_millis(10),
        )
        .await
    }
}

impl SubmitRecorder for RecordingRecorder {
    fn record_attempt(&self, preset: &str) {
        self.attempts.lock().unwrap().push(preset.to_string());
    }

    fn record_outcome(&self, preset: &str, outcome: SubmitOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .push((preset.to_string(), outcome));
    }
}

/// In-memory sink for JSON log lines.
///
/// Installed as the thread's default subscriber, so it only sees events from
/// tasks polled on the test's current-thread runtime.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture debug-level events until the guard is dropped.
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// `fields` of every event whose message is `message`.
    pub fn events(&self, message: &str) -> Vec<serde_json::Value> {
        let raw = String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned();
        raw.lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|event| event.get("fields").cloned())
            .filter(|fields| fields["message"] == message)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Wait for a condition to become true with timeout
#[allow(dead_code)]
pub async fn wait_for<F, Fut>(
    condition: F,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout_duration {
        if condition().await {
            return true;
        }
        tokio::time::sleep(poll_interval).await;
    }
    false
}

/// Assert a condition eventually becomes true
#[allow(dead_code)]
pub async fn assert_eventually<F, Fut>(condition: F, timeout_duration: Duration, message: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = wait_for(condition, timeout_duration, Duration::from_millis(10)).await;
    assert!(result, "{}", message);
}
