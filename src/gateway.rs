use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{LauncherConfig, RetryPolicy};
use crate::error::{GatewayError, Result};
use crate::launcher::{control_args, submit_args, ControlVerb, Launcher, OutputMode};
use crate::metrics::SubmitRecorder;
use crate::preset::PresetRegistry;
use crate::submit::Submission;

/// Operations the HTTP layer needs from the gateway.
#[async_trait]
pub trait JobControl: Send + Sync {
    /// Start a retried submission of `preset` in the background.
    ///
    /// Returns as soon as the submission is dispatched.
    fn submit(&self, preset: &str) -> Result<()>;

    /// Ask the cluster to kill `<namespace>:<name>`, without waiting.
    fn kill(&self, namespace: &str, name: &str);

    /// Launcher output of a status query, empty if it printed nothing.
    async fn status(&self, namespace: &str, name: &str) -> String;
}

/// Turns preset names and driver ids into `spark-submit` invocations.
///
/// Holds the preset registry, the launcher, and the read-only settings
/// every invocation needs. Submissions and kills run in spawned tasks that
/// are never joined or cancelled; status queries run inline.
pub struct SparkGateway {
    registry: PresetRegistry,
    launcher: Arc<Launcher>,
    master: String,
    debug_output: bool,
    retry: RetryPolicy,
    recorder: Arc<dyn SubmitRecorder>,
}

impl SparkGateway {
    /// Validate the launcher installation and load all presets.
    ///
    /// # Errors
    ///
    /// Any error returned here is a startup error: a missing Spark home or
    /// launcher binary, or a registry load failure.
    pub async fn new(
        config: &LauncherConfig,
        retry: RetryPolicy,
        recorder: Arc<dyn SubmitRecorder>,
    ) -> Result<Self> {
        match tokio::fs::metadata(&config.spark_home).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(GatewayError::LauncherHomeMissing(config.spark_home.clone())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GatewayError::LauncherHomeMissing(config.spark_home.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Couldn't inspect spark home");
                return Err(GatewayError::LauncherHomeMissing(config.spark_home.clone()));
            }
        }

        let binary = config.binary_path();
        if !tokio::fs::metadata(&binary)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
        {
            return Err(GatewayError::LauncherMissing(binary));
        }

        let registry = PresetRegistry::load(&config.preset_dir).await?;

        Ok(Self::with_registry(
            registry,
            Launcher::new(binary),
            config.master.clone(),
            retry,
            recorder,
        )
        .with_debug_output(config.debug_output))
    }

    /// Assemble a gateway from an already loaded registry.
    pub fn with_registry(
        registry: PresetRegistry,
        launcher: Launcher,
        master: impl Into<String>,
        retry: RetryPolicy,
        recorder: Arc<dyn SubmitRecorder>,
    ) -> Self {
        Self {
            registry,
            launcher: Arc::new(launcher),
            master: master.into(),
            debug_output: false,
            retry,
            recorder,
        }
    }

    pub fn with_debug_output(mut self, debug_output: bool) -> Self {
        self.debug_output = debug_output;
        self
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    pub fn master(&self) -> &str {
        &self.master
    }

    /// Output handling for runs nobody waits on.
    fn background_mode(&self) -> OutputMode {
        if self.debug_output {
            OutputMode::Stream
        } else {
            OutputMode::Discard
        }
    }

    /// Build the argument list for `preset_name`.
    pub fn submission(&self, preset_name: &str) -> Result<Submission> {
        let preset = self.registry.get(preset_name)?;
        let args = submit_args(&self.master, preset_name, preset);
        Ok(Submission::new(preset_name, args))
    }

    pub fn submit(&self, preset_name: &str) -> Result<()> {
        let submission = self.submission(preset_name)?;
        tracing::info!(
            submission_id = %submission.id,
            preset = %submission.preset,
            args = ?submission.args,
            "Submit with args"
        );

        let launcher = self.launcher.clone();
        let recorder = self.recorder.clone();
        let mode = self.background_mode();
        let retry = self.retry;
        tokio::spawn(async move {
            submission
                .run(&launcher, mode, retry, recorder.as_ref())
                .await;
        });

        Ok(())
    }

    pub fn kill(&self, namespace: &str, name: &str) {
        let args = control_args(&self.master, ControlVerb::Kill, namespace, name);
        let launcher = self.launcher.clone();
        let mode = self.background_mode();
        let driver = format!("{}:{}", namespace, name);

        tokio::spawn(async move {
            if let Err(e) = launcher.execute(&args, mode).await.into_result() {
                tracing::error!(driver = %driver, error = %e, "Killing spark app failed");
            }
        });
    }

    pub async fn status(&self, namespace: &str, name: &str) -> String {
        let args = control_args(&self.master, ControlVerb::Status, namespace, name);
        let result = self.launcher.execute(&args, OutputMode::Capture).await;
        if let Some(ref e) = result.error {
            tracing::error!(namespace, name, error = %e, "spark-submit status failed");
        }
        result.output
    }
}

#[async_trait]
impl JobControl for SparkGateway {
    fn submit(&self, preset: &str) -> Result<()> {
        SparkGateway::submit(self, preset)
    }

    fn kill(&self, namespace: &str, name: &str) {
        SparkGateway::kill(self, namespace, name)
    }

    async fn status(&self, namespace: &str, name: &str) -> String {
        SparkGateway::status(self, namespace, name).await
    }
}
