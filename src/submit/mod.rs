//! Retried, fire-and-forget submissions.
//!
//! A [`Submission`] is created per `POST /` request and handed to a spawned
//! task. The task runs the launcher under [`run_with_retry`] and reports every
//! attempt and the final outcome to a [`SubmitRecorder`]. Nothing about the
//! submission is kept once the task ends.

pub mod retry;

pub use retry::{run_with_retry, Backoff};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::RetryPolicy;
use crate::launcher::{Launcher, OutputMode};
use crate::metrics::{SubmitOutcome, SubmitRecorder};

/// One pending `spark-submit` run for a preset.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Correlates the log lines of all attempts
    pub id: Uuid,
    pub preset: String,
    pub args: Vec<String>,
}

impl Submission {
    pub fn new(preset: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            preset: preset.into(),
            args,
        }
    }

    /// Run the launcher until it succeeds or `policy` is exhausted.
    ///
    /// Each attempt spawns a fresh child process.
    pub async fn run(
        self,
        launcher: &Launcher,
        mode: OutputMode,
        policy: RetryPolicy,
        recorder: &dyn SubmitRecorder,
    ) -> SubmitOutcome {
        let span = tracing::info_span!(
            "submission",
            submission_id = %self.id,
            preset = %self.preset,
        );

        async move {
            let preset = self.preset.as_str();
            let args = self.args.as_slice();

            let result = run_with_retry(policy, |attempt| {
                recorder.record_attempt(preset);
                tracing::debug!(attempt, "Running spark-submit");
                async move { launcher.execute(args, mode).await.into_result().map(|_| ()) }
            })
            .await;

            let outcome = match result {
                Ok(()) => {
                    tracing::info!("spark-submit succeeded");
                    SubmitOutcome::Success
                }
                Err(e) => {
                    tracing::error!(error = %e, "spark submit failed with retries");
                    SubmitOutcome::Failure
                }
            };
            recorder.record_outcome(preset, outcome);
            outcome
        }
        .instrument(span)
        .await
    }
}
