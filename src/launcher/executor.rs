use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::error::LaunchError;

/// What happens to the launcher's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Both streams go to `/dev/null`
    Discard,
    /// Both streams are collected into one buffer, in arrival order
    Capture,
    /// Every line is forwarded to the log at debug level
    Stream,
}

/// Result of one launcher invocation
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr; empty unless [`OutputMode::Capture`] was used
    pub output: String,
    pub error: Option<LaunchError>,
}

impl ExecutionResult {
    pub fn into_result(self) -> Result<String, LaunchError> {
        match self.error {
            None => Ok(self.output),
            Some(e) => Err(e),
        }
    }
}

/// Runs the `spark-submit` binary as a child process.
///
/// The child inherits the parent's environment and working directory; stdin
/// is closed. [`Launcher::execute`] suspends until the child exits, so callers
/// that must not wait run it inside a spawned task.
#[derive(Debug, Clone)]
pub struct Launcher {
    binary: PathBuf,
}

impl Launcher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run the launcher with `args` and wait for it to exit.
    pub async fn execute(&self, args: &[String], mode: OutputMode) -> ExecutionResult {
        tracing::info!(binary = %self.binary.display(), args = ?args, "spark-submit");

        let mut command = Command::new(&self.binary);
        command.args(args).stdin(Stdio::null());
        match mode {
            OutputMode::Discard => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
            OutputMode::Capture | OutputMode::Stream => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult {
                    exit_code: None,
                    output: String::new(),
                    error: Some(LaunchError::Spawn(e)),
                };
            }
        };

        let collected = match mode {
            OutputMode::Discard => Ok(Vec::new()),
            OutputMode::Capture => capture_combined(&mut child).await,
            OutputMode::Stream => stream_to_log(&mut child).await.map(|_| Vec::new()),
        };
        let status = child.wait().await;

        Self::process_output(collected, status)
    }

    fn process_output(
        collected: io::Result<Vec<u8>>,
        status: io::Result<ExitStatus>,
    ) -> ExecutionResult {
        let (output, read_error) = match collected {
            Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), None),
            Err(e) => (String::new(), Some(e)),
        };

        match status {
            Ok(status) => {
                let exit_code = status.code();
                let error = match read_error {
                    Some(e) => Some(LaunchError::Io(e)),
                    None if status.success() => None,
                    None => Some(LaunchError::ExitStatus(exit_code)),
                };
                tracing::debug!(
                    exit_code = ?exit_code,
                    success = error.is_none(),
                    "spark-submit exited"
                );

                ExecutionResult {
                    exit_code,
                    output,
                    error,
                }
            }
            Err(e) => ExecutionResult {
                exit_code: None,
                output,
                error: Some(LaunchError::Io(e)),
            },
        }
    }
}

async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}

/// Drain stdout and stderr into a single buffer until both reach EOF.
async fn capture_combined(child: &mut Child) -> io::Result<Vec<u8>> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = [0u8; 4096];
    let mut err_buf = [0u8; 4096];
    let mut combined = Vec::new();

    loop {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => combined.extend_from_slice(&out_buf[..n]),
                }
            }
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => combined.extend_from_slice(&err_buf[..n]),
                }
            }
            else => break,
        }
    }

    Ok(combined)
}

async fn stream_to_log(child: &mut Child) -> io::Result<()> {
    let (stdout, stderr) = tokio::join!(
        forward_lines(child.stdout.take(), "stdout"),
        forward_lines(child.stderr.take(), "stderr"),
    );
    stdout.and(stderr)
}

async fn forward_lines<R>(reader: Option<R>, stream: &'static str) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        tracing::debug!(stream, line = %line.trim_end_matches('\r'), "spark-submit output");
    }
    Ok(())
}
