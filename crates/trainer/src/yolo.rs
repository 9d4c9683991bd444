//! Ultralytics `yolo` CLI trainer/exporter
//!
//! Spawns the program as a child process, forwards its output to the log and
//! waits for it to exit. No timeout is applied.

use std::process::Stdio;

use contracts::{
    ContractError, ExportRequest, ModelExporter, ModelTrainer, TrainRequest, ValidateRequest,
    ValidationMetrics,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, instrument};

use crate::command::{export_command, train_command, val_command, TrainerCommand};
use crate::metrics_parser::parse_validation_summary;

/// Captured child output
#[derive(Debug, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        out.push('\n');
        out.push_str(&self.stderr);
        out
    }
}

/// `yolo` command line driver
#[derive(Debug, Clone)]
pub struct YoloCli {
    program: String,
}

impl YoloCli {
    /// Create a driver for the given program (name on `PATH` or full path)
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program that is spawned
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run a command to completion and collect its output
    ///
    /// # Errors
    /// `TrainerFailed` if the program cannot be started or exits non-zero.
    pub async fn run(&self, command: &TrainerCommand) -> Result<ProcessOutput, ContractError> {
        info!(command = %command, "starting trainer process");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ContractError::trainer_failed(&command.program, format!("failed to start: {e}"))
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr) = tokio::join!(
            forward_lines(stdout, "stdout"),
            forward_lines(stderr, "stderr")
        );
        let output = ProcessOutput {
            stdout: stdout?,
            stderr: stderr?,
        };

        let status = child.wait().await?;
        if !status.success() {
            let tail = last_line(&output.stderr)
                .or_else(|| last_line(&output.stdout))
                .unwrap_or("no output");
            return Err(ContractError::trainer_failed(
                &command.program,
                format!("exited with {status}: {tail}"),
            ));
        }

        info!(program = %command.program, "trainer process finished");
        Ok(output)
    }
}

impl Default for YoloCli {
    fn default() -> Self {
        Self::new("yolo")
    }
}

/// Read a pipe line by line, logging each line and returning the whole text
///
/// Lines are decoded lossily; the pipe is drained to the end so the child
/// never blocks on a full buffer.
async fn forward_lines<R>(pipe: Option<R>, stream: &'static str) -> Result<String, ContractError>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(String::new());
    };

    let mut collected = String::new();
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            info!(target: "trainer::process", stream, "{trimmed}");
        }
        collected.push_str(line);
        collected.push('\n');
    }
    Ok(collected)
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|l| !l.is_empty())
}

impl ModelTrainer for YoloCli {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(
        name = "yolo_train",
        skip(self, request),
        fields(run = %request.run_name, epochs = request.epochs)
    )]
    async fn train(&self, request: &TrainRequest) -> Result<(), ContractError> {
        self.run(&train_command(&self.program, request)).await?;
        Ok(())
    }

    #[instrument(
        name = "yolo_validate",
        skip(self, request),
        fields(checkpoint = %request.checkpoint.display())
    )]
    async fn validate(&self, request: &ValidateRequest) -> Result<ValidationMetrics, ContractError> {
        let output = self.run(&val_command(&self.program, request)).await?;
        parse_validation_summary(&output.combined())
    }
}

impl ModelExporter for YoloCli {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(
        name = "yolo_export",
        skip(self, request),
        fields(format = %request.format)
    )]
    async fn export(&self, request: &ExportRequest) -> Result<(), ContractError> {
        self.run(&export_command(&self.program, request)).await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> TrainerCommand {
        TrainerCommand {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    #[tokio::test]
    async fn test_run_collects_both_streams() {
        let cli = YoloCli::new("sh");
        let output = cli
            .run(&sh("echo hello; echo warn 1>&2; echo world"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello\nworld\n");
        assert_eq!(output.stderr, "warn\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_trainer_failure() {
        let cli = YoloCli::new("sh");
        let err = cli
            .run(&sh("echo 'CUDA out of memory' 1>&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            ContractError::TrainerFailed { program, message } => {
                assert_eq!(program, "sh");
                assert!(message.contains("CUDA out of memory"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_output_is_tolerated() {
        let cli = YoloCli::new("sh");
        let output = cli
            .run(&sh(
                "printf 'runs/caf\\377\\n'; head -c 300000 /dev/zero | tr '\\0' x; echo; echo done 1>&2",
            ))
            .await
            .unwrap();

        let first = output.stdout.lines().next().unwrap();
        assert_eq!(first, "runs/caf\u{FFFD}");
        assert!(output.stdout.len() > 300_000);
        assert_eq!(output.stderr, "done\n");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cli = YoloCli::new("definitely-not-a-real-trainer");
        let err = cli
            .run(&TrainerCommand {
                program: "definitely-not-a-real-trainer".into(),
                args: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::TrainerFailed { .. }));
    }

    #[tokio::test]
    async fn test_validate_parses_process_output() {
        let cli = YoloCli::new("sh");
        let command = sh("echo '  all 5 9 0.5 0.6 0.7 0.45'");
        let output = cli.run(&command).await.unwrap();
        let metrics = parse_validation_summary(&output.combined()).unwrap();
        assert_eq!(metrics.map50_95, 0.45);
    }
}
