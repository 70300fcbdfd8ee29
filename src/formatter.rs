//! External formatter invocation.
//!
//! This module spawns the `lua-format` executable and pipes the document
//! through it via stdin/stdout. Everything the tool writes to stderr is kept
//! so callers can map it into diagnostics.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Invocation;

/// Errors that can occur while resolving or invoking the external formatter.
#[derive(Debug)]
pub enum FormatError {
    /// No bundled binary layout exists for the current OS
    UnsupportedPlatform(String),
    /// A configured relative path resolved against no workspace root
    PathNotFound(PathBuf),
    /// Formatter binary missing/not executable, could not be spawned
    SpawnFailed(String),
    /// Formatter process exited with non-zero status
    NonZeroExit { code: i32, stderr: String },
    /// Formatter exited cleanly but produced no output
    EmptyOutput { stderr: String },
    /// I/O error during communication with the formatter
    IoError(std::io::Error),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedPlatform(os) => {
                write!(f, "no bundled lua-format binary for platform '{}'", os)
            }
            Self::PathNotFound(path) => {
                write!(f, "path not found in any workspace root: {}", path.display())
            }
            Self::SpawnFailed(cmd) => write!(f, "failed to spawn lua-format: {}", cmd),
            Self::NonZeroExit { code, stderr } => {
                write!(f, "lua-format exited with code {}: {}", code, stderr)
            }
            Self::EmptyOutput { .. } => write!(f, "lua-format produced no output"),
            Self::IoError(e) => write!(f, "lua-format I/O error: {}", e),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl FormatError {
    /// The decoded error stream, for the variants where the process actually
    /// ran. Callers use this to update diagnostics even on failure.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { stderr, .. } | Self::EmptyOutput { stderr } => Some(stderr),
            _ => None,
        }
    }
}

/// A successful formatter run: the replacement document text plus whatever
/// the tool wrote to stderr (it may chatter even on success).
#[derive(Debug)]
pub struct FormatOutput {
    pub text: String,
    pub stderr: String,
}

/// Pipe `input` through the external formatter described by `invocation`.
///
/// The whole document is written to the child's stdin in one shot and the
/// stream is closed immediately. Output and error bytes are collected until
/// the process terminates and decoded exactly once afterwards.
///
/// No timeout is applied: a hung formatter hangs the request.
pub async fn format(input: &str, invocation: &Invocation) -> Result<FormatOutput, FormatError> {
    let mut args: Vec<std::ffi::OsString> = Vec::new();
    if let Some(config) = &invocation.config {
        args.push("-c".into());
        args.push(config.as_os_str().to_owned());
    }

    log::debug!(
        "Invoking formatter: {} {:?}",
        invocation.binary.display(),
        args
    );

    let mut cmd = Command::new(&invocation.binary);
    cmd.args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &invocation.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| FormatError::SpawnFailed(format!("{}: {}", invocation.binary.display(), e)))?;

    // Write the document and close stdin to signal EOF. The child may exit
    // before draining the pipe; in that case the exit status decides.
    let mut stdin = child.stdin.take().expect("stdin was piped");
    match stdin.write_all(input.as_bytes()).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            log::debug!("formatter closed stdin early: {}", e);
        }
        Err(e) => return Err(FormatError::IoError(e)),
    }
    drop(stdin);

    let output = child.wait_with_output().await.map_err(FormatError::IoError)?;

    // Decode each stream once, after termination, so multi-byte characters
    // split across chunks cannot be corrupted.
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        log::warn!(
            "Formatter '{}' failed with exit code {}: {}",
            invocation.binary.display(),
            code,
            stderr
        );
        return Err(FormatError::NonZeroExit { code, stderr });
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();

    // A clean exit with nothing on stdout is never a no-op: resolving it as
    // success would replace the document with an empty string.
    if text.is_empty() {
        log::warn!(
            "Formatter '{}' exited cleanly but wrote no output",
            invocation.binary.display()
        );
        return Err(FormatError::EmptyOutput { stderr });
    }

    log::debug!(
        "Formatter '{}' succeeded ({} bytes -> {} bytes)",
        invocation.binary.display(),
        input.len(),
        text.len()
    );

    Ok(FormatOutput { text, stderr })
}
