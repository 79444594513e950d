use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_RMAPI_PROGRAM: &str = "rmapi";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Directory operations against the tablet's document store.
///
/// `exists` folds every failure into `false`; the mutating calls report their
/// errors so the caller can decide how loudly to complain.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    async fn exists(&self, path: &str) -> bool;
    async fn mkdir(&self, path: &str) -> Result<(), RemoteError>;
    async fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), RemoteError>;
}

/// [`RemoteStore`] backed by the `rmapi` command-line tool.
#[derive(Debug, Clone)]
pub struct RmapiStore {
    program: PathBuf,
}

impl RmapiStore {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[OsString]) -> Result<(), RemoteError> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RemoteError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(RemoteError::Failed {
            command: self.describe(args),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn describe(&self, args: &[OsString]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

impl RemoteStore for RmapiStore {
    async fn exists(&self, path: &str) -> bool {
        debug!(path, "checking remote path");
        match self.run(&["stat".into(), path.into()]).await {
            Ok(()) => true,
            Err(err) => {
                debug!(path, error = %err, "remote path not found");
                false
            }
        }
    }

    async fn mkdir(&self, path: &str) -> Result<(), RemoteError> {
        debug!(path, "creating remote directory");
        self.run(&["mkdir".into(), path.into()]).await
    }

    async fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), RemoteError> {
        debug!(file = %local_file.display(), remote_dir, "uploading file");
        self.run(&["put".into(), local_file.into(), remote_dir.into()])
            .await
    }
}
