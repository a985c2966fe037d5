//! Thin wrapper around `std::process::Command` for the docker and
//! docker-compose invocations. Arguments are always passed as structured argv,
//! never as a shell string.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

const PERMISSION_DENIED: &str = "permission denied";

/// Captured output of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Error contract for the `docker cp`/`docker exec rm` style commands:
    /// anything on stderr, or a permission-denied marker on stdout, means the
    /// operation did not take effect.
    ///
    /// The marker is a case-insensitive substring match on stdout and can in
    /// principle false-positive on legitimate output containing that phrase.
    /// This matches the established behavior and is kept until confirmed
    /// otherwise.
    pub fn into_transfer_result(self) -> Result<CommandOutput> {
        if !self.stderr.trim().is_empty() || self.stdout.to_lowercase().contains(PERMISSION_DENIED)
        {
            return Err(Error::Transfer(self.combined()));
        }
        Ok(self)
    }
}

pub fn run<I, S>(program: &str, args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    capture(cmd)
}

pub fn run_in_dir<I, S>(dir: &Path, program: &str, args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.current_dir(dir).args(args);
    capture(cmd)
}

/// `docker exec` against a running container.
pub fn exec<I, S>(container: &str, args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new("docker");
    cmd.arg("exec").arg(container);
    cmd.args(args);
    capture(cmd)
}

/// `docker exec -u <user> -t` against a running container.
pub fn exec_as<I, S>(user: &str, container: &str, args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new("docker");
    cmd.args(["exec", "-u", user, "-t", container]);
    cmd.args(args);
    capture(cmd)
}

fn capture(mut cmd: Command) -> Result<CommandOutput> {
    debug!("running {:?}", cmd);
    let output = cmd.output()?;
    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
