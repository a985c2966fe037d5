//! Control of the docker-hive compose stack: start, stop, health polling and
//! factory reset of the fixed container set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::process;
use crate::retry::poll_until;

/// Roles present in the docker-hive compose project.
pub const HIVE_METASTORE: &str = "hive-metastore";
pub const DATANODE: &str = "datanode";
pub const NAMENODE: &str = "namenode";
pub const HIVE_SERVER: &str = "hive-server";
pub const PRESTO_COORDINATOR: &str = "presto-coordinator";
pub const HIVE_METASTORE_POSTGRESQL: &str = "hive-metastore-postgresql";

pub const HEALTH_WAIT: Duration = Duration::from_secs(40);
pub const HEALTH_INTERVAL: Duration = Duration::from_secs(3);

const INSPECT_FORMAT: &str = "{{.State.Status}}|{{if .State.Health}}{{.State.Health.Status}}{{end}}";

/// Immutable role to container-name table for one compose project.
#[derive(Debug, Clone)]
pub struct ContainerSet {
    entries: Vec<(String, String)>,
}

impl ContainerSet {
    pub fn new<I, R, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (R, N)>,
        R: ToString,
        N: ToString,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(role, name)| (role.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// The fixed docker-hive stack this crate is built around.
    pub fn docker_hive() -> Self {
        let roles = [
            HIVE_METASTORE,
            DATANODE,
            NAMENODE,
            HIVE_SERVER,
            PRESTO_COORDINATOR,
            HIVE_METASTORE_POSTGRESQL,
        ];
        Self::new(
            roles
                .iter()
                .map(|role| (*role, format!("docker-hive_{}_1", role))),
        )
    }

    /// Container name of a role, if the role is part of this set.
    pub fn name(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, name)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(role, name)| (role.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point-in-time view of one container, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub running: bool,
    /// `None` when the container declares no health check.
    pub health: Option<String>,
}

impl ContainerStatus {
    /// A container with no health check is ready as soon as it runs.
    pub fn healthy(&self) -> bool {
        match &self.health {
            Some(status) => status == "healthy",
            None => self.running,
        }
    }
}

/// Controller for the compose stack. Holds no runtime state of its own; every
/// status query goes back to the docker daemon.
#[derive(Debug, Clone)]
pub struct Container {
    compose_dir: PathBuf,
    set: ContainerSet,
}

impl Container {
    pub fn new(compose_dir: impl Into<PathBuf>) -> Self {
        Self::with_set(compose_dir, ContainerSet::docker_hive())
    }

    pub fn with_set(compose_dir: impl Into<PathBuf>, set: ContainerSet) -> Self {
        Self {
            compose_dir: compose_dir.into(),
            set,
        }
    }

    pub fn compose_dir(&self) -> &Path {
        &self.compose_dir
    }

    pub fn set(&self) -> &ContainerSet {
        &self.set
    }

    /// `docker-compose up -d`, then optionally poll until every container in
    /// the set is healthy. Containers that take longer than [`HEALTH_WAIT`]
    /// fail the call with [`Error::StartupTimeout`].
    pub fn start(&self, wait_until_healthy: bool) -> Result<()> {
        info!("starting compose project in {}", self.compose_dir.display());
        let out = process::run_in_dir(&self.compose_dir, "docker-compose", ["up", "-d"])?;
        if !out.success {
            return Err(Error::Compose(out.combined()));
        }

        if wait_until_healthy {
            let mut lookup_failure = None;
            let healthy = poll_until(HEALTH_INTERVAL, HEALTH_WAIT, || {
                match self.is_healthy() {
                    Ok(healthy) => healthy,
                    // a failed lookup will not get better with more polling
                    Err(e) => {
                        lookup_failure = Some(e);
                        true
                    }
                }
            });
            if let Some(e) = lookup_failure {
                return Err(e);
            }
            if !healthy {
                return Err(Error::StartupTimeout(HEALTH_WAIT));
            }
        }
        Ok(())
    }

    /// `docker-compose stop`. Containers stay around, inspectable but not
    /// running.
    pub fn stop(&self) -> Result<()> {
        info!("stopping compose project in {}", self.compose_dir.display());
        let out = process::run_in_dir(&self.compose_dir, "docker-compose", ["stop"])?;
        if !out.success {
            return Err(Error::Compose(out.combined()));
        }
        Ok(())
    }

    /// Inspect one container by name. An absent container is a
    /// [`Error::ContainerNotFound`], never a silent `false`.
    pub fn status(&self, name: &str) -> Result<ContainerStatus> {
        let out = process::run("docker", ["inspect", "--format", INSPECT_FORMAT, name])?;
        if !out.success {
            return Err(Error::ContainerNotFound(name.to_string()));
        }
        let line = out.stdout.trim();
        let (state, health) = line.split_once('|').unwrap_or((line, ""));
        Ok(ContainerStatus {
            running: state == "running",
            health: (!health.is_empty()).then(|| health.to_string()),
        })
    }

    /// True iff every container in the set reports `running`.
    pub fn is_started(&self) -> Result<bool> {
        for (role, name) in self.set.iter() {
            if !self.status(name)?.running {
                debug!("[{role}] {name} is not running");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True iff every container is running and, where a health check is
    /// declared, reports `healthy`.
    pub fn is_healthy(&self) -> Result<bool> {
        for (role, name) in self.set.iter() {
            let status = self.status(name)?;
            if !status.running || !status.healthy() {
                debug!("[{role}] {name} is not healthy yet: {status:?}");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Wipe the stack back to factory state: stop, then force-remove every
    /// container, skipping any that are already gone. With
    /// `allow_table_modification` the stack is provisioned once so the
    /// coordinator config can be amended, then stopped again. `until_started`
    /// implies `autostart`.
    pub fn reset(
        &self,
        allow_table_modification: bool,
        autostart: bool,
        until_started: bool,
    ) -> Result<()> {
        let autostart = autostart || until_started;

        self.stop()?;
        for (role, name) in self.set.iter() {
            let out = process::run("docker", ["rm", "-f", name])?;
            if !out.success {
                debug!("[{role}] {name} already absent, skipping removal");
            }
        }

        if allow_table_modification {
            self.start(true)?;
            self.enable_table_modification()?;
            self.stop()?;
        }

        if autostart {
            self.start(until_started)?;
        }
        Ok(())
    }
}
