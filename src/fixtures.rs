//! Fixture surface for test drivers: per-test parameters with defaults, stack
//! bring-up helpers and a temporary table that drops itself on teardown.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::warn;

use crate::container::Container;
use crate::db::DbManager;
use crate::error::{Error, Result};

/// Compose project location used when a test gives no override: the
/// `docker-hive` checkout next to this crate.
pub fn default_container_folder() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../docker-hive")
}

/// Per-test options. Anything not set falls back to its stated default.
#[derive(Debug, Clone)]
pub struct Params {
    pub container_folder: PathBuf,
    pub allow_table_modification: bool,
    pub reset: bool,
    pub table_name: Option<String>,
    pub query: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            container_folder: default_container_folder(),
            allow_table_modification: false,
            reset: false,
            table_name: None,
            query: None,
            file: None,
        }
    }
}

impl Params {
    pub fn container_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.container_folder = folder.into();
        self
    }

    pub fn allow_table_modification(mut self, allow: bool) -> Self {
        self.allow_table_modification = allow;
        self
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn table_name(mut self, name: impl ToString) -> Self {
        self.table_name = Some(name.to_string());
        self
    }

    /// Creation query; a `{table_name}` placeholder is substituted when the
    /// table is created.
    pub fn query(mut self, query: impl ToString) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Controller for the compose project the params point at.
pub fn container(params: &Params) -> Container {
    Container::new(&params.container_folder)
}

/// Manager wired against the same compose project.
pub fn db_manager(params: &Params) -> Result<DbManager> {
    DbManager::new(&params.container_folder)
}

/// Bring the stack up the way a test setup wants it: wipe to factory state
/// first when `reset` is set, otherwise a plain start-until-healthy.
pub fn start_container(container: &Container, params: &Params) -> Result<()> {
    if params.reset {
        container.reset(params.allow_table_modification, true, true)
    } else {
        container.start(true)
    }
}

static STACK_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// One-shot variant of [`start_container`] for a whole test binary: only the
/// first caller pays for the bring-up. A failed bring-up is latched, so every
/// later caller fails too instead of proceeding against a dead stack.
pub fn start_container_once(container: &Container, params: &Params) -> Result<()> {
    let mut first_failure = None;
    let latched = STACK_INIT.get_or_init(|| match start_container(container, params) {
        Ok(()) => Ok(()),
        Err(e) => {
            let msg = e.to_string();
            first_failure = Some(e);
            Err(msg)
        }
    });

    // the caller that paid for the bring-up gets the typed error
    if let Some(e) = first_failure {
        return Err(e);
    }
    latched
        .as_ref()
        .map(|_| ())
        .map_err(|msg| Error::StackUnavailable(msg.clone()))
}

/// A table created from the params that drops itself when the handle goes out
/// of scope, on both the normal and the unwind path.
pub struct TemporaryTable<'a> {
    db: &'a DbManager,
    name: String,
}

impl<'a> TemporaryTable<'a> {
    /// Requires `table_name`, `query` and `file` to be set on the params.
    pub fn create(db: &'a DbManager, params: &Params) -> Result<Self> {
        let name = params
            .table_name
            .as_deref()
            .ok_or(Error::MissingParam("table_name"))?;
        let query = params
            .query
            .as_deref()
            .ok_or(Error::MissingParam("query"))?;
        let file = params.file.as_deref().ok_or(Error::MissingParam("file"))?;

        let query = query.replace("{table_name}", name);
        db.create_table(name, &query, file)?;
        Ok(Self {
            db,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TemporaryTable<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.db.drop_table(&self.name) {
            warn!("failed to drop {}: {e}", self.name);
        }
    }
}
