//! In-place mutation of configuration files inside the containers, used to
//! toggle table modification in the Presto hive connector.

use log::debug;

use crate::container::{Container, PRESTO_COORDINATOR};
use crate::error::{Error, Result};
use crate::process;

/// Connector configuration of the coordinator.
pub const HIVE_PROPERTIES: &str = "/opt/presto-server-0.181/etc/catalog/hive.properties";

const TABLE_MODIFICATION_PROPERTIES: [&str; 3] = [
    "hive.allow-drop-table=true",
    "hive.allow-rename-table=true",
    "hive.allow-add-column=true",
];

#[derive(Debug, Clone)]
pub struct AppendOptions<'a> {
    /// Skip the append when the file already contains the exact text.
    pub skip_if_exists: bool,
    /// Remote user performing the append.
    pub user: &'a str,
    /// Put the text on a fresh line.
    pub from_new_line: bool,
}

impl Default for AppendOptions<'_> {
    fn default() -> Self {
        Self {
            skip_if_exists: true,
            user: "root",
            from_new_line: true,
        }
    }
}

impl Container {
    /// Append `text` to `file` inside `container`. With `skip_if_exists` the
    /// file is searched first for the whitespace-trimmed text and the append
    /// becomes a no-op when it is already there.
    pub fn append_file(
        &self,
        container: &str,
        file: &str,
        text: &str,
        opts: &AppendOptions,
    ) -> Result<()> {
        if opts.skip_if_exists && self.file_contains(container, file, text)? {
            debug!("{file} already contains {text:?}, skipping append");
            return Ok(());
        }

        let payload = if opts.from_new_line {
            format!("\n{text}")
        } else {
            text.to_string()
        };
        let script = format!("echo \"{payload}\" >> {file}");
        let out = process::exec_as(opts.user, container, ["bash", "-c", script.as_str()])?;
        if !out.success || !out.stderr.trim().is_empty() {
            return Err(Error::Transfer(out.combined()));
        }
        Ok(())
    }

    /// Whether `file` contains a line whose trimmed content equals `text`.
    fn file_contains(&self, container: &str, file: &str, text: &str) -> Result<bool> {
        let needle = text.trim();
        let out = process::exec_as("1000", container, ["grep", "-F", needle, file])?;
        Ok(out.stdout.lines().any(|line| line.trim() == needle))
    }

    /// Permit drop/rename/add-column through the Presto connector by amending
    /// the coordinator's hive catalog properties. Each line is appended at
    /// most once, so repeated calls leave the file unchanged.
    pub fn enable_table_modification(&self) -> Result<()> {
        let coordinator = self
            .set()
            .name(PRESTO_COORDINATOR)
            .ok_or_else(|| Error::ContainerNotFound(PRESTO_COORDINATOR.to_string()))?
            .to_string();
        for line in TABLE_MODIFICATION_PROPERTIES {
            self.append_file(&coordinator, HIVE_PROPERTIES, line, &AppendOptions::default())?;
        }
        Ok(())
    }
}
