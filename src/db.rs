//! Table bootstrap on top of the container controller: create a Hive table
//! from a local seed file and read it back through Presto.

use std::path::Path;

use log::info;

use crate::container::{Container, HIVE_SERVER};
use crate::error::{Error, Result};
use crate::hive::HiveClient;
use crate::presto::{DataFrame, PrestoClient};

pub struct DbManager {
    container: Container,
    hive: HiveClient,
    presto: PrestoClient,
}

impl DbManager {
    /// Manager for the stack described by the compose project in
    /// `compose_dir`, with hive and presto reachable on their default local
    /// ports.
    pub fn new(compose_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let container = Container::new(compose_dir);
        let hive_server = container
            .set()
            .name(HIVE_SERVER)
            .ok_or_else(|| Error::ContainerNotFound(HIVE_SERVER.to_string()))?
            .to_string();
        Ok(Self {
            container,
            hive: HiveClient::new(hive_server),
            presto: PrestoClient::localhost()?,
        })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Create `table` from the caller's DDL and load `file` into it. The
    /// schema is created when absent (retrying while the thrift server warms
    /// up), a pre-existing table of the same name is dropped first, and the
    /// load overwrites, so afterwards the table holds exactly the file rows.
    pub fn create_table(&self, table: &str, query: &str, file: &Path) -> Result<()> {
        let (schema, _) = split_table(table)?;
        info!("creating {table} from {}", file.display());

        self.hive
            .run_with_retry(&format!("CREATE DATABASE IF NOT EXISTS {schema}"))?;
        self.drop_table(table)?;

        let upload = self
            .container
            .upload_temp_file(file, self.hive.container())?;
        self.hive.run(query)?;
        self.hive.run(&format!(
            "LOAD DATA LOCAL INPATH '{}' OVERWRITE INTO TABLE {}",
            upload.path(),
            table
        ))?;
        upload.release()
    }

    /// Drop `table`, silently succeeding when it is already gone.
    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.hive.run(&format!("DROP TABLE IF EXISTS {table}"))
    }

    /// Run a read query through Presto and collect the result.
    pub fn read_sql(&self, query: &str) -> Result<DataFrame> {
        self.presto.execute(query)
    }

    /// Run a raw Hive statement with no result capture.
    pub fn run_hive_query(&self, query: &str) -> Result<()> {
        self.hive.run(query)
    }
}

/// Split `schema.table` into its two parts.
fn split_table(table: &str) -> Result<(&str, &str)> {
    match table.split_once('.') {
        Some((schema, name)) if !schema.is_empty() && !name.is_empty() && !name.contains('.') => {
            Ok((schema, name))
        }
        _ => Err(Error::MalformedTable(table.to_string())),
    }
}
