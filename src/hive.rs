//! DDL/DML against the Hive thrift server, driven through beeline inside the
//! hive-server container.

use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::process;

/// Thrift endpoint of the hive-server container, from inside that container.
pub const HIVE_ENDPOINT: &str = "jdbc:hive2://localhost:10000";

pub const CONNECT_ATTEMPTS: usize = 3;
pub const CONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Messages beeline emits while the thrift server is still warming up.
const TRANSIENT_MARKERS: [&str; 2] = ["connection refused", "could not open client transport"];

pub struct HiveClient {
    container: String,
}

impl HiveClient {
    /// Client running statements inside the named hive-server container.
    pub fn new(container: impl ToString) -> Self {
        Self {
            container: container.to_string(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Run one statement with no result capture. A failing beeline invocation
    /// is surfaced as [`Error::QueryFailure`] with its output attached.
    pub fn run(&self, query: &str) -> Result<()> {
        debug!("hive: {query}");
        let out = process::exec(
            &self.container,
            ["beeline", "-u", HIVE_ENDPOINT, "-n", "root", "-e", query],
        )?;
        if !out.success {
            return Err(Error::QueryFailure(out.combined()));
        }
        Ok(())
    }

    /// Run `query`, retrying transient connection failures up to
    /// [`CONNECT_ATTEMPTS`] times with a fixed [`CONNECT_BACKOFF`]. Exhausting
    /// the attempts yields [`Error::ConnectionExhausted`]; non-transient
    /// failures propagate unchanged on the first occurrence.
    pub fn run_with_retry(&self, query: &str) -> Result<()> {
        let backoff = ConstantBuilder::default()
            .with_delay(CONNECT_BACKOFF)
            .with_max_times(CONNECT_ATTEMPTS - 1);

        (|| self.run(query))
            .retry(backoff)
            .when(is_transient)
            .notify(|err: &Error, dur: Duration| {
                warn!("hive connection failed ({err}), retrying in {dur:?}")
            })
            .call()
            .map_err(|e| {
                if is_transient(&e) {
                    Error::ConnectionExhausted(CONNECT_ATTEMPTS)
                } else {
                    e
                }
            })
    }
}

fn is_transient(error: &Error) -> bool {
    match error {
        Error::QueryFailure(output) => {
            let output = output.to_lowercase();
            TRANSIENT_MARKERS.iter().any(|m| output.contains(m))
        }
        _ => false,
    }
}
