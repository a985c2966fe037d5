//! Minimal blocking client for the Presto statement protocol: POST the query,
//! then follow `nextUri` pages until the result set is complete.

use log::debug;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USER: &str = "prestest";
pub const DEFAULT_CATALOG: &str = "hive";

const HEADER_USER: &str = "X-Presto-User";
const HEADER_CATALOG: &str = "X-Presto-Catalog";
const HEADER_SOURCE: &str = "X-Presto-Source";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[allow(dead_code)]
    id: String,
    next_uri: Option<String>,
    columns: Option<Vec<Column>>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
    error: Option<QueryError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QueryError {
    pub message: String,
    pub error_code: i64,
    pub error_name: String,
}

/// Tabular query result: column names in engine order plus raw JSON rows.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order. Rows shorter than the header
    /// are skipped.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

pub struct PrestoClient {
    http: HttpClient,
    statement_url: String,
    user: String,
    catalog: String,
}

impl PrestoClient {
    pub fn new(host: &str, port: u16, user: impl ToString) -> Result<Self> {
        Ok(Self {
            http: HttpClient::builder().build()?,
            statement_url: format!("http://{host}:{port}/v1/statement"),
            user: user.to_string(),
            catalog: DEFAULT_CATALOG.to_string(),
        })
    }

    /// Client for the coordinator of a locally running docker-hive stack.
    pub fn localhost() -> Result<Self> {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER)
    }

    pub fn catalog(mut self, catalog: impl ToString) -> Self {
        self.catalog = catalog.to_string();
        self
    }

    /// Execute `sql` and collect the full result set. Engine-side failures
    /// surface as [`Error::QueryFailure`] with the engine message attached.
    pub fn execute(&self, sql: &str) -> Result<DataFrame> {
        debug!("presto: {sql}");
        let response = self
            .http
            .post(&self.statement_url)
            .header(HEADER_USER, &self.user)
            .header(HEADER_CATALOG, &self.catalog)
            .header(HEADER_SOURCE, "prestest")
            .body(sql.to_string())
            .send()?;
        let mut page = decode(response)?;

        let mut frame = DataFrame::default();
        loop {
            if let Some(error) = page.error {
                return Err(query_failure(error));
            }
            if frame.columns.is_empty() {
                if let Some(columns) = &page.columns {
                    frame.columns = columns.iter().map(|c| c.name.clone()).collect();
                }
            }
            if let Some(data) = page.data.take() {
                frame.rows.extend(data);
            }
            match page.next_uri.take() {
                Some(uri) => {
                    let response = self.http.get(&uri).header(HEADER_USER, &self.user).send()?;
                    page = decode(response)?;
                }
                None => break,
            }
        }
        Ok(frame)
    }
}

fn decode(response: Response) -> Result<StatementResponse> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::HttpNotOk(status, response.text()?));
    }
    Ok(response.json()?)
}

fn query_failure(error: QueryError) -> Error {
    Error::QueryFailure(format!(
        "{} (error code {}): {}",
        error.error_name, error.error_code, error.message
    ))
}
