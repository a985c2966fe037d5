use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("containers did not become healthy within {0:?}")]
    StartupTimeout(Duration),
    #[error("docker-compose failed: {0}")]
    Compose(String),
    #[error("stack bring-up already failed: {0}")]
    StackUnavailable(String),
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("connection attempts exhausted after {0} tries")]
    ConnectionExhausted(usize),
    #[error("query failed: {0}")]
    QueryFailure(String),
    #[error("malformed table name: {0}, expected schema.table")]
    MalformedTable(String),
    #[error("missing fixture param: {0}")]
    MissingParam(&'static str),
    #[error("process error: {0}")]
    Process(#[from] std::io::Error),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("http not ok, code: {0}, reason: {1}")]
    HttpNotOk(StatusCode, String),
}

pub type Result<T> = std::result::Result<T, Error>;
