//! Test support for a Hive/Presto stack running under docker-compose: start
//! and reset the containers, copy seed files in, toggle table modification in
//! the Presto connector, and bootstrap tables for integration tests.

pub mod config;
pub mod container;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod hive;
pub mod presto;
pub mod process;
pub mod retry;
pub mod transfer;

pub use config::AppendOptions;
pub use container::{Container, ContainerSet, ContainerStatus};
pub use db::DbManager;
pub use error::{Error, Result};
pub use fixtures::{Params, TemporaryTable};
pub use hive::HiveClient;
pub use presto::{DataFrame, PrestoClient};
pub use transfer::TempFile;
