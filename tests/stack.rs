//! End-to-end tests against a real docker-hive stack.
//!
//! Skipped unless PRESTEST_E2E=1; the compose project location can be
//! overridden with PRESTEST_COMPOSE_DIR (default: ../docker-hive next to this
//! crate).

use std::env;
use std::fs;
use std::path::PathBuf;

use serde_json::json;

use prestest::config::HIVE_PROPERTIES;
use prestest::container::PRESTO_COORDINATOR;
use prestest::fixtures::{self, Params};
use prestest::{Container, DbManager, Error, TemporaryTable};

const CREATE_TABLE_QUERY: &str = "CREATE TABLE {table_name} (
    col1 INT,
    col2 STRING
)
ROW FORMAT DELIMITED
FIELDS TERMINATED BY ','
STORED AS TEXTFILE";

fn e2e_enabled() -> bool {
    if env::var("PRESTEST_E2E").ok().as_deref() == Some("1") {
        return true;
    }
    eprintln!("skip: set PRESTEST_E2E=1 to run against a live docker-hive stack");
    false
}

fn compose_dir() -> PathBuf {
    match env::var("PRESTEST_COMPOSE_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => fixtures::default_container_folder(),
    }
}

fn params() -> Params {
    Params::default().container_folder(compose_dir())
}

fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources/sample_table.csv")
}

fn started_stack() -> (Container, DbManager) {
    let params = params();
    let container = fixtures::container(&params);
    fixtures::start_container_once(&container, &params).expect("stack failed to start");
    let db = fixtures::db_manager(&params).expect("db manager");
    (container, db)
}

#[test]
fn start_stop_and_is_started() {
    if !e2e_enabled() {
        return;
    }
    let (container, _) = started_stack();

    container.start(true).expect("start");
    assert!(container.is_started().expect("is_started"));
    assert!(container.is_healthy().expect("is_healthy"));

    container.stop().expect("stop");
    assert!(!container.is_started().expect("is_started after stop"));
    assert!(!container.is_healthy().expect("is_healthy after stop"));

    // leave the stack running for the remaining tests
    container.start(true).expect("restart");
}

#[test]
fn create_drop_table_and_read_round_trip() {
    if !e2e_enabled() {
        return;
    }
    let (_, db) = started_stack();

    let table = "test_db.test_table";
    let query = CREATE_TABLE_QUERY.replace("{table_name}", table);
    db.create_table(table, &query, &sample_csv()).expect("create_table");

    let frame = db
        .read_sql("SELECT * FROM test_db.test_table")
        .expect("read_sql");
    assert_eq!(frame.columns, vec!["col1", "col2"]);
    assert_eq!(
        frame.rows,
        vec![
            vec![json!(123), json!("abc")],
            vec![json!(456), json!("cba")]
        ]
    );

    // drop twice: both calls succeed, then reads fail
    db.drop_table(table).expect("first drop");
    db.drop_table(table).expect("second drop");
    let err = db.read_sql("SELECT * FROM test_db.test_table").unwrap_err();
    assert!(matches!(err, Error::QueryFailure(_)));
}

#[test]
fn temporary_table_fixture_creates_and_cleans_up() {
    if !e2e_enabled() {
        return;
    }
    let (_, db) = started_stack();

    let params = params()
        .table_name("sandbox.test_temp_table")
        .query(CREATE_TABLE_QUERY)
        .file(sample_csv());

    {
        let table = TemporaryTable::create(&db, &params).expect("create");
        let frame = db
            .read_sql(&format!("SELECT * FROM {}", table.name()))
            .expect("read_sql");
        assert_eq!(frame.len(), 2);
    }

    // dropped on scope exit
    let err = db
        .read_sql("SELECT * FROM sandbox.test_temp_table")
        .unwrap_err();
    assert!(matches!(err, Error::QueryFailure(_)));
}

#[test]
fn enable_table_modification_is_idempotent() {
    if !e2e_enabled() {
        return;
    }
    let (container, _) = started_stack();

    container.enable_table_modification().expect("first call");
    container.enable_table_modification().expect("second call");

    let coordinator = container.set().name(PRESTO_COORDINATOR).unwrap().to_string();
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join("hive.properties");
    container
        .download_from_container(HIVE_PROPERTIES, &local, &coordinator)
        .expect("download");

    let contents = fs::read_to_string(&local).expect("read properties");
    for line in [
        "hive.allow-drop-table=true",
        "hive.allow-rename-table=true",
        "hive.allow-add-column=true",
    ] {
        let count = contents.lines().filter(|l| l.trim() == line).count();
        assert_eq!(count, 1, "{line} should appear exactly once");
    }
}

#[test]
fn scoped_temp_file_is_removed_on_both_exit_paths() {
    if !e2e_enabled() {
        return;
    }
    let (container, _) = started_stack();
    let hive_server = container
        .set()
        .name(prestest::container::HIVE_SERVER)
        .unwrap()
        .to_string();

    // normal exit
    let remote = {
        let upload = container
            .upload_temp_file(&sample_csv(), &hive_server)
            .expect("upload");
        upload.path().to_string()
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let err = container
        .download_from_container(&remote, &dir.path().join("gone.csv"), &hive_server)
        .unwrap_err();
    assert!(matches!(err, Error::Transfer(_)));

    // unwind exit
    let container_for_panic = container.clone();
    let hive_server_for_panic = hive_server.clone();
    let csv = sample_csv();
    let remote = std::sync::Mutex::new(String::new());
    let result = std::panic::catch_unwind(|| {
        let upload = container_for_panic
            .upload_temp_file(&csv, &hive_server_for_panic)
            .expect("upload");
        *remote.lock().unwrap() = upload.path().to_string();
        panic!("boom");
    });
    assert!(result.is_err());
    let remote = remote.into_inner().unwrap();
    let err = container
        .download_from_container(&remote, &dir.path().join("gone2.csv"), &hive_server)
        .unwrap_err();
    assert!(matches!(err, Error::Transfer(_)));
}

#[test]
fn reset_removes_every_container() {
    if !e2e_enabled() {
        return;
    }
    if env::var("PRESTEST_E2E_RESET").ok().as_deref() != Some("1") {
        eprintln!("skip: set PRESTEST_E2E_RESET=1 to run the destructive reset test");
        return;
    }
    let (container, _) = started_stack();

    container.reset(false, false, false).expect("reset");
    for (_, name) in container.set().iter() {
        assert!(matches!(
            container.status(name),
            Err(Error::ContainerNotFound(_))
        ));
    }
    assert!(matches!(
        container.is_started(),
        Err(Error::ContainerNotFound(_))
    ));

    // bring the stack back for any test still to run in this binary
    container.start(true).expect("restart after reset");
}
