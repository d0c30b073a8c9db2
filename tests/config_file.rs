//! Config file loading against real files on disk

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use tokio_test::{assert_err, assert_ok};
use upctl::config::Config;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_reads_yaml_file() {
    let file = write_config(
        "username: alice\npassword: s3cret\nmax_actions_before_confirm: 3\nworkers: 4\n",
    );

    let config = assert_ok!(Config::load(Some(file.path())));
    assert_eq!(config.username.as_deref(), Some("alice"));
    assert_eq!(config.max_actions_before_confirm, 3);
    assert_eq!(config.workers, 4);
    assert_eq!(config.client_timeout_secs, 120);

    let credentials = assert_ok!(config.credentials());
    assert_eq!(credentials.username, "alice");
    assert_eq!(credentials.password, "s3cret");
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_empty_file_gives_defaults() {
    let file = write_config("   \n");
    assert_eq!(Config::load(Some(file.path())).unwrap(), Config::default());
}

#[test]
fn test_malformed_file_names_path() {
    let file = write_config("username: [unterminated\n");

    let err = assert_err!(Config::load(Some(file.path())));
    assert_eq!(
        err.to_string(),
        format!("unable to parse config from file '{}'", file.path().display())
    );
}

#[test]
fn test_wrong_type_is_rejected() {
    let file = write_config("workers: many\n");
    assert_err!(Config::load(Some(file.path())));
}
