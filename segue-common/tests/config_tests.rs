//! Unit tests for configuration discovery and loading
//!
//! Tests the implementation of:
//! - Priority order for config file resolution (CLI > env > user dir)
//! - Missing config files fall back to defaults
//! - Malformed config files are reported, not ignored
//!
//! Note: Uses serial_test crate to prevent ENV variable races.
//! Tests that manipulate SEGUE_TEST_CONFIG are marked with #[serial].

use serde::Deserialize;
use segue_common::config::{load_or_default, load_toml_file, parse_toml, resolve_config_path};
use segue_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::Path;

const ENV_VAR: &str = "SEGUE_TEST_CONFIG";

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Sample {
    #[serde(default)]
    name: String,
    #[serde(default)]
    steps: u32,
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var(ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), ENV_VAR);
    assert_eq!(resolved.unwrap(), Path::new("/tmp/from-cli.toml"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, ENV_VAR);
    assert_eq!(resolved.unwrap(), Path::new("/tmp/from-env.toml"));

    env::remove_var(ENV_VAR);
}

#[test]
fn test_parse_toml_fields() {
    let parsed: Sample = parse_toml("name = \"demo\"\nsteps = 5\n").unwrap();
    assert_eq!(
        parsed,
        Sample {
            name: "demo".to_string(),
            steps: 5
        }
    );
}

#[test]
fn test_malformed_toml_is_an_error() {
    let result: Result<Sample, Error> = parse_toml("steps = = 5");
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_load_toml_file_reads_from_disk() {
    let file = write_config("name = \"disk\"\n");
    let parsed: Sample = load_toml_file(file.path()).unwrap();
    assert_eq!(parsed.name, "disk");
    assert_eq!(parsed.steps, 0);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let result: Result<Sample, Error> =
        load_toml_file(Path::new("/nonexistent/segue/config.toml"));
    match result {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected an I/O error, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[serial]
fn test_load_or_default_uses_explicit_file() {
    env::remove_var(ENV_VAR);
    let file = write_config("steps = 7\n");

    let parsed: Sample = load_or_default(Some(file.path()), ENV_VAR).unwrap();
    assert_eq!(parsed.steps, 7);
}
