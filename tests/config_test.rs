//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE
//! - Global → Local: literal access lists UNION with negation support
//! - Any → Env vars: REPLACE
//!
//! Global configs are passed explicitly so the user's real config never interferes.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use surveykit::application::ApplicationError;
use surveykit::config::{local_config_path, Settings};
use surveykit::domain::OneOrMany;

fn write(path: &PathBuf, content: &str) {
    fs::write(path, content).expect("write config");
}

#[test]
fn given_no_config_files_when_load_then_defaults_with_data_dir_override() {
    // Arrange
    let data_dir = TempDir::new().unwrap();

    // Act
    let settings = Settings::load_from(None, Some(data_dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.data_dir, data_dir.path());
    assert!(settings.tabulate.ignore_blanks);
    assert!(settings.access.is_empty());
    assert_eq!(settings.export.delimiter, None);
}

#[test]
fn given_global_and_local_allow_lists_when_load_then_union_with_negation() {
    // Arrange
    let config_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    let global = config_dir.path().join("surveykit.toml");
    write(
        &global,
        r#"
[access]
allowed = ["Q1", "Q2"]
"#,
    );
    write(
        &local_config_path(data_dir.path()),
        r#"
[access]
allowed = ["Q3", "!Q1"]
"#,
    );

    // Act
    let settings = Settings::load_from(Some(&global), Some(data_dir.path())).unwrap();

    // Assert
    assert_eq!(
        settings.access.allowed,
        Some(OneOrMany::Many(vec!["Q2".into(), "Q3".into()]))
    );
}

#[test]
fn given_global_data_dir_when_load_then_local_config_read_from_there() {
    // Arrange
    let config_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    let global = config_dir.path().join("surveykit.toml");
    write(
        &global,
        &format!("data_dir = {:?}\n", data_dir.path().display().to_string()),
    );
    write(
        &local_config_path(data_dir.path()),
        r#"
[tabulate]
sort = true

[export]
delimiter = ";"
"#,
    );

    // Act
    let settings = Settings::load_from(Some(&global), None).unwrap();

    // Assert
    assert_eq!(settings.data_dir, data_dir.path());
    assert!(settings.tabulate.sort);
    assert!(settings.tabulate.ignore_blanks);
    assert_eq!(settings.export.delimiter_byte().unwrap(), Some(b';'));
}

#[test]
fn given_pattern_in_local_config_when_load_then_replaces_global_rule() {
    let config_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    let global = config_dir.path().join("surveykit.toml");
    write(&global, "[access]\nblocked = [\"id\"]\n");
    write(
        &local_config_path(data_dir.path()),
        "[access]\nblocked = \"/^_/\"\n",
    );

    let settings = Settings::load_from(Some(&global), Some(data_dir.path())).unwrap();

    assert_eq!(settings.access.blocked, Some(OneOrMany::One("/^_/".into())));
    assert!(settings.access_filter().block().unwrap().is_pattern());
}

#[test]
fn given_unknown_tabulate_key_when_load_then_config_error() {
    let data_dir = TempDir::new().unwrap();
    write(
        &local_config_path(data_dir.path()),
        "[tabulate]\nignore_blank = false\n",
    );

    let result = Settings::load_from(None, Some(data_dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    let config_dir = TempDir::new().unwrap();
    let global = config_dir.path().join("surveykit.toml");
    write(&global, "data_dir = [unclosed");

    let result = Settings::load_from(Some(&global), None);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_env_override_when_load_then_replaces_file_value() {
    // Arrange
    let data_dir = TempDir::new().unwrap();
    write(&local_config_path(data_dir.path()), "pretty = true\n");
    std::env::set_var("SURVEYKIT_PRETTY", "false");

    // Act
    let settings = Settings::load_from(None, Some(data_dir.path()));
    std::env::remove_var("SURVEYKIT_PRETTY");

    // Assert
    assert!(!settings.unwrap().pretty);
}

#[test]
fn given_nested_env_var_when_load_then_overrides_tabulate_table() {
    // Arrange
    let data_dir = TempDir::new().unwrap();
    write(&local_config_path(data_dir.path()), "[tabulate]\nsort = false\n");
    std::env::set_var("SURVEYKIT_TABULATE__SORT", "true");

    // Act
    let settings = Settings::load_from(None, Some(data_dir.path()));
    std::env::remove_var("SURVEYKIT_TABULATE__SORT");

    // Assert
    assert!(settings.unwrap().tabulate.sort);
}

#[test]
fn given_local_whitelist_alias_when_load_then_unions_with_global_allowed() {
    // Arrange
    let config_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    let global = config_dir.path().join("surveykit.toml");
    write(&global, "[access]\nallowed = [\"Q1\"]\n");
    write(
        &local_config_path(data_dir.path()),
        "[access]\nwhitelist = [\"Q2\"]\n",
    );

    // Act
    let settings = Settings::load_from(Some(&global), Some(data_dir.path())).unwrap();

    // Assert
    assert_eq!(
        settings.access.allowed,
        Some(OneOrMany::Many(vec!["Q1".into(), "Q2".into()]))
    );
    assert_eq!(settings.access.whitelist, None);
}

#[test]
fn given_template_when_parsed_then_valid_toml() {
    let parsed: Result<toml::Value, _> = toml::from_str(&Settings::template());
    assert!(parsed.is_ok());
}
