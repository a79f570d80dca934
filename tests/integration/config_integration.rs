//! Layered settings: defaults, settings file and environment overrides.

use super::test_utils::{with_env_vars, Fixture};
use std::io::Write;
use stdio_context::{ContextOptions, ExitDisciplineError, Settings, StdioContext};
use tempfile::NamedTempFile;

fn settings_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_loads_settings_file() {
    let file = settings_file(
        r#"
[defaults]
strict = true

[logging]
level = "debug"
format = "json"
"#,
    );

    let settings = with_env_vars(&[], || Settings::load_from(file.path())).unwrap();
    assert!(settings.defaults.strict);
    assert!(!settings.defaults.overwrite);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, "json");
    assert!(settings.logging.color);
}

#[test]
fn test_environment_overrides_file() {
    let file = settings_file("[defaults]\nstrict = true\noverwrite = false\n");

    let settings = with_env_vars(
        &[
            ("STDIO_CONTEXT_DEFAULTS__STRICT", "false"),
            ("STDIO_CONTEXT_DEFAULTS__OVERWRITE", "true"),
        ],
        || Settings::load_from(file.path()),
    )
    .unwrap();
    assert!(!settings.defaults.strict);
    assert!(settings.defaults.overwrite);
}

#[test]
fn test_missing_required_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(with_env_vars(&[], || Settings::load_from(&missing)).is_err());
}

#[test]
fn test_missing_optional_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let missing = missing.to_str().unwrap();

    let settings = with_env_vars(&[("STDIO_CONTEXT_CONFIG", missing)], Settings::load).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_invalid_logging_level_is_rejected() {
    let file = settings_file("[logging]\nlevel = \"chatty\"\n");
    let err = with_env_vars(&[], || Settings::load_from(file.path())).unwrap_err();
    assert!(err.to_string().contains("chatty"));
}

#[test]
fn test_configured_defaults_drive_exit_policy() {
    let file = settings_file("[defaults]\nstrict = true\n");
    let settings = with_env_vars(&[], || Settings::load_from(file.path())).unwrap();
    let fixture = Fixture::new();

    let context = StdioContext::with_environment(
        &fixture.env,
        ContextOptions::from_defaults(&settings.defaults),
    )
    .unwrap();
    assert!(context.policy().strict);
    assert!(matches!(context.exit(), Err(ExitDisciplineError::ExtraExit(_))));

    let lax = StdioContext::with_environment(
        &fixture.env,
        ContextOptions::from_defaults(&settings.defaults).strict(false),
    )
    .unwrap();
    assert!(lax.exit().is_ok());
}
