use super::*;

use std::collections::HashMap;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_full_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url(" sqlite://./data/a.db "),
        "sqlite://./data/a.db"
    );
    assert_eq!(
        normalize_database_url(""),
        Settings::default().database_url
    );
}

#[test]
fn creates_parent_dir_for_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
per_page = 19
"#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.per_page, 19);
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, "per_page = \"many\"");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SERVER_BIND", "127.0.0.1:1"),
        ("APP__BIND_ADDR", "127.0.0.1:2"),
        ("DATABASE_URL", "sqlite://plain.db"),
        ("APP__PER_PAGE", "0"),
    ]);
    let mut settings = Settings::default();
    apply_env_settings(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.database_url, "sqlite://plain.db");
    assert_eq!(settings.per_page, 1);
}

#[test]
fn non_numeric_per_page_env_is_ignored() {
    let mut settings = Settings::default();
    apply_env_settings(&mut settings, |key| {
        (key == "APP__PER_PAGE").then(|| "lots".to_string())
    });
    assert_eq!(settings.per_page, DEFAULT_PER_PAGE);
}
