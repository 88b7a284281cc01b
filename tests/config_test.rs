//! Tests for config module

use serial_test::serial;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use gallwatch::config::Config;

const ENV_VARS: &[&str] = &[
    "GALLWATCH_RATE_LIMIT",
    "GALLWATCH_MAX_RETRIES",
    "GALLWATCH_USER_AGENT",
    "GALLWATCH_LISTING_URL",
    "GALLWATCH_OUTPUT_DIR",
    "GALLWATCH_LOG_FORMAT",
];

fn clear_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_config_toml_matches_defaults() {
    let config = Config::from_file(Path::new("config.toml")).expect("config.toml should parse");
    let defaults = Config::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.board.listing_url, defaults.board.listing_url);
    assert_eq!(config.selectors.comment, defaults.selectors.comment);
    assert_eq!(config.output.file_prefix, "wow_reviews");
    assert_eq!(config.crawler.stop_after_empty_pages, None);
}

#[test]
fn test_from_file_partial() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[crawler]
min_delay_ms = 0
max_delay_ms = 0
stop_after_empty_pages = 2

[output]
dir = "/tmp/gallwatch"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.crawler.min_delay_ms, 0);
    assert_eq!(config.crawler.stop_after_empty_pages, Some(2));
    assert_eq!(config.output.dir, PathBuf::from("/tmp/gallwatch"));
    assert_eq!(config.crawler.rate_limit, 2);
}

#[test]
fn test_from_file_rejects_bad_toml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[crawler\nrate_limit = ").unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse TOML config file"));
}

#[test]
fn test_from_file_missing() {
    assert!(Config::from_file(Path::new("does-not-exist.toml")).is_err());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("GALLWATCH_RATE_LIMIT", "7");
    std::env::set_var("GALLWATCH_MAX_RETRIES", "1");
    std::env::set_var("GALLWATCH_USER_AGENT", "gallwatch-test/1.0");
    std::env::set_var(
        "GALLWATCH_LISTING_URL",
        "https://gall.dcinside.com/mgallery/board/lists/?id=wow",
    );
    std::env::set_var("GALLWATCH_OUTPUT_DIR", "/tmp/out");

    let config = Config::from_env();
    clear_env();

    assert_eq!(config.crawler.rate_limit, 7);
    assert_eq!(config.crawler.max_retries, 1);
    assert_eq!(config.crawler.user_agent.as_deref(), Some("gallwatch-test/1.0"));
    assert_eq!(
        config.board.listing_url,
        "https://gall.dcinside.com/mgallery/board/lists/?id=wow"
    );
    assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
}

#[test]
#[serial]
fn test_env_ignores_unparsable_values() {
    clear_env();
    std::env::set_var("GALLWATCH_RATE_LIMIT", "fast");
    std::env::set_var("GALLWATCH_LOG_FORMAT", "   ");

    let config = Config::from_env();
    clear_env();

    assert_eq!(config.crawler.rate_limit, 2);
    assert_eq!(config.logging.format, "text");
}

#[test]
#[serial]
fn test_env_applies_over_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[crawler]\nrate_limit = 4\nmax_retries = 5").unwrap();
    std::env::set_var("GALLWATCH_RATE_LIMIT", "9");

    let mut config = Config::from_file(file.path()).unwrap();
    config.apply_env();
    clear_env();

    assert_eq!(config.crawler.rate_limit, 9);
    assert_eq!(config.crawler.max_retries, 5);
}
