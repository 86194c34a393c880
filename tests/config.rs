//! Tests for configuration loading

use podtail::config;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn loads_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[cluster]
server = "https://10.0.0.1:6443"
namespace = "staging"
token = "secret"
insecure_skip_tls_verify = true

[groups]
frontend = ["frontend-web", "frontend-ssr"]
"#,
    );

    let config = config::load(Some(&path)).unwrap();

    assert_eq!(config.cluster.server, "https://10.0.0.1:6443");
    assert_eq!(config.cluster.namespace, "staging");
    assert_eq!(config.cluster.token.as_deref(), Some("secret"));
    assert!(config.cluster.insecure_skip_tls_verify);
    assert_eq!(
        config.groups.get("frontend").unwrap(),
        &vec!["frontend-web".to_string(), "frontend-ssr".to_string()]
    );
}

#[test]
fn namespace_and_groups_have_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[cluster]
server = "https://example.test"
"#,
    );

    let config = config::load(Some(&path)).unwrap();

    assert_eq!(config.cluster.namespace, "default");
    assert_eq!(config.cluster.token, None);
    assert!(!config.cluster.insecure_skip_tls_verify);
    assert!(config.groups.is_empty());
}

#[test]
fn missing_file_is_a_clear_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");

    let err = config::load(Some(&path)).unwrap_err();

    assert!(err.to_string().contains("not found"));
}

#[test]
fn unparseable_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "this is not toml = [");

    let err = config::load(Some(&path)).unwrap_err();

    assert!(err.to_string().contains("parse"));
}
