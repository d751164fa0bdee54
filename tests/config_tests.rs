use bramble::config::{DEFAULT_ADDR, DEFAULT_STACK_SIZE};
use bramble::{MethodMatch, RouterConfig, RouterError, StaticMount};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = RouterConfig::default();
    assert_eq!(config.method_match, MethodMatch::Exact);
    assert!(!config.domain_routing);
    assert_eq!(config.pool_prewarm, 0);
    assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
    assert_eq!(config.addr, DEFAULT_ADDR);
    assert!(config.static_mounts.is_empty());
}

#[test]
fn test_toml_full_document() {
    let config = RouterConfig::from_toml_str(
        r#"
        method_match = "cors"
        domain_routing = true
        pool_prewarm = 8
        stack_size = 0x8000
        addr = "127.0.0.1:9000"

        [[static_mounts]]
        prefix = "/assets"
        dir = "public"
        strip = 1

        [[static_mounts]]
        prefix = "/docs"
        dir = "site/docs"
        "#,
    )
    .unwrap();

    assert_eq!(config.method_match, MethodMatch::Cors);
    assert!(config.domain_routing);
    assert_eq!(config.pool_prewarm, 8);
    assert_eq!(config.stack_size, 0x8000);
    assert_eq!(config.addr, "127.0.0.1:9000");
    assert_eq!(
        config.static_mounts,
        vec![
            StaticMount {
                prefix: "/assets".into(),
                dir: PathBuf::from("public"),
                strip: 1,
            },
            StaticMount {
                prefix: "/docs".into(),
                dir: PathBuf::from("site/docs"),
                strip: 0,
            },
        ]
    );
}

#[test]
fn test_toml_partial_keeps_defaults() {
    let config = RouterConfig::from_toml_str("pool_prewarm = 2").unwrap();
    assert_eq!(config.pool_prewarm, 2);
    assert_eq!(config.addr, DEFAULT_ADDR);
    assert_eq!(RouterConfig::from_toml_str("").unwrap(), RouterConfig::default());
}

#[test]
fn test_toml_errors() {
    for source in [
        r#"method_match = "sometimes""#,
        "pool_prewarm = \"many\"",
        "this is not toml",
    ] {
        let err = RouterConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(err, RouterError::Config(_)), "{source}: {err:?}");
    }
}

#[test]
fn test_env_overrides() {
    let mut config = RouterConfig::default();
    config.apply_env(lookup(&[
        ("BRAMBLE_METHOD_MATCH", "CORS"),
        ("BRAMBLE_DOMAIN_ROUTING", "yes"),
        ("BRAMBLE_POOL_PREWARM", "16"),
        ("BRAMBLE_STACK_SIZE", "0x10000"),
        ("BRAMBLE_ADDR", " 127.0.0.1:7000 "),
    ]));
    assert_eq!(config.method_match, MethodMatch::Cors);
    assert!(config.domain_routing);
    assert_eq!(config.pool_prewarm, 16);
    assert_eq!(config.stack_size, 0x10000);
    assert_eq!(config.addr, "127.0.0.1:7000");
}

#[test]
fn test_invalid_env_values_are_ignored() {
    let mut config = RouterConfig::from_toml_str("pool_prewarm = 4").unwrap();
    config.apply_env(lookup(&[
        ("BRAMBLE_METHOD_MATCH", "loose"),
        ("BRAMBLE_DOMAIN_ROUTING", "perhaps"),
        ("BRAMBLE_POOL_PREWARM", "-1"),
        ("BRAMBLE_STACK_SIZE", "huge"),
        ("BRAMBLE_ADDR", "   "),
    ]));
    let expected = RouterConfig {
        pool_prewarm: 4,
        ..RouterConfig::default()
    };
    assert_eq!(config, expected);
}

#[test]
fn test_load_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "method_match = \"cors\"").unwrap();
    writeln!(file, "pool_prewarm = 1").unwrap();

    let config = RouterConfig::load(file.path()).unwrap();
    assert_eq!(config.method_match, MethodMatch::Cors);
    assert_eq!(config.pool_prewarm, 1);
}

#[test]
fn test_load_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = RouterConfig::load(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "stack_size = [1, 2]").unwrap();
    let err = RouterConfig::load(&bad).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("failed to parse config file"), "{message}");
}
