//! Dependency tables of the workspace crates

use std::path::Path;

fn dependency_names(manifest: &Path, table: &str) -> Vec<String> {
    let text = std::fs::read_to_string(manifest).unwrap();
    let document: toml::Table = text.parse().unwrap();
    document
        .get(table)
        .and_then(|value| value.as_table())
        .map(|deps| deps.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_core_keeps_async_runtime_in_dev_dependencies() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");

    let deps = dependency_names(&manifest, "dependencies");
    assert!(!deps.contains(&"tokio".to_string()));
    assert!(deps.contains(&"sqlx".to_string()));

    let text = std::fs::read_to_string(&manifest).unwrap();
    let document: toml::Table = text.parse().unwrap();
    let tokio = &document["dev-dependencies"]["tokio"];
    assert_eq!(tokio.get("workspace").and_then(|v| v.as_bool()), Some(true));
    assert!(tokio.get("features").is_none());
}

#[test]
fn test_cli_dependencies() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("../diarist-cli/Cargo.toml");

    let deps = dependency_names(&manifest, "dependencies");
    assert!(!deps.contains(&"chrono".to_string()));
    for name in ["diarist-core", "tokio", "clap", "tracing-subscriber", "anyhow"] {
        assert!(deps.contains(&name.to_string()), "{name} missing");
    }
}
