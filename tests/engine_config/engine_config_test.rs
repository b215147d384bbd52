use std::io::Write;

use logdb_kv::EngineKind;
use logdb_kv::Error;
use logdb_kv::KvConfig;
use logdb_kv::KvEngine;
use logdb_kv::KvStore;
use serial_test::serial;
use tempfile::TempDir;

fn write_config(
    dir: &TempDir,
    body: &str,
) -> String {
    let path = dir.path().join("kv.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
#[serial]
fn test_open_engine_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let path = write_config(
        &dir,
        &format!(
            r#"
engine = "sled"
data_dir = "{}"

[sled]
cache_capacity = 8388608
"#,
            data_dir.display()
        ),
    );

    temp_env::with_vars_unset(["KVSTORE__ENGINE", "KVSTORE__DATA_DIR"], || {
        let config = KvConfig::load(Some(&path)).unwrap();
        assert_eq!(config.engine, EngineKind::Sled);
        assert_eq!(config.sled.cache_capacity, 8 * 1024 * 1024);

        let mut store = KvEngine::from_config(&config).unwrap();
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.name(), "sled");
        store.close().unwrap();
    });
    assert!(data_dir.is_dir());
}

#[test]
#[serial]
fn test_environment_selects_memory_engine() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "engine = \"sled\"\n");

    temp_env::with_vars([("KVSTORE__ENGINE", Some("memory"))], || {
        let config = KvConfig::load(Some(&path)).unwrap();
        assert_eq!(config.engine, EngineKind::Memory);

        let store = KvEngine::from_config(&config).unwrap();
        assert_eq!(store.kind(), EngineKind::Memory);
    });
}

#[test]
#[serial]
fn test_invalid_tuning_is_rejected_at_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[rocksdb]
level0_slowdown_writes_trigger = 40
level0_stop_writes_trigger = 20
"#,
    );

    let result = KvConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
