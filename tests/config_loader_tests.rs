use postpilot::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

// 32 bytes of 'a', standard base64
const CRYPTO_KEY: &str = "YWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWE=";

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("POSTPILOT_PROFILE");
        env::remove_var("POSTPILOT_API_BIND_ADDR");
        env::remove_var("POSTPILOT_LOG_LEVEL");
        env::remove_var("POSTPILOT_CRYPTO_KEY");
        env::remove_var("POSTPILOT_OPERATOR_TOKEN");
        env::remove_var("POSTPILOT_OPERATOR_TOKENS");
        env::remove_var("POSTPILOT_OAUTH_STATE_TTL_MINUTES");
        env::remove_var("POSTPILOT_PUBLISH_GATEWAY_URL");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn base_env(dir: &TempDir) {
    write_env_file(
        dir,
        ".env",
        &format!(
            "POSTPILOT_OPERATOR_TOKEN=file-token\nPOSTPILOT_CRYPTO_KEY={}\n",
            CRYPTO_KEY
        ),
    );
}

#[test]
fn loads_defaults_from_minimal_env_file() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load_files_only().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.oauth_state_ttl_minutes, 30);
    assert_eq!(cfg.publish_timeout_seconds, 15);
    assert!(cfg.publish_gateway_url.is_none());
    assert_eq!(cfg.operator_tokens, vec!["file-token".to_string()]);
    assert_eq!(cfg.crypto_key.as_ref().map(Vec::len), Some(32));
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(
        &temp_dir,
        ".env.local",
        "POSTPILOT_PROFILE=test\nPOSTPILOT_API_BIND_ADDR=127.0.0.1:4000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "POSTPILOT_API_BIND_ADDR=192.168.0.10:5000\nPOSTPILOT_OAUTH_STATE_TTL_MINUTES=10\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "POSTPILOT_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader
        .load_files_only()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.oauth_state_ttl_minutes, 10);
}

#[test]
fn operator_tokens_list_wins_over_single_token() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(
        &temp_dir,
        ".env.local",
        "POSTPILOT_OPERATOR_TOKENS=one, two,,three\n",
    );

    let cfg = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .unwrap();

    assert_eq!(cfg.operator_tokens, vec!["one", "two", "three"]);
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(
        &temp_dir,
        ".env.local",
        "POSTPILOT_API_BIND_ADDR=127.0.0.1:3000\n",
    );

    unsafe {
        env::set_var("POSTPILOT_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(&temp_dir, ".env.local", "POSTPILOT_API_BIND_ADDR=not-an-addr\n");

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .expect_err("invalid bind addr should fail");
    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
}

#[test]
fn missing_crypto_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "POSTPILOT_OPERATOR_TOKEN=file-token\n");

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .expect_err("crypto key is required");
    assert!(matches!(err, ConfigError::MissingCryptoKey));
}

#[test]
fn short_crypto_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "POSTPILOT_OPERATOR_TOKEN=file-token\nPOSTPILOT_CRYPTO_KEY=c2hvcnQ=\n",
    );

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .expect_err("short key should fail");
    assert!(matches!(err, ConfigError::InvalidCryptoKeyLength { length: 5 }));
}

#[test]
fn out_of_range_state_ttl_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(
        &temp_dir,
        ".env.local",
        "POSTPILOT_OAUTH_STATE_TTL_MINUTES=0\n",
    );

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .expect_err("zero ttl should fail");
    assert!(matches!(err, ConfigError::InvalidOAuthStateTtl { value: 0 }));
}

#[test]
fn publish_gateway_must_be_http() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);
    write_env_file(
        &temp_dir,
        ".env.local",
        "POSTPILOT_PUBLISH_GATEWAY_URL=ftp://gateway.internal/publish\n",
    );

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .expect_err("ftp gateway should fail");
    assert!(matches!(
        err,
        ConfigError::UnsupportedPublishGatewayScheme { .. }
    ));
}

#[test]
fn redacted_json_hides_secrets() {
    let temp_dir = TempDir::new().unwrap();
    base_env(&temp_dir);

    let cfg = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load_files_only()
        .unwrap();
    let rendered = cfg.redacted_json().unwrap();

    assert!(!rendered.contains("file-token"));
    assert!(rendered.contains("[REDACTED]"));
}
