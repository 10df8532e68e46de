// Configuration loading tests
//
// The vendor credential is required: startup must fail fast when it is
// absent from both the config file and the environment.

use parley::Config;

#[test]
fn test_load_from_file() {
    // Keep the ambient credential out of the equation
    std::env::remove_var("OPENAI_API_KEY");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(
        &path,
        r#"
[service]
name = "gateway-test"

[service.http]
bind = "0.0.0.0"
port = 9000

[vendor]
api_key = "sk-test"

[gate]
max_sessions = 5
"#,
    )
    .unwrap();

    let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.name, "gateway-test");
    assert_eq!(cfg.service.http.bind, "0.0.0.0");
    assert_eq!(cfg.service.http.port, 9000);
    assert_eq!(cfg.vendor.api_key, "sk-test");
    assert_eq!(cfg.gate.max_sessions, 5);
}

#[test]
fn test_defaults_fill_missing_sections() {
    std::env::remove_var("OPENAI_API_KEY");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "[vendor]\napi_key = \"sk-test\"\n").unwrap();

    let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.name, "parley");
    assert_eq!(cfg.service.http.bind, "127.0.0.1");
    assert_eq!(cfg.service.http.port, 8787);
    assert_eq!(cfg.gate.max_sessions, 20);
    assert_eq!(cfg.vendor.base_url, "https://api.openai.com/v1");
}

#[test]
fn test_missing_credential_fails() {
    std::env::remove_var("OPENAI_API_KEY");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "[service]\nname = \"no-key\"\n").unwrap();

    assert!(Config::load(path.with_extension("").to_str().unwrap()).is_err());
}
