use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_settings_path(tag: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("gifswap_{tag}_{suffix}.toml"))
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(Path::new("/nonexistent/gifswap.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn loopback_origin_maps_to_local_backend() {
    let origin = Url::parse("http://127.0.0.1:5173").expect("url");
    assert_eq!(resolve_api_base(&origin), "http://localhost:3000/api");
}

#[test]
fn deployed_origin_serves_api_under_prefix() {
    let origin = Url::parse("https://swap.example.com/some/page").expect("url");
    assert_eq!(resolve_api_base(&origin), "https://swap.example.com/api");
}

#[test]
fn explicit_api_base_wins_and_loses_trailing_slash() {
    let settings = ClientSettings {
        origin: "https://swap.example.com".into(),
        api_base_url: Some("https://api.example.com/v1/".into()),
        ..ClientSettings::default()
    };
    let endpoints = settings.endpoints().expect("endpoints");
    assert_eq!(endpoints.api_base, "https://api.example.com/v1");
    assert_eq!(endpoints.origin.as_str(), "https://swap.example.com/");
}

#[test]
fn rejects_unparseable_origin() {
    let settings = ClientSettings {
        origin: "not a url".into(),
        ..ClientSettings::default()
    };
    let err = settings.endpoints().expect_err("must fail");
    assert!(err.to_string().contains("invalid origin"), "{err}");
}

#[test]
fn file_values_are_overridden_by_environment() {
    let path = temp_settings_path("override");
    fs::write(
        &path,
        "origin = \"https://file.example.com\"\nmax_image_bytes = 1024\ndownload_name = \"out.gif\"\n",
    )
    .expect("write settings");

    let vars: HashMap<&str, &str> = [
        ("APP__ORIGIN", "https://env.example.com"),
        ("GIFSWAP_API_BASE_URL", "https://api.example.com"),
    ]
    .into_iter()
    .collect();
    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.origin, "https://env.example.com");
    assert_eq!(settings.api_base_url.as_deref(), Some("https://api.example.com"));
    assert_eq!(settings.max_image_bytes, 1024);
    assert_eq!(settings.download_name, "out.gif");

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let path = temp_settings_path("malformed");
    fs::write(&path, "origin = ").expect("write settings");

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings, ClientSettings::default());

    fs::remove_file(path).expect("cleanup");
}
