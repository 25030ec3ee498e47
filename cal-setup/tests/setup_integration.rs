//! Integration tests for the cal-setup binary

use assert_cmd::Command;
use libcalcast::{SocialPlatform, Store};
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    /// Environment whose posting service lives at `ayrshare_url`
    fn with_ayrshare(ayrshare_url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            r#"
[store]
path = "unused"

[publishing]
base_url = "{}"
"#,
            ayrshare_url
        );
        fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn new() -> Self {
        Self::with_ayrshare("http://127.0.0.1:1")
    }

    fn store(&self) -> Store {
        Store::open(self.dir.path().join("data")).unwrap()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cal-setup").unwrap();
        cmd.env("CALCAST_CONFIG", self.dir.path().join("config.toml"))
            .env("CALCAST_DATA_DIR", self.dir.path().join("data"))
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_key_set_show_clear() {
    let env = TestEnv::new();

    env.cmd()
        .args(["key", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not set"));

    env.cmd()
        .args(["key", "set", "ayr-secret-1234"])
        .assert()
        .success();
    assert!(env.store().load_api_key().unwrap().is_some());

    env.cmd()
        .args(["key", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"))
        .stdout(predicate::str::contains("ayr-secret").not());

    env.cmd().args(["key", "clear"]).assert().success();
    assert!(env.store().load_api_key().unwrap().is_none());
}

#[test]
fn test_key_set_from_stdin() {
    let env = TestEnv::new();
    env.cmd()
        .args(["key", "set"])
        .write_stdin("piped-key\n")
        .assert()
        .success();
    assert!(env.store().load_api_key().unwrap().is_some());
}

#[test]
fn test_blank_key_rejected() {
    let env = TestEnv::new();
    env.cmd().args(["key", "set", "   "]).assert().code(3);
}

#[test]
fn test_sync_without_key() {
    let env = TestEnv::new();
    env.cmd()
        .arg("sync")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing credential"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_updates_accounts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ayr-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activeSocialAccounts": ["instagram", "gmb"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let env = TestEnv::with_ayrshare(&server.uri());
    env.store().save_api_key("ayr-key").unwrap();

    env.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 2 connected account(s)"));

    let connected: Vec<_> = env
        .store()
        .load_accounts()
        .unwrap()
        .into_iter()
        .filter(|a| a.connected)
        .map(|a| a.platform)
        .collect();
    assert_eq!(
        connected,
        vec![SocialPlatform::Instagram, SocialPlatform::GoogleBusiness]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let env = TestEnv::with_ayrshare(&server.uri());
    env.store().save_api_key("bad").unwrap();

    env.cmd()
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to verify API key"));
}

#[test]
fn test_connect_and_disconnect() {
    let env = TestEnv::new();

    env.cmd()
        .args(["connect", "linkedin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connected linkedin"));

    let accounts = env.store().load_accounts().unwrap();
    let linkedin = accounts
        .iter()
        .find(|a| a.platform == SocialPlatform::Linkedin)
        .unwrap();
    assert!(linkedin.connected);
    assert!(linkedin.username.as_deref().unwrap().starts_with("user_"));

    env.cmd().args(["disconnect", "linkedin"]).assert().success();
    let accounts = env.store().load_accounts().unwrap();
    assert!(accounts.iter().all(|a| !a.connected));
}

#[test]
fn test_connect_unknown_platform() {
    let env = TestEnv::new();
    env.cmd().args(["connect", "myspace"]).assert().code(3);
}

#[test]
fn test_accounts_json() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["accounts", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let accounts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 5);
    assert_eq!(accounts[4]["platform"], "google-business");
}

#[test]
fn test_profile_set_merges_fields() {
    let env = TestEnv::new();

    env.cmd()
        .args(["profile", "set", "--name", "Corner Bakery", "--tone", "warm"])
        .assert()
        .success();
    env.cmd()
        .args(["profile", "set", "--description", "Sourdough and pastries"])
        .assert()
        .success();

    let profile = env.store().load_profile().unwrap().unwrap();
    assert_eq!(profile.name, "Corner Bakery");
    assert_eq!(profile.tone, "warm");
    assert_eq!(profile.description, "Sourdough and pastries");

    env.cmd()
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Bakery"));
}

#[test]
fn test_profile_requires_name() {
    let env = TestEnv::new();
    env.cmd()
        .args(["profile", "set", "--description", "No name yet"])
        .assert()
        .code(3);
    assert!(env.store().load_profile().unwrap().is_none());
}

#[test]
fn test_assets_lifecycle() {
    let env = TestEnv::new();

    env.cmd()
        .args(["assets", "add", "https://img.example/shop.jpg", "--name", "Shop"])
        .assert()
        .success();
    env.cmd()
        .args(["assets", "add", "https://img.example/logo.png"])
        .assert()
        .success();

    let assets = env.store().load_assets().unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].name, "Untitled Image");
    assert_eq!(assets[1].name, "Shop");

    env.cmd()
        .args(["assets", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://img.example/shop.jpg"));

    env.cmd()
        .args(["assets", "delete", &assets[0].id])
        .assert()
        .success();
    assert_eq!(env.store().load_assets().unwrap().len(), 1);

    env.cmd()
        .args(["assets", "delete", "missing"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_assets_add_requires_url() {
    let env = TestEnv::new();
    env.cmd().args(["assets", "add", " "]).assert().code(3);
}
