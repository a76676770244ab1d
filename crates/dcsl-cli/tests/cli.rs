//! End-to-end tests driving the `dcsl` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dcsl_schema::{
    Bytes, DeviceCertificateStatus, DeviceCertificateStatusList, Message, ProvisionedDeviceInfo,
    SecurityLevel, SignedDeviceCertificateStatusList, Status,
};
use tempfile::TempDir;

/// Test context with an isolated cache directory
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self { temp_dir }
    }

    fn cache_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn dcsl_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dcsl"));
        cmd.current_dir(self.cache_dir());
        cmd.env("DCSL_CACHE_DIR", self.cache_dir());
        cmd.env_remove("DCSL_URL");
        cmd.env_remove("DCSL_API_KEY");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run with `stdin` piped in.
    fn run(&self, args: &[&str], stdin: &[u8]) -> Output {
        let mut child = self
            .dcsl_cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to run dcsl");
        // the binary may exit without reading stdin (cached input)
        let _ = child.stdin.take().expect("stdin is piped").write_all(stdin);
        child.wait_with_output().expect("failed to wait for dcsl")
    }
}

fn device(system_id: u32, manufacturer: &str, model: &str) -> DeviceCertificateStatus {
    DeviceCertificateStatus {
        serial_number: Bytes::from(system_id.to_be_bytes().as_slice()),
        status: Status::Valid,
        device_info: Some(ProvisionedDeviceInfo {
            system_id,
            manufacturer: manufacturer.into(),
            model: model.into(),
            security_level: SecurityLevel::Level1,
            ..ProvisionedDeviceInfo::default()
        }),
    }
}

fn ledger() -> Vec<u8> {
    let mut revoked = device(300, "Acme", "Rocket");
    revoked.status = Status::Revoked;

    SignedDeviceCertificateStatusList {
        certificate_status_list: Some(DeviceCertificateStatusList {
            creation_time_seconds: 1_700_000_000,
            certificate_status: vec![
                device(100, "Acme", "Anvil"),
                device(200, "Globex", "Widget"),
                revoked,
                device(400, "", "Mystery"),
                device(100, "Initech", "Duplicate"),
            ],
        }),
        signature: Bytes::from(vec![1, 2, 3]),
    }
    .encode_to_vec()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.dcsl_cmd().arg("--help").output().expect("failed to run dcsl");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("--system-id"));
    assert!(text.contains("--list-manufacturers"));
}

#[test]
fn test_full_dump_from_stdin() {
    let ctx = TestContext::new();
    let output = ctx.run(&[], &ledger());
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let list = &json["certificateStatusList"];
    assert_eq!(list["creationTimeSeconds"], 1_700_000_000);
    assert_eq!(list["certificateStatus"].as_array().unwrap().len(), 5);
    assert_eq!(list["certificateStatus"][2]["status"], "REVOKED");
    assert_eq!(json["signature"], "AQID");
}

#[test]
fn test_system_id_returns_first_match() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--system-id", "100"], &ledger());
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["deviceInfo"]["systemId"], 100);
    assert_eq!(json["deviceInfo"]["model"], "Anvil");
    assert_eq!(json["deviceInfo"]["securityLevel"], "LEVEL_1");
}

#[test]
fn test_system_id_not_found() {
    let ctx = TestContext::new();
    let output = ctx.run(&["-s", "999"], &ledger());
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "Can't find device certificate entry with system ID 999\n"
    );
}

#[test]
fn test_zero_system_id_dumps_everything() {
    let ctx = TestContext::new();
    let output = ctx.run(&["-s", "0"], &ledger());
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.get("certificateStatusList").is_some());
}

#[test]
fn test_list_manufacturers() {
    let ctx = TestContext::new();
    let output = ctx.run(&["-m"], &ledger());
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Acme, 2\nGlobex, 1\nInitech, 1\n");
}

#[test]
fn test_empty_input() {
    let ctx = TestContext::new();

    let output = ctx.run(&[], &[]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "{}\n");

    let output = ctx.run(&["-m"], &[]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_malformed_input_fails() {
    let ctx = TestContext::new();
    let mut bytes = ledger();
    bytes.truncate(bytes.len() - 2);

    let output = ctx.run(&[], &bytes);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse protocol buffer"));
}

#[test]
fn test_cached_file_preferred_over_stdin() {
    let ctx = TestContext::new();
    let cache = dcsl_cli::paths::todays_cache_file(ctx.cache_dir());
    std::fs::write(&cache, ledger()).unwrap();

    let output = ctx.run(&["-m"], b"\xff\xff\xff");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Acme, 2\nGlobex, 1\nInitech, 1\n");
}

#[test]
fn test_fetch_writes_daily_cache() {
    let ctx = TestContext::new();
    let mut server = mockito::Server::new();
    let body = format!(
        r#"{{"listResponseHeader": {{}}, "signedList": "{}"}}"#,
        URL_SAFE_NO_PAD.encode(ledger())
    );
    let mock = server
        .mock("POST", mockito::Matcher::Regex("^/list".to_string()))
        .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create();

    let url = format!("{}/list", server.url());
    let output = ctx.run(
        &["--fetch", "--url", &url, "--api-key", "test-key", "-s", "200"],
        &[],
    );
    assert!(output.status.success());
    mock.assert();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["deviceInfo"]["manufacturer"], "Globex");

    let cache = dcsl_cli::paths::todays_cache_file(ctx.cache_dir());
    assert_eq!(std::fs::read(cache).unwrap(), ledger());
}

#[test]
fn test_fetch_failure_reports_error() {
    let ctx = TestContext::new();
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", mockito::Matcher::Regex("^/list".to_string()))
        .with_status(200)
        .with_body(r#"{"listResponseHeader": {}}"#)
        .create();

    let url = format!("{}/list", server.url());
    let output = ctx.run(&["--fetch", "--url", &url], &[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("signedList"));
    assert!(!dcsl_cli::paths::todays_cache_file(ctx.cache_dir()).exists());
}
