//! Integration tests for the `vchs` CLI binary.
//!
//! Argument parsing, help output, shell completions and error exit codes
//! run without any service; the listing tests drive the binary against a
//! wiremock server standing in for vCHS and the vCloud cell.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `vchs` binary with env isolation.
///
/// Clears all `VCHS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn vchs_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vchs");
    cmd.env("HOME", "/tmp/vchs-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/vchs-cli-test-nonexistent")
        .env("NO_COLOR", "1");
    for var in [
        "VCHS_PROFILE",
        "VCHS_URL",
        "VCHS_USERNAME",
        "VCHS_PASSWORD",
        "VCHS_VCHS_VERSION",
        "VCHS_VCLOUD_VERSION",
        "VCHS_OUTPUT",
        "VCHS_INSECURE",
        "VCHS_TIMEOUT",
        "VCHS_POLL_INTERVAL",
        "VCHS_MAX_POLLS",
        "VCHS_DEFAULT_PROFILE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn xml(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, "application/xml")
}

/// vCHS login, a single compute service with one active VDC, the vCloud
/// session exchange and a template query returning two records.
async fn mount_account(server: &MockServer) {
    let uri = server.uri();

    Mock::given(method("POST"))
        .and(path("/api/vchs/sessions"))
        .respond_with(
            xml(
                201,
                format!(
                    r#"<Session href="{uri}/api/vchs/session">
                         <Link rel="down" type="application/xml;class=vnd.vmware.vchs.servicelist"
                               href="{uri}/api/vchs/services"/>
                       </Session>"#
                ),
            )
            .insert_header("x-vchs-authorization", "vchs-token"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vchs/services"))
        .respond_with(xml(
            200,
            format!(
                r#"<Services>
                     <Service region="uk-slough-1" serviceId="M2" serviceType="compute:vpc"
                              href="{uri}/api/vchs/compute/2"/>
                   </Services>"#
            ),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vchs/compute/2"))
        .respond_with(xml(
            200,
            format!(
                r#"<Compute serviceId="M2" href="{uri}/api/vchs/compute/2">
                     <VdcRef name="Lab-VDC" status="Active" href="{uri}/api/vchs/compute/2/vdc/l">
                       <Link rel="down" type="application/xml;class=vnd.vmware.vchs.vcloudsession"
                             href="{uri}/api/vchs/compute/2/vdc/l/vcloudsession"/>
                     </VdcRef>
                   </Compute>"#
            ),
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/vchs/compute/2/vdc/l/vcloudsession"))
        .respond_with(xml(
            201,
            format!(
                r#"<VCloudSession href="{uri}/api/vchs/compute/2/vdc/l/vcloudsession">
                     <VdcLink authorizationToken="vcd-token" name="Lab-VDC"
                              href="{uri}/api/vdc/vdc-7"/>
                   </VCloudSession>"#
            ),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("type", "vAppTemplate"))
        .respond_with(xml(
            200,
            r#"<QueryResultRecords total="2">
                 <VAppTemplateRecord name="CentOS64-64BIT" href="https://vcd/t/1"/>
                 <VAppTemplateRecord name="W2K12-STD-64BIT" href="https://vcd/t/2"/>
               </QueryResultRecords>"#
                .into(),
        ))
        .mount(server)
        .await;
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = vchs_cmd();
    cmd.args([
        "--url",
        &server.uri(),
        "--username",
        "ops@example.com",
        "--password",
        "s3cret",
    ]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = vchs_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    vchs_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("vCloud Hybrid Service")
            .and(predicate::str::contains("vdcs"))
            .and(predicate::str::contains("vm"))
            .and(predicate::str::contains("gateway")),
    );
}

#[test]
fn test_version_flag() {
    vchs_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vchs"));
}

#[test]
fn test_vm_create_help_lists_required_flags() {
    vchs_cmd().args(["vm", "create", "--help"]).assert().success().stdout(
        predicate::str::contains("--template")
            .and(predicate::str::contains("--network"))
            .and(predicate::str::contains("--vdc")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    vchs_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    vchs_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    vchs_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_toml() {
    vchs_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_without_file_prints_defaults() {
    vchs_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]").and(predicate::str::contains("max_polls = 10")));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("vchs");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
[profiles.default]
url = "https://vchs.example.com"
username = "ops@example.com"
password = "hunter2"
"#,
    )
    .unwrap();

    let output = vchs_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    let text = combined_output(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("ops@example.com"), "{text}");
    assert!(!text.contains("hunter2"), "{text}");
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = vchs_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_gateway_rejects_malformed_address() {
    let output = vchs_cmd()
        .args([
            "gateway",
            "add-rules",
            "--vdc",
            "VDC-A",
            "--gateway",
            "gw",
            "--external-ip",
            "203.0.113.300",
            "--internal-ip",
            "192.168.109.2",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("external-ip"));
}

#[test]
fn test_max_polls_conflicts_with_unbounded() {
    let output = vchs_cmd()
        .args(["vdcs", "list", "--max-polls", "5", "--unbounded-polls"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_vdcs_list_without_credentials() {
    let output = vchs_cmd().args(["vdcs", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("No credentials"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = vchs_cmd()
        .args(["--profile", "nope", "vdcs", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("Profile 'nope' not found"));
}

// ── Against a mock service ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_vdcs_list_plain_output() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    let mut cmd = against(&server);
    cmd.args(["vdcs", "list", "-o", "plain"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Lab-VDC");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vdcs_list_json_output() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    let mut cmd = against(&server);
    cmd.args(["vdcs", "list", "-o", "json-compact"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing[0]["name"], "Lab-VDC");
    assert_eq!(listing[0]["region"], "uk-slough-1");
    assert_eq!(listing[0]["templates"][1], "W2K12-STD-64BIT");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/vchs/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["vdcs", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_vdc_exits_with_not_found_code() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    let mut cmd = against(&server);
    cmd.args([
        "gateway",
        "add-rules",
        "--vdc",
        "Missing-VDC",
        "--gateway",
        "gw",
        "--external-ip",
        "203.0.113.12",
        "--internal-ip",
        "192.168.109.2",
    ]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Missing-VDC"));
}
