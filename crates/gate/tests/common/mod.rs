#![allow(dead_code)]

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::process::{Child, Command};
use std::time::Duration;

pub use aoc_test_support::KillOnDrop;

pub const PASSWORD: &str = "betrayal";
pub const CANONICAL_HOST: &str = "agentsofchaos.baulab.info";

pub const INDEX_HTML: &str = "<!doctype html><title>Agents of Chaos</title>";
pub const REPORT_HTML: &str = "<!doctype html><title>Report</title>";
pub const LOGS_JSON: &str = r#"{"channels":["general"]}"#;

pub fn pick_unused_port() -> anyhow::Result<u16> {
    aoc_test_support::pick_unused_port()
}

pub async fn wait_http_ready(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    aoc_test_support::wait_http_ready(url, timeout_dur).await
}

/// `Authorization` header value for `user:password`.
pub fn basic(credentials: &str) -> String {
    format!("Basic {}", STANDARD.encode(credentials))
}

/// Client that reports redirects instead of following them.
pub fn client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("build http client")
}

/// A small site tree: `/index.html`, `/report.html`, `/data/logs.json`.
pub fn write_site(root: &Path) -> anyhow::Result<()> {
    std::fs::write(root.join("index.html"), INDEX_HTML).context("write index.html")?;
    std::fs::write(root.join("report.html"), REPORT_HTML).context("write report.html")?;
    std::fs::create_dir_all(root.join("data")).context("create data dir")?;
    std::fs::write(root.join("data").join("logs.json"), LOGS_JSON).context("write logs.json")?;
    Ok(())
}

pub fn gate_command(site_dir: &Path, port: u16) -> Command {
    let bin = env!("CARGO_BIN_EXE_aoc-gate");
    let mut cmd = Command::new(bin);
    cmd.arg("--site-dir")
        .arg(site_dir)
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("warn")
        .env_remove("AOC_GATE_CONFIG")
        .env_remove("AOC_GATE_CANONICAL_HOST")
        .env_remove("AOC_GATE_PREVIEW_SUFFIX")
        .env_remove("AOC_GATE_REALM")
        .env_remove("RUST_LOG");
    cmd
}

pub fn spawn_gate(site_dir: &Path, port: u16) -> anyhow::Result<Child> {
    gate_command(site_dir, port)
        .env("AOC_GATE_PASSWORD", PASSWORD)
        .spawn()
        .context("spawn aoc-gate")
}

/// Spawn the gate over a fresh site directory and wait until it answers.
pub async fn start_gate(site: &tempfile::TempDir) -> anyhow::Result<(String, KillOnDrop)> {
    write_site(site.path())?;
    let port = pick_unused_port()?;
    let child = KillOnDrop(spawn_gate(site.path(), port)?);

    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ready(&format!("{base_url}/"), Duration::from_secs(20)).await?;
    Ok((base_url, child))
}
