//! Runs the compiled binary to check the exit codes and messages of the scripts.
//!
//! None of these reach a node: each command either works offline or fails while
//! validating its inputs.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use eyre::Result;
use tempfile::TempDir;

/// Compiled contracts the scripts can load
const FIXTURE_ARTIFACTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/artifacts");

/// Run the scripts binary with a clean environment and the given arguments
fn run(args: &[&str]) -> Result<Output> {
    run_with_env(args, &[("RUST_LOG", "off")])
}

/// Run the scripts binary with a clean environment plus `vars`
fn run_with_env(args: &[&str], vars: &[(&str, &str)]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_bnpl-scripts"))
        .args(args)
        .env_remove("NETWORK")
        .env_remove("PRIVATE_KEY")
        .env_remove("MNEMONIC")
        .env_remove("RINKEBY_RPC_URL")
        .env_remove("ETHERSCAN_API_KEY")
        .envs(vars.iter().copied())
        .output()?;
    Ok(output)
}

/// Write a manifest recording `proxy` as the local `BankingNode` deployment
fn write_local_manifest(dir: &Path, proxy: &str) -> Result<PathBuf> {
    let path = dir.join("deployments.json");
    let manifest = format!(
        r#"{{"local": {{"chain_id": 31337, "proxies": {{"BankingNode": {{
            "proxy": "{proxy}",
            "proxy_admin": "0xcafac3dd18ac6c6e92c921884f9e4176737c052c",
            "implementation": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "contract": "BankingNode"
        }}}}}}}}"#
    );
    fs::write(&path, manifest)?;
    Ok(path)
}

/// The captured stderr of a run
fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn upgrade_with_placeholder_proxy_fails_fast() -> Result<()> {
    let output = run(&["upgrade", "--network", "local", "--proxy", "-"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("placeholder"), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn upgrade_with_malformed_proxy_fails_fast() -> Result<()> {
    let output = run(&["upgrade", "--network", "local", "--proxy", "0x1234"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid address"));
    Ok(())
}

#[test]
fn upgrade_without_recorded_deployment_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let manifest = dir.path().join("deployments.json");
    let output = run(&["upgrade", "--network", "local", "--deployments-path", manifest.to_str().unwrap()])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no deployments recorded for local"));
    Ok(())
}

#[test]
fn upgrade_with_recorded_zero_proxy_fails_fast() -> Result<()> {
    let dir = TempDir::new()?;
    let manifest = write_local_manifest(dir.path(), "0x0000000000000000000000000000000000000000")?;

    // Nothing listens on this port, so only a local check can fail the command
    let output = run(&[
        "upgrade",
        "--network",
        "local",
        "--rpc-url",
        "http://127.0.0.1:9",
        "--deployments-path",
        manifest.to_str().unwrap(),
        "--artifacts-dir",
        FIXTURE_ARTIFACTS,
    ])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("zero address"), "stderr: {}", stderr(&output));
    Ok(())
}

#[test]
fn upgrade_of_unrecorded_proxy_keeps_recorded_one() -> Result<()> {
    let dir = TempDir::new()?;
    let recorded = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
    let manifest = write_local_manifest(dir.path(), recorded)?;
    let before = fs::read_to_string(&manifest)?;

    let output = run(&[
        "upgrade",
        "--network",
        "local",
        "--rpc-url",
        "http://127.0.0.1:9",
        "--proxy",
        "0x8bD243b54eB32dD8025c1f5534b194909caFea47",
        "--deployments-path",
        manifest.to_str().unwrap(),
        "--artifacts-dir",
        FIXTURE_ARTIFACTS,
    ])?;

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("use a different --name"), "stderr: {err}");
    assert!(err.contains(recorded));
    assert_eq!(fs::read_to_string(&manifest)?, before);
    Ok(())
}

#[test]
fn deploy_without_artifacts_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let artifacts = dir.path().join("artifacts");
    let output = run(&["deploy-proxy", "--network", "local", "--artifacts-dir", artifacts.to_str().unwrap()])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("does not exist"));
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn rinkeby_accounts_require_credentials() -> Result<()> {
    let output = run(&["accounts"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("PRIVATE_KEY"));
    Ok(())
}

#[test]
fn local_accounts_use_dev_mnemonic() -> Result<()> {
    let output = run(&["accounts", "--network", "local", "--count", "2"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    let accounts: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        accounts,
        vec![
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        ]
    );
    Ok(())
}

#[test]
fn networks_lists_table() -> Result<()> {
    let output = run(&["networks"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("* rinkeby"));
    assert!(stdout.contains("https://rinkeby.infura.io/v3/"));
    assert!(stdout.contains("http://127.0.0.1:8545/"));
    assert!(stdout.contains("<spawned dev node>"));
    Ok(())
}

#[test]
fn unknown_network_is_an_error() -> Result<()> {
    let output = run(&["networks", "--network", "mainnet"])?;

    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn networks_applies_overrides_to_selected_network_only() -> Result<()> {
    let output = run_with_env(
        &["networks", "--network", "local", "--rpc-url", "http://10.0.0.1:8545"],
        &[("RUST_LOG", "warn"), ("ETHERSCAN_API_KEY", "etherscan-secret")],
    )?;

    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("ignoring RPC URL"), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout)?;
    let local = stdout.lines().find(|l| l.starts_with("* local")).unwrap();
    assert!(local.contains("rpc=http://10.0.0.1:8545"));
    assert!(local.contains("etherscan=set"));
    assert!(stdout.contains("https://rinkeby.infura.io/v3/"));
    assert!(!stdout.contains("etherscan-secret"));
    Ok(())
}
