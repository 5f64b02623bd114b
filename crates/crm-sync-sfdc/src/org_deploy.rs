//! Source deploys through the `sf` CLI.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{SfdcError, SfdcResult};

/// JSON envelope printed by `sf ... --json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SfCommandOutput {
    pub status: i64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Summary of a finished deploy.
#[derive(Debug, Clone)]
pub struct DeploySummary {
    pub deploy_id: Option<String>,
    pub component_count: usize,
    pub duration_secs: f32,
    pub result: Value,
}

/// Arguments for `sf project deploy start`.
#[must_use]
pub fn deploy_args(source_dir: &Path, target_org: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "project".to_owned(),
        "deploy".to_owned(),
        "start".to_owned(),
        "--source-dir".to_owned(),
        source_dir.display().to_string(),
    ];
    if let Some(org) = target_org {
        args.push("--target-org".to_owned());
        args.push(org.to_owned());
    }
    args.push("--json".to_owned());
    args
}

/// Deploy `source_dir` with the `sf` binary.
pub async fn deploy_source(
    sf_binary: &str,
    source_dir: &Path,
    target_org: Option<&str>,
) -> SfdcResult<DeploySummary> {
    let args = deploy_args(source_dir, target_org);
    info!(source_dir = %source_dir.display(), target_org, "deploying source");

    let mut cmd = TokioCommand::new(sf_binary);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(binary = sf_binary, ?args, "spawning sf");
    let start = Instant::now();
    let output = cmd
        .output()
        .await
        .map_err(|e| SfdcError::command(format!("failed to spawn {sf_binary}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut summary = parse_deploy_output(&stdout, output.status.success()).map_err(|err| {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            err
        } else {
            SfdcError::command(format!("{err}; stderr: {}", stderr.trim()))
        }
    })?;
    summary.duration_secs = start.elapsed().as_secs_f32();

    info!(
        deploy_id = summary.deploy_id.as_deref().unwrap_or_default(),
        components = summary.component_count,
        duration_secs = summary.duration_secs,
        "source deployed"
    );
    Ok(summary)
}

/// Interpret the JSON printed by a deploy.
///
/// Fails when the process exited non-zero or the envelope reports a
/// non-zero status.
pub fn parse_deploy_output(stdout: &str, exited_ok: bool) -> SfdcResult<DeploySummary> {
    let parsed: Result<SfCommandOutput, _> = serde_json::from_str(stdout.trim());

    let output = match parsed {
        Ok(output) => output,
        Err(e) if exited_ok => {
            return Err(SfdcError::command(format!("unreadable sf output: {e}")));
        }
        Err(_) => return Err(SfdcError::command("sf exited with a failure status")),
    };

    if !exited_ok || output.status != 0 {
        let reason = output
            .message
            .or(output.name)
            .unwrap_or_else(|| format!("status {}", output.status));
        return Err(SfdcError::command(reason));
    }

    let result = output.result.unwrap_or(Value::Null);
    let deploy_id = result
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let component_count = result
        .get("files")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    Ok(DeploySummary {
        deploy_id,
        component_count,
        duration_secs: 0.0,
        result,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn target_org_is_optional() {
        let dir = PathBuf::from("src/sfdc/base");
        assert_eq!(
            deploy_args(&dir, None),
            ["project", "deploy", "start", "--source-dir", "src/sfdc/base", "--json"]
        );
        assert!(deploy_args(&dir, Some("scratch@example.com"))
            .windows(2)
            .any(|w| w == ["--target-org", "scratch@example.com"]));
    }

    #[test]
    fn successful_output_is_summarised() {
        let stdout = r#"{"status":0,"result":{"id":"0Af000","files":[{"state":"Created"},{"state":"Changed"}]}}"#;
        let summary = parse_deploy_output(stdout, true).unwrap();
        assert_eq!(summary.deploy_id.as_deref(), Some("0Af000"));
        assert_eq!(summary.component_count, 2);
    }

    #[test]
    fn failing_status_is_an_error() {
        let stdout = r#"{"status":1,"name":"DeployFailed","message":"Deploy failed."}"#;
        let err = parse_deploy_output(stdout, false).unwrap_err();
        assert!(err.to_string().contains("Deploy failed."));

        let err = parse_deploy_output("not json", false).unwrap_err();
        assert!(matches!(err, SfdcError::Command(_)));
    }
}
