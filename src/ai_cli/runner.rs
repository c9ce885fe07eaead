use crate::ai_provider::AiProvider;
use crate::error::{ImportError, Result};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// AI CLIを1回実行して標準出力を返す
pub async fn run_ai_cli(
    provider: AiProvider,
    model: Option<&str>,
    prompt: &str,
    timeout: Duration,
) -> Result<String> {
    let command = provider.command_name();

    // Windowsではcmd /c経由（改行・引用符はcmdが解釈するため潰す）
    #[cfg(windows)]
    let mut cmd = {
        let flat = prompt.replace('\n', " ").replace('"', "\\\"");
        let mut cmd = Command::new("cmd");
        cmd.arg("/c").arg(command).args(provider.args(&flat, model));
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new(command);
        cmd.args(provider.args(prompt, model));
        cmd
    };

    cmd.kill_on_drop(true);

    debug!(provider = command, prompt_len = prompt.len(), "AI CLI呼び出し");

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            warn!(provider = command, ?timeout, "AI CLIがタイムアウト");
            ImportError::CliExecution(format!("{} がタイムアウトしました ({}秒)", command, timeout.as_secs()))
        })?
        .map_err(|e| ImportError::CliExecution(format!("{} 実行エラー: {}", command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ImportError::CliExecution(format!(
            "{} failed (code {:?}): {}",
            command,
            output.status.code(),
            stderr.trim()
        )));
    }

    let response = String::from_utf8_lossy(&output.stdout).to_string();
    debug!(
        provider = command,
        response_len = response.len(),
        preview = %response.chars().take(200).collect::<String>(),
        "AI CLI応答"
    );

    Ok(response)
}
