//! 外部プロセスの実行
//!
//! - ホスト: ジェネレータをプラットフォームのシェル経由で実行し、標準出力をそのままテストケースとして使う
//! - 全員: テストケースを一時ファイルに書き出し、そのパスを唯一の引数としてテスト対象プログラムを実行する
//!
//! テスト対象プログラムの標準出力と標準エラー出力は、到着順に 1 つのバイト列へまとめます。
//! 終了コードは見ません。起動に失敗した場合だけがエラーです。
//! 一時ファイルは [`tempfile::TempPath`] の drop で、成功時も起動失敗時も削除されます。

use std::{io::Write, path::Path, process::Stdio};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    sync::mpsc,
};

use crate::error::ExecutionError;

/// 一時ファイル名の接頭辞
const INPUT_FILE_PREFIX: &str = "crossfire-input-";
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// ジェネレータを実行してテストケースを得る
pub async fn generate_test_case(script: &str) -> Result<String, ExecutionError> {
    let output = shell_command(script)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ExecutionError::GenerationFailure(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExecutionError::GenerationFailure(format!(
            "{}: {}",
            output.status,
            stderr.trim()
        )));
    }

    tracing::debug!("Generated test case ({} bytes)", output.stdout.len());
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", script]);
    command
}

#[cfg(not(windows))]
fn shell_command(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", script]);
    command
}

/// テストケースを与えてテスト対象プログラムを実行し、標準出力と標準エラー出力をまとめて返す
pub async fn run_program(program: &Path, input: &str) -> Result<Vec<u8>, ExecutionError> {
    let mut file = tempfile::Builder::new()
        .prefix(INPUT_FILE_PREFIX)
        .suffix(".txt")
        .tempfile()?;
    file.write_all(input.as_bytes())?;
    file.flush()?;
    // ファイルハンドルを閉じ、パスだけを保持する（drop で削除される）
    let input_path = file.into_temp_path();

    let mut child = Command::new(program)
        .arg(&*input_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecutionError::ExecutionStartFailure {
            program: program.display().to_string(),
            reason: e.to_string(),
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        forward(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward(stderr, tx.clone());
    }
    drop(tx);

    let mut combined = Vec::new();
    while let Some(chunk) = rx.recv().await {
        combined.extend_from_slice(&chunk);
    }

    let status = child.wait().await?;
    tracing::debug!(
        "Program exited with {} ({} bytes of output)",
        status,
        combined.len()
    );

    if let Err(e) = input_path.close() {
        tracing::warn!("Failed to remove test case file: {}", e);
    }

    Ok(combined)
}

/// パイプから読んだ塊をそのままチャネルへ流す
fn forward<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read program output: {}", e);
                    break;
                }
            }
        }
    });
}
