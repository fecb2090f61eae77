//! # Command Execution Module / 命令执行模块
//!
//! Runs shell commands with stderr merged into stdout, either to completion
//! (build discovery) or as a live line stream (the command under test).
//!
//! 运行 shell 命令并将 stderr 合并到 stdout，可以运行至结束（构建号发现），
//! 也可以作为实时行流（被测命令）。

use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

/// Builds a command that runs `command_line` through the platform shell with
/// stderr redirected into stdout.
///
/// 构建一个通过平台 shell 运行 `command_line` 的命令，并将 stderr 重定向到 stdout。
pub fn shell_command(command_line: &str) -> Command {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(format!("({command_line}) 2>&1"));
        cmd
    };
    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        // The redirect applies to every command the script runs.
        cmd.arg("-c").arg(format!("exec 2>&1\n{command_line}"));
        cmd
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

/// Runs a shell command to completion and returns its exit status and
/// combined output.
///
/// # Arguments
/// * `command_line` - The command to hand to the shell
///
/// # Returns
/// The `ExitStatus` and the combined stdout/stderr, decoded lossily as UTF-8.
pub async fn capture_output(command_line: &str) -> std::io::Result<(ExitStatus, String)> {
    let mut child = shell_command(command_line).spawn()?;
    let mut raw = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_end(&mut raw).await?;
    }
    let status = child.wait().await?;
    Ok((status, String::from_utf8_lossy(&raw).into_owned()))
}

/// A running command whose combined output is read one line at a time.
/// 一个正在运行的命令，其合并输出按行逐一读取。
#[derive(Debug)]
pub struct LineStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    buffer: Vec<u8>,
}

impl LineStream {
    /// Spawns `command_line` and prepares to read its output.
    pub fn spawn(command_line: &str) -> std::io::Result<Self> {
        let mut child = shell_command(command_line).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("failed to capture command output"))?;
        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            buffer: Vec::with_capacity(256),
        })
    }

    /// Waits for the next line of output. Lines are decoded as UTF-8
    /// (invalid sequences replaced) and trimmed of surrounding whitespace,
    /// including the line terminator. Returns `None` at end of output.
    ///
    /// 等待下一行输出。行按 UTF-8 解码（无效序列被替换），并去除首尾空白，
    /// 包括行终止符。输出结束时返回 `None`。
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buffer.clear();
        let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buffer).trim().to_string()))
    }

    /// Waits for the process to exit.
    pub async fn wait(mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}
