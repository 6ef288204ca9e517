//! # Command Execution Module / 命令执行模块
//!
//! Spawns external tools and captures their output line by line, optionally
//! echoing it live to the console.
//!
//! 派生外部工具并逐行捕获其输出，可选择实时回显到控制台。

use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::warn;

use crate::infra::t;

/// Spawns a command and captures its stdout and stderr.
/// Both streams are read concurrently and merged line by line, in the
/// order the lines arrive.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
/// * `echo` - Print every line as soon as it is read.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 两个输出流被并发读取，并按到达顺序逐行合并。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
    echo: bool,
) -> (io::Result<ExitStatus>, String) {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let Some(stdout) = child.stdout.take() else {
        return (
            Err(io::Error::other(t!("command.capture_stdout_failed").to_string())),
            String::new(),
        );
    };
    let Some(stderr) = child.stderr.take() else {
        return (
            Err(io::Error::other(t!("command.capture_stderr_failed").to_string())),
            String::new(),
        );
    };

    let stdout_lines = LinesStream::new(BufReader::new(stdout).lines());
    let stderr_lines = LinesStream::new(BufReader::new(stderr).lines());
    let mut lines = stdout_lines.merge(stderr_lines);

    let mut output = String::new();
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => {
                if echo {
                    println!("{line}");
                }
                output.push_str(&line);
                output.push('\n');
            }
            // Keep draining, otherwise the child can block on a full pipe.
            Err(e) => warn!(error = %e, "unreadable output line"),
        }
    }

    (child.wait().await, output)
}

/// Renders a program and its arguments as a single shell line. Words made of
/// plain characters are kept verbatim (so `--features a,b` stays readable),
/// anything else is shell-quoted.
///
/// 将程序及其参数渲染为单行 shell 命令。仅包含普通字符的单词保持原样，
/// 其他单词会经过 shell 引用。
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ",._+:@/=-".contains(c));
    if plain {
        return word.to_string();
    }
    // Words no shell can carry (a NUL byte) are shown escaped.
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| format!("{word:?}"))
}
