use std::io::{self, BufRead, ErrorKind, StdinLock, Stdout, Write};

use anyhow::{Context, Result};
use thiserror::Error;

/// ユーザーが入力を中断したことを表す。
///
/// このエラーで終了した場合はワークログを保存せず、エラーメッセージも表示しない。
#[derive(Debug, Error)]
#[error("aborted by user")]
pub struct Abort;

/// ユーザーへの問い合わせを行うためのtrait。
pub trait Prompt {
    /// 質問を表示して1行読み込む。入力が終わっている場合は`Abort`を返す。
    fn ask(&mut self, question: &str) -> Result<String>;

    /// 入力を画面に表示せずに1行読み込む。パスワードの入力に使う。
    fn ask_hidden(&mut self, question: &str) -> Result<String>;

    /// メッセージを1行表示する。
    fn say(&mut self, message: &str) -> Result<()>;
}

/// 標準入出力などを使って問い合わせを行う。
pub struct ConsolePrompt<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    /// 端末から直接パスワードを読み込むかどうか。
    terminal: bool,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// 新しい`ConsolePrompt`を返す。
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            terminal: false,
        }
    }
}

impl ConsolePrompt<StdinLock<'static>, Stdout> {
    /// 標準入出力を使う`ConsolePrompt`を返す。
    pub fn stdio() -> Self {
        Self {
            terminal: true,
            ..Self::new(io::stdin().lock(), io::stdout())
        }
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{}", question).context("Failed to write prompt")?;
        self.writer.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            return Err(Abort.into());
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn ask_hidden(&mut self, question: &str) -> Result<String> {
        if !self.terminal {
            return self.ask(question);
        }

        match rpassword::prompt_password(question) {
            Ok(answer) => Ok(answer),
            Err(err) if matches!(err.kind(), ErrorKind::UnexpectedEof | ErrorKind::Interrupted) => {
                Err(Abort.into())
            }
            Err(err) => Err(err).context("Failed to read password"),
        }
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{}", message).context("Failed to write message")
    }
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Abort, ConsolePrompt, Prompt};

    #[test]
    fn test_ask() {
        let mut output = Vec::new();
        let mut prompt = ConsolePrompt::new(Cursor::new("design doc\r\nnext\n"), &mut output);

        assert_eq!(prompt.ask("Task description: ").unwrap(), "design doc");
        assert_eq!(prompt.ask("Task description: ").unwrap(), "next");
        drop(prompt);

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Task description: Task description: "
        );
    }

    /// 入力が終わっている場合は`Abort`になることを確認する。
    #[test]
    fn test_ask_at_end_of_input() {
        let mut prompt = ConsolePrompt::new(Cursor::new(""), Vec::new());

        let err = prompt.ask("Which description: ").unwrap_err();

        assert!(err.is::<Abort>());
    }

    /// 端末でない入力からはパスワードも通常の1行として読み込み、終わっていれば`Abort`になることを確認する。
    #[test]
    fn test_ask_hidden_without_terminal() {
        let mut output = Vec::new();
        let mut prompt = ConsolePrompt::new(Cursor::new("secret\n"), &mut output);

        assert_eq!(prompt.ask_hidden("Jira Password: ").unwrap(), "secret");
        assert!(prompt.ask_hidden("Jira Password: ").unwrap_err().is::<Abort>());
    }

    #[test]
    fn test_say() {
        let mut output = Vec::new();
        let mut prompt = ConsolePrompt::new(Cursor::new(""), &mut output);

        prompt.say("[0] coding").unwrap();
        drop(prompt);

        assert_eq!(String::from_utf8(output).unwrap(), "[0] coding\n");
    }
}
