//! 터미널 입출력: 키 입력(마스킹), 모델 선택, 질문 입력, 메시지 출력

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use console::Term;

use crate::app::Prompter;
use crate::session::ErrorReporter;

/// stdin/stdout/stderr 기반 [`Prompter`]
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorReporter for Terminal {
    fn report(&mut self, message: &str) {
        eprintln!("\x1b[1;31mError: {}\x1b[0m", message);
    }
}

impl Prompter for Terminal {
    /// 터미널이면 마스킹해서 받고, 아니면 (파이프 입력 등) stdin에서 한 줄 읽는다.
    fn read_api_key(&mut self) -> Result<Option<String>> {
        let term = Term::stderr();
        term.write_str("Enter your Groq API key: ")
            .context("Failed to write prompt")?;

        // 터미널이 아니면 read_secure_line은 항상 빈 문자열을 준다
        if !term.is_term() {
            return read_line_from(&mut io::stdin().lock());
        }

        match term.read_secure_line() {
            Ok(line) => Ok(Some(line)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e).context("Failed to read API key"),
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !prompt.is_empty() {
            print!("{}", prompt);
            io::stdout().flush().context("Failed to flush stdout")?;
        }
        read_line_from(&mut io::stdin().lock())
    }

    fn warn(&mut self, message: &str) {
        eprintln!("\x1b[1;33m{}\x1b[0m", message);
    }

    fn success(&mut self, message: &str) {
        println!("\x1b[1;32m{}\x1b[0m", message);
    }

    fn show_models(&mut self, models: &[String], current: Option<&str>) {
        println!("\n\x1b[1;36mAvailable models:\x1b[0m");
        for (i, model) in models.iter().enumerate() {
            let marker = if Some(model.as_str()) == current { "*" } else { " " };
            println!("{} {}. {}", marker, i + 1, model);
        }
    }

    fn show_response(&mut self, response: &str) {
        println!("\n{}\n", response);
    }
}

/// 한 줄 읽고 줄바꿈만 뗀다. EOF면 `None`.
pub fn read_line_from<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut input = String::new();
    let read = reader
        .read_line(&mut input)
        .context("Failed to read from stdin")?;

    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn piped_input_reads_lines_then_reports_eof() {
        let mut input = Cursor::new("gsk_abc\r\n  spaced question  \n");
        assert_eq!(read_line_from(&mut input).unwrap().as_deref(), Some("gsk_abc"));
        assert_eq!(read_line_from(&mut input).unwrap().as_deref(), Some("  spaced question  "));
        assert_eq!(read_line_from(&mut input).unwrap(), None);
    }

    #[test]
    fn closed_input_is_eof_not_an_empty_line() {
        let mut input = Cursor::new("");
        assert_eq!(read_line_from(&mut input).unwrap(), None);
    }

    #[test]
    fn blank_line_is_distinct_from_eof() {
        let mut input = Cursor::new("\n");
        assert_eq!(read_line_from(&mut input).unwrap().as_deref(), Some(""));
        assert_eq!(read_line_from(&mut input).unwrap(), None);
    }
}
