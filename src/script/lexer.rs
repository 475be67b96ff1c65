//! Shell-style tokenization of script lines.
//!
//! Lines split on whitespace with POSIX quoting: single quotes group
//! literally, double quotes group with backslash escapes for `"` and `\`,
//! and a bare backslash escapes the next character. Adjacent quoted and
//! unquoted segments fuse into a single token, so `wel"come "here` is the
//! token `welcome here`. `#` is not special inside a line; full-line
//! comments are stripped by the parser before tokenization.

use thiserror::Error;

/// Tokenization failures for a single line.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A quoted segment was never closed.
    #[error("no closing quotation")]
    UnclosedQuote,
    /// The line ended immediately after an escape character.
    #[error("no character after escape")]
    DanglingEscape,
}

/// Split one line into shell-style tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>, LexError> {
    Scanner::new(line).run()
}

/// Strip the trailing commas scripts use as visual separators.
pub fn tidy(token: &str) -> &str {
    token.trim_end_matches(',')
}

struct Scanner {
    chars: Vec<char>,
    index: usize,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            index: 0,
        }
    }

    fn run(mut self) -> Result<Vec<String>, LexError> {
        let mut tokens = Vec::new();
        loop {
            while let Some(ch) = self.current() {
                if !ch.is_whitespace() {
                    break;
                }
                self.advance();
            }
            if self.eof() {
                return Ok(tokens);
            }
            tokens.push(self.token()?);
        }
    }

    fn token(&mut self) -> Result<String, LexError> {
        let mut buf = String::new();
        while let Some(ch) = self.current() {
            match ch {
                ch if ch.is_whitespace() => break,
                '\'' => {
                    self.advance();
                    self.single_quoted(&mut buf)?;
                }
                '"' => {
                    self.advance();
                    self.double_quoted(&mut buf)?;
                }
                '\\' => {
                    self.advance();
                    let escaped = self.current().ok_or(LexError::DanglingEscape)?;
                    self.advance();
                    buf.push(escaped);
                }
                _ => {
                    buf.push(ch);
                    self.advance();
                }
            }
        }
        Ok(buf)
    }

    fn single_quoted(&mut self, buf: &mut String) -> Result<(), LexError> {
        while let Some(ch) = self.current() {
            self.advance();
            if ch == '\'' {
                return Ok(());
            }
            buf.push(ch);
        }
        Err(LexError::UnclosedQuote)
    }

    fn double_quoted(&mut self, buf: &mut String) -> Result<(), LexError> {
        while let Some(ch) = self.current() {
            self.advance();
            match ch {
                '"' => return Ok(()),
                '\\' => {
                    let escaped = self.current().ok_or(LexError::DanglingEscape)?;
                    self.advance();
                    // Only the quote and the backslash are escapable here;
                    // any other pair keeps its backslash.
                    if escaped != '"' && escaped != '\\' {
                        buf.push('\\');
                    }
                    buf.push(escaped);
                }
                _ => buf.push(ch),
            }
        }
        Err(LexError::UnclosedQuote)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn advance(&mut self) {
        if self.index < self.chars.len() {
            self.index += 1;
        }
    }

    fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }
}
