//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The scan is a single left-to-right pass with no backtracking. EC1 only
//! has single-character punctuators and runs of decimal digits, so the
//! tokenizer never needs more than the current character to decide.

use std::fmt;

use crate::error::{LexError, UnexpectedCharSnafu};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  LeftParen,
  RightParen,
  Plus,
  Minus,
  Star,
  Slash,
  Number,
  Eof,
}

impl TokenKind {
  /// Kind of a one-character punctuator, if `c` is one.
  fn punctuator(c: char) -> Option<Self> {
    match c {
      '(' => Some(Self::LeftParen),
      ')' => Some(Self::RightParen),
      '+' => Some(Self::Plus),
      '-' => Some(Self::Minus),
      '*' => Some(Self::Star),
      '/' => Some(Self::Slash),
      _ => None,
    }
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::LeftParen => "LeftParen",
      Self::RightParen => "RightParen",
      Self::Plus => "Plus",
      Self::Minus => "Minus",
      Self::Star => "Star",
      Self::Slash => "Slash",
      Self::Number => "Number",
      Self::Eof => "EOF",
    };
    f.write_str(name)
  }
}

/// A classified slice of the source. `loc` is the byte offset of its first
/// character; the `Eof` marker has an empty lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
  pub loc: usize,
}

impl Token {
  pub fn new(kind: TokenKind, lexeme: impl Into<String>, loc: usize) -> Self {
    Self {
      kind,
      lexeme: lexeme.into(),
      loc,
    }
  }

  /// Offset one past the last byte of the lexeme.
  pub fn end(&self) -> usize {
    self.loc + self.lexeme.len()
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<{}, '{}', {}>", self.kind, self.lexeme, self.loc)
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
///
/// Scanning stops at the first character that is neither whitespace, a
/// punctuator nor a digit; no tokens are returned in that case.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Number, &input[start..i], start));
      continue;
    }

    // Anything else is decoded as a full character so non-ASCII blanks are
    // skipped and non-ASCII garbage is reported intact.
    let Some(ch) = input[i..].chars().next() else {
      break;
    };

    if ch.is_whitespace() {
      i += ch.len_utf8();
      continue;
    }

    if let Some(kind) = TokenKind::punctuator(ch) {
      tokens.push(Token::new(kind, &input[i..i + 1], i));
      i += 1;
      continue;
    }

    return UnexpectedCharSnafu { loc: i, ch }.fail();
  }

  tokens.push(Token::new(TokenKind::Eof, "", input.len()));
  Ok(tokens)
}
