//! Diagnostics shared by every stage of the pipeline.
//!
//! Each stage owns a small error enum and stops at the first problem it
//! finds. `CompileError` is the one type the library hands back to callers;
//! `render` turns it into a caret diagnostic pointing at the offending byte.

use snafu::Snafu;

use crate::parser::BinaryOp;
use crate::tokenizer::TokenKind;

pub type CompileResult<T> = Result<T, CompileError>;

/// Failure raised while scanning characters into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LexError {
  #[snafu(display("lexical error at position {loc}: unexpected character '{ch}'"))]
  UnexpectedChar { loc: usize, ch: char },
}

/// Failure raised while building the tree from the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
  #[snafu(display(
    "syntax error at position {loc}: expected {expected}, but found {found} '{lexeme}'"
  ))]
  Unexpected {
    loc: usize,
    expected: &'static str,
    found: TokenKind,
    lexeme: String,
  },
  #[snafu(display(
    "syntax error at position {loc}: unexpected '{lexeme}' after the end of the expression"
  ))]
  TrailingInput { loc: usize, lexeme: String },
  #[snafu(display(
    "syntax error at position {loc}: integer literal '{lexeme}' does not fit in 64 bits"
  ))]
  IntegerOutOfRange { loc: usize, lexeme: String },
}

/// Failure raised by the tree-walking interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EvalError {
  #[snafu(display("runtime error: division by zero"))]
  DivisionByZero,
  #[snafu(display(
    "runtime error: '{op}'{} overflows a 64-bit integer",
    loc.map(|loc| format!(" at position {loc}")).unwrap_or_default()
  ))]
  Overflow { op: BinaryOp, loc: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CompileError {
  #[snafu(context(false), display("{source}"))]
  Lex { source: LexError },
  #[snafu(context(false), display("{source}"))]
  Parse { source: ParseError },
  #[snafu(context(false), display("{source}"))]
  Eval { source: EvalError },
}

impl LexError {
  pub fn loc(&self) -> usize {
    match self {
      Self::UnexpectedChar { loc, .. } => *loc,
    }
  }
}

impl ParseError {
  pub fn loc(&self) -> usize {
    match self {
      Self::Unexpected { loc, .. }
      | Self::TrailingInput { loc, .. }
      | Self::IntegerOutOfRange { loc, .. } => *loc,
    }
  }
}

impl CompileError {
  /// Byte offset of the problem in the source, if the error has one.
  pub fn loc(&self) -> Option<usize> {
    match self {
      Self::Lex { source } => Some(source.loc()),
      Self::Parse { source } => Some(source.loc()),
      Self::Eval {
        source: EvalError::Overflow { loc, .. },
      } => *loc,
      Self::Eval {
        source: EvalError::DivisionByZero,
      } => None,
    }
  }

  /// Format the error against the source it came from, marking the
  /// offending byte with a caret on the line below the quoted source.
  pub fn render(&self, source: &str) -> String {
    let Some(loc) = self.loc() else {
      return self.to_string();
    };

    // Only the line holding the error is quoted.
    let safe_loc = loc.min(source.len());
    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let line = &source[line_start..line_end];

    let expr_line = format!("'{line}'");
    let char_offset = source[line_start..safe_loc].chars().count() + 1; // account for opening quote
    let marker = format!("{}^", " ".repeat(char_offset));
    format!("{expr_line}\n{marker} {self}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_points_at_offending_byte() {
    let err = CompileError::from(LexError::UnexpectedChar { loc: 2, ch: '$' });
    let rendered = err.render("1 $ 2");
    assert_eq!(
      rendered,
      "'1 $ 2'\n   ^ lexical error at position 2: unexpected character '$'"
    );
  }

  #[test]
  fn render_quotes_only_the_failing_line() {
    let err = CompileError::from(ParseError::TrailingInput {
      loc: 6,
      lexeme: "9".to_string(),
    });
    let rendered = err.render("(1+2)\n9\n");
    assert_eq!(
      rendered.lines().next(),
      Some("'9'"),
      "unexpected rendering:\n{rendered}"
    );
    assert_eq!(rendered.lines().nth(1).map(|l| l.find('^')), Some(Some(1)));
  }

  #[test]
  fn render_without_location_is_plain_message() {
    let err = CompileError::from(EvalError::DivisionByZero);
    assert_eq!(err.loc(), None);
    assert_eq!(err.render("(1 / 0)"), "runtime error: division by zero");
  }

  #[test]
  fn marker_is_clamped_to_source_end() {
    let err = CompileError::from(ParseError::Unexpected {
      loc: 99,
      expected: "')'",
      found: TokenKind::Eof,
      lexeme: String::new(),
    });
    let rendered = err.render("(1");
    assert!(rendered.starts_with("'(1'\n   ^ "), "{rendered}");
  }

  #[test]
  fn overflow_without_source_position_has_no_caret() {
    let err = CompileError::from(EvalError::Overflow {
      op: BinaryOp::Mul,
      loc: None,
    });
    assert_eq!(err.loc(), None);
    assert_eq!(
      err.render("(1 * 2)"),
      "runtime error: '*' overflows a 64-bit integer"
    );
  }

  #[test]
  fn overflow_with_source_position_is_marked() {
    let err = CompileError::from(EvalError::Overflow {
      op: BinaryOp::Mul,
      loc: Some(3),
    });
    assert_eq!(
      err.render("(1 * 2)"),
      "'(1 * 2)'\n    ^ runtime error: '*' at position 3 overflows a 64-bit integer"
    );
  }
}
