//! Recursive-descent parser producing the expression AST.
//!
//! EC1 has a single non-terminal:
//!
//! ```text
//! expr := number | "(" expr op expr ")"
//! op   := "+" | "-" | "*" | "/"
//! ```
//!
//! The first token decides the production, so one token of lookahead is
//! enough and the parser never backtracks. The descent runs on an explicit
//! stack of open groups rather than the call stack, so nesting depth is only
//! bounded by memory. The cursor lives in a `TokenStream`.

use std::fmt;
use std::mem;

use crate::error::{IntegerOutOfRangeSnafu, ParseError, TrailingInputSnafu, UnexpectedSnafu};
use crate::tokenizer::{Token, TokenKind};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  fn from_kind(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Plus => Some(Self::Add),
      TokenKind::Minus => Some(Self::Sub),
      TokenKind::Star => Some(Self::Mul),
      TokenKind::Slash => Some(Self::Div),
      _ => None,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
    }
  }

  /// Whether swapping the operands leaves the result unchanged.
  pub fn is_commutative(self) -> bool {
    matches!(self, Self::Add | Self::Mul)
  }
}

impl fmt::Display for BinaryOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

/// Expression tree produced by the parser. Each node owns its children.
///
/// Trees may be nested far deeper than the call stack allows, so every walk
/// over them, including `Drop`, `PartialEq` and `Debug`, uses an explicit
/// work stack.
pub enum AstNode {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    /// Offset of the operator token in the source, if the node came from one.
    loc: Option<usize>,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  /// Build an operator node that has no source token behind it.
  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      loc: None,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn binary_at(op: BinaryOp, loc: usize, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      loc: Some(loc),
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  /// Draw the tree with box characters, one node per line.
  pub fn render_tree(&self) -> String {
    let mut out = String::new();
    let mut pending = vec![(self, String::new(), true)];

    while let Some((node, prefix, is_last)) = pending.pop() {
      out.push_str(&prefix);
      out.push_str(if is_last { "└── " } else { "├── " });

      match node {
        AstNode::Num { value } => {
          out.push_str(&format!("Constant: {value}\n"));
        }
        AstNode::Binary { op, lhs, rhs, .. } => {
          out.push_str(&format!("Operator: {op}\n"));
          let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
          // Right goes first so the left child is drawn first.
          pending.push((&**rhs, child_prefix.clone(), true));
          pending.push((&**lhs, child_prefix, false));
        }
      }
    }
    out
  }

  /// Detach both children, leaving cheap literals in their place.
  fn take_children(&mut self) -> Option<(AstNode, AstNode)> {
    match self {
      AstNode::Num { .. } => None,
      AstNode::Binary { lhs, rhs, .. } => Some((
        mem::replace(lhs.as_mut(), AstNode::number(0)),
        mem::replace(rhs.as_mut(), AstNode::number(0)),
      )),
    }
  }
}

impl Drop for AstNode {
  fn drop(&mut self) {
    let mut pending = Vec::new();
    pending.extend(self.take_children());
    // Every node popped here has had its children detached, so its own
    // drop only sees literals.
    while let Some((mut lhs, mut rhs)) = pending.pop() {
      pending.extend(lhs.take_children());
      pending.extend(rhs.take_children());
    }
  }
}

impl PartialEq for AstNode {
  fn eq(&self, other: &Self) -> bool {
    let mut pending = vec![(self, other)];
    while let Some(pair) = pending.pop() {
      match pair {
        (AstNode::Num { value: a }, AstNode::Num { value: b }) => {
          if a != b {
            return false;
          }
        }
        (
          AstNode::Binary {
            op: op_a,
            loc: loc_a,
            lhs: lhs_a,
            rhs: rhs_a,
          },
          AstNode::Binary {
            op: op_b,
            loc: loc_b,
            lhs: lhs_b,
            rhs: rhs_b,
          },
        ) => {
          if op_a != op_b || loc_a != loc_b {
            return false;
          }
          pending.push((&**rhs_a, &**rhs_b));
          pending.push((&**lhs_a, &**lhs_b));
        }
        _ => return false,
      }
    }
    true
  }
}

impl Eq for AstNode {}

impl fmt::Debug for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    enum Piece<'a> {
      Node(&'a AstNode),
      Text(&'static str),
    }

    let mut pending = vec![Piece::Node(self)];
    while let Some(piece) = pending.pop() {
      match piece {
        Piece::Text(text) => f.write_str(text)?,
        Piece::Node(AstNode::Num { value }) => write!(f, "Num({value})")?,
        Piece::Node(AstNode::Binary { op, lhs, rhs, .. }) => {
          write!(f, "Binary({op}, ")?;
          pending.push(Piece::Text(")"));
          pending.push(Piece::Node(&**rhs));
          pending.push(Piece::Text(", "));
          pending.push(Piece::Node(&**lhs));
        }
      }
    }
    Ok(())
  }
}

/// Parse a complete expression; anything left over besides `Eof` is an error.
pub fn parse(tokens: Vec<Token>) -> Result<AstNode, ParseError> {
  let mut stream = TokenStream::new(tokens);
  let node = parse_expr(&mut stream)?;

  if !stream.is_eof() {
    let (loc, lexeme) = stream.describe_current();
    return TrailingInputSnafu { loc, lexeme }.fail();
  }

  Ok(node)
}

/// A `(` whose operands are still being read.
enum Open {
  AwaitingOperator,
  AwaitingRhs { lhs: AstNode, op: BinaryOp, loc: usize },
}

fn parse_expr(stream: &mut TokenStream) -> Result<AstNode, ParseError> {
  let mut open: Vec<Open> = Vec::new();

  loop {
    // Descend through opening parens down to the next number.
    let mut node = loop {
      if let Some(value) = stream.get_number()? {
        break AstNode::number(value);
      }
      stream.skip(TokenKind::LeftParen, "a number or '('")?;
      open.push(Open::AwaitingOperator);
    };

    // Climb back up, closing every group the new operand completes.
    loop {
      match open.pop() {
        None => return Ok(node),
        Some(Open::AwaitingOperator) => {
          let (op, loc) = stream.get_operator()?;
          open.push(Open::AwaitingRhs { lhs: node, op, loc });
          break;
        }
        Some(Open::AwaitingRhs { lhs, op, loc }) => {
          stream.skip(TokenKind::RightParen, "')'")?;
          node = AstNode::binary_at(op, loc, lhs, node);
        }
      }
    }
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenStream {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Kind, offset and text of the current token. Running off the end of a
  /// vector without an `Eof` marker reads as end of input.
  fn describe_current(&self) -> (usize, String) {
    match self.peek() {
      Some(token) => (token.loc, token.lexeme.clone()),
      None => (self.end_loc(), String::new()),
    }
  }

  fn end_loc(&self) -> usize {
    self.tokens.last().map_or(0, Token::end)
  }

  fn unexpected<T>(&self, expected: &'static str) -> Result<T, ParseError> {
    let found = self.peek().map_or(TokenKind::Eof, |token| token.kind);
    let (loc, lexeme) = self.describe_current();
    UnexpectedSnafu {
      loc,
      expected,
      found,
      lexeme,
    }
    .fail()
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.peek().is_some_and(|token| token.kind == kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
    if self.equal(kind) {
      Ok(())
    } else {
      self.unexpected(expected)
    }
  }

  /// Consume a number token if one is next and return its value.
  fn get_number(&mut self) -> Result<Option<i64>, ParseError> {
    let Some(token) = self.peek().filter(|token| token.kind == TokenKind::Number) else {
      return Ok(None);
    };

    let value = token.lexeme.parse::<i64>().map_err(|_| {
      IntegerOutOfRangeSnafu {
        loc: token.loc,
        lexeme: token.lexeme.clone(),
      }
      .build()
    })?;
    self.pos += 1;
    Ok(Some(value))
  }

  /// Consume one of the four operator tokens, returning it with its offset.
  fn get_operator(&mut self) -> Result<(BinaryOp, usize), ParseError> {
    if let Some(token) = self.peek()
      && let Some(op) = BinaryOp::from_kind(token.kind)
    {
      let loc = token.loc;
      self.pos += 1;
      return Ok((op, loc));
    }
    self.unexpected("an operator ('+', '-', '*' or '/')")
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof) | None)
  }
}
