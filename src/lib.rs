//! Crate root: wires together the EC1 pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns the grammar and returns the expression AST.
//! - `interp` evaluates the AST directly.
//! - `codegen` lowers the AST into x86-64 AT&T assembly.
//! - `error` holds the diagnostics shared by the other modules.
//!
//! Both back ends consume the same tree and report through the same
//! `CompileError`, so interpreting and compiling a source never diverge in
//! how they read it.

pub mod codegen;
pub mod error;
pub mod interp;
pub mod parser;
pub mod tokenizer;

pub use codegen::{AsmOptions, Instr, Reg};
pub use error::{CompileError, CompileResult, EvalError, LexError, ParseError};
pub use parser::{AstNode, BinaryOp};
pub use tokenizer::{Token, TokenKind};

pub fn tokenize_source(src: &str) -> CompileResult<Vec<Token>> {
  Ok(tokenizer::tokenize(src)?)
}

pub fn parse_source(src: &str) -> CompileResult<AstNode> {
  let tokens = tokenizer::tokenize(src)?;
  Ok(parser::parse(tokens)?)
}

/// Interpret a source string.
pub fn evaluate_source(src: &str) -> CompileResult<i64> {
  let tree = parse_source(src)?;
  Ok(interp::evaluate(&tree)?)
}

/// Compile a source string into a complete AT&T assembly program.
pub fn generate_assembly(src: &str, opts: &AsmOptions) -> CompileResult<String> {
  let tree = parse_source(src)?;
  let code = codegen::generate(&tree);
  Ok(codegen::emit_program(&code, opts))
}
