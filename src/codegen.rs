//! Code generation: lower the parsed AST into AT&T x86-64 assembly.
//!
//! The emitter uses a stack scheme with two scratch registers. Every
//! fragment leaves its value in `%rax` (primary). A binary node saves the
//! left value with a push while the right operand is computed, then pops it
//! into `%rbx` (secondary) and combines the two into `%rax`. Nested
//! fragments are balanced, so the pop always sees the value pushed by the
//! same node no matter how deep the tree is.

use std::fmt;

use crate::parser::{AstNode, BinaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Rax,
  Rbx,
}

impl Reg {
  pub const PRIMARY: Reg = Reg::Rax;
  pub const SECONDARY: Reg = Reg::Rbx;
}

impl fmt::Display for Reg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Rax => f.write_str("%rax"),
      Self::Rbx => f.write_str("%rbx"),
    }
  }
}

/// One target instruction. Two-operand forms follow AT&T order: `dst` is
/// both an input and the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
  MovImm { value: i64, dst: Reg },
  Push(Reg),
  Pop(Reg),
  Xchg(Reg, Reg),
  Add { src: Reg, dst: Reg },
  Sub { src: Reg, dst: Reg },
  Imul { src: Reg, dst: Reg },
  /// Sign-extend `%rax` into `%rdx:%rax`.
  Cqo,
  /// Divide `%rdx:%rax` by the register; quotient in `%rax`.
  Idiv(Reg),
}

impl fmt::Display for Instr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MovImm { value, dst } => write!(f, "mov ${value}, {dst}"),
      Self::Push(reg) => write!(f, "push {reg}"),
      Self::Pop(reg) => write!(f, "pop {reg}"),
      Self::Xchg(a, b) => write!(f, "xchg {a}, {b}"),
      Self::Add { src, dst } => write!(f, "add {src}, {dst}"),
      Self::Sub { src, dst } => write!(f, "sub {src}, {dst}"),
      Self::Imul { src, dst } => write!(f, "imul {src}, {dst}"),
      Self::Cqo => f.write_str("cqo"),
      Self::Idiv(reg) => write!(f, "idiv {reg}"),
    }
  }
}

/// Lower a tree into its instruction sequence. Never fails: overflow and
/// division by zero are left to the generated program.
pub fn generate(node: &AstNode) -> Vec<Instr> {
  let mut code = Vec::new();
  emit_expr(node, &mut code);
  code
}

enum Step<'a> {
  Expr(&'a AstNode),
  Emit(Instr),
  Combine(BinaryOp),
}

/// Walks the tree with an explicit work list.
fn emit_expr(node: &AstNode, code: &mut Vec<Instr>) {
  let mut steps = vec![Step::Expr(node)];

  while let Some(step) = steps.pop() {
    match step {
      Step::Expr(AstNode::Num { value }) => code.push(Instr::MovImm {
        value: *value,
        dst: Reg::PRIMARY,
      }),
      Step::Expr(AstNode::Binary { op, lhs, rhs, .. }) => {
        // Pushed in reverse of execution order.
        steps.push(Step::Combine(*op));
        steps.push(Step::Emit(Instr::Pop(Reg::SECONDARY)));
        steps.push(Step::Expr(rhs));
        steps.push(Step::Emit(Instr::Push(Reg::PRIMARY)));
        steps.push(Step::Expr(lhs));
      }
      Step::Emit(instr) => code.push(instr),
      Step::Combine(op) => emit_op(op, code),
    }
  }
}

/// Combine the operands. On entry the left value is in the secondary
/// register and the right value in the primary one.
fn emit_op(op: BinaryOp, code: &mut Vec<Instr>) {
  let (primary, secondary) = (Reg::PRIMARY, Reg::SECONDARY);

  // After the swap primary holds left, secondary holds right.
  if !op.is_commutative() {
    code.push(Instr::Xchg(secondary, primary));
  }

  match op {
    BinaryOp::Add => code.push(Instr::Add {
      src: secondary,
      dst: primary,
    }),
    BinaryOp::Sub => code.push(Instr::Sub {
      src: secondary,
      dst: primary,
    }),
    BinaryOp::Mul => code.push(Instr::Imul {
      src: secondary,
      dst: primary,
    }),
    BinaryOp::Div => {
      code.push(Instr::Cqo);
      code.push(Instr::Idiv(secondary));
    }
  }
}

/// Symbols and files the generated program expects from its runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmOptions {
  pub entry: String,
  pub print_routine: String,
  pub exit_routine: String,
  pub runtime_include: String,
}

impl Default for AsmOptions {
  fn default() -> Self {
    Self {
      entry: "_start".to_string(),
      print_routine: "imprime_num".to_string(),
      exit_routine: "sair".to_string(),
      runtime_include: "runtime.s".to_string(),
    }
  }
}

/// Wrap an instruction sequence into a complete assembly file: entry
/// symbol, the expression code, then calls into the runtime to print the
/// value in `%rax` and exit.
pub fn emit_program(code: &[Instr], opts: &AsmOptions) -> String {
  let mut asm = String::new();
  asm.push_str(".section .text\n");
  asm.push_str(&format!(".globl {}\n\n", opts.entry));
  asm.push_str(&format!("{}:\n", opts.entry));
  for instr in code {
    asm.push_str(&format!("  {instr}\n"));
  }
  asm.push('\n');
  asm.push_str(&format!("  call {}\n", opts.print_routine));
  asm.push_str(&format!("  call {}\n", opts.exit_routine));
  asm.push('\n');
  asm.push_str(&format!(".include \"{}\"\n", opts.runtime_include));
  asm
}
