//! Tree-walking evaluator.
//!
//! Both operands are always evaluated, left first. Arithmetic is checked so
//! an overflow surfaces as an error instead of wrapping. The walk keeps its
//! own stacks of pending work and finished operands, so tree depth never
//! touches the call stack.

use crate::error::{DivisionByZeroSnafu, EvalError, OverflowSnafu};
use crate::parser::{AstNode, BinaryOp};

enum Task<'a> {
  Visit(&'a AstNode),
  Apply { op: BinaryOp, loc: Option<usize> },
}

pub fn evaluate(node: &AstNode) -> Result<i64, EvalError> {
  let mut tasks = vec![Task::Visit(node)];
  let mut values: Vec<i64> = Vec::new();

  while let Some(task) = tasks.pop() {
    match task {
      Task::Visit(AstNode::Num { value }) => values.push(*value),
      Task::Visit(AstNode::Binary { op, loc, lhs, rhs }) => {
        tasks.push(Task::Apply { op: *op, loc: *loc });
        tasks.push(Task::Visit(rhs));
        tasks.push(Task::Visit(lhs));
      }
      Task::Apply { op, loc } => {
        let (Some(rhs), Some(lhs)) = (values.pop(), values.pop()) else {
          unreachable!("operator applied before both operands were evaluated");
        };
        values.push(apply(op, loc, lhs, rhs)?);
      }
    }
  }

  let Some(result) = values.pop() else {
    unreachable!("every tree yields one value");
  };
  Ok(result)
}

fn apply(op: BinaryOp, loc: Option<usize>, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
  let result = match op {
    BinaryOp::Add => lhs.checked_add(rhs),
    BinaryOp::Sub => lhs.checked_sub(rhs),
    BinaryOp::Mul => lhs.checked_mul(rhs),
    BinaryOp::Div => {
      if rhs == 0 {
        return DivisionByZeroSnafu.fail();
      }
      // Rust's `/` truncates toward zero, like `idiv`.
      lhs.checked_div(rhs)
    }
  };
  result.ok_or_else(|| OverflowSnafu { op, loc }.build())
}
