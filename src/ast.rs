//! Resolved syntax tree consumed by the code generator.
//!
//! By the time a tree reaches this crate, names have already been resolved:
//! variables are frame-slot indices and calls carry their argument lists.
//! Nothing here is mutated during generation.

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binop {
  Plus,
  Minus,
  Times,
  Div,
}

/// Comparison between the left and right operand of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
  Equals,
  Less,
  Greater,
  LessEq,
  GreaterEq,
}

/// `lhs <comp> rhs`, the test shared by conditionals and both loop forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
  pub lhs: Box<Expr>,
  pub comp: Comp,
  pub rhs: Box<Expr>,
}

impl Cond {
  pub fn new(lhs: Expr, comp: Comp, rhs: Expr) -> Self {
    Self {
      lhs: Box::new(lhs),
      comp,
      rhs: Box::new(rhs),
    }
  }
}

/// Expression tree. Everything in the language is an expression; forms
/// without a meaningful value leave the accumulator unspecified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  IntLiteral {
    value: i64,
  },
  Variable {
    slot: usize,
  },
  Assign {
    slot: usize,
    value: Box<Expr>,
  },
  Binexp {
    lhs: Box<Expr>,
    op: Binop,
    rhs: Box<Expr>,
  },
  If {
    cond: Cond,
    then_body: Box<Expr>,
    else_body: Box<Expr>,
  },
  While {
    cond: Cond,
    body: Box<Expr>,
  },
  /// Runs `body` once, then again until `cond` holds.
  RepeatUntil {
    body: Box<Expr>,
    cond: Cond,
  },
  Invoke {
    name: String,
    args: Vec<Expr>,
  },
  Seq {
    first: Box<Expr>,
    second: Box<Expr>,
  },
  Skip,
  Break,
  Continue,
}

impl Expr {
  pub fn number(value: i64) -> Self {
    Self::IntLiteral { value }
  }

  pub fn var(slot: usize) -> Self {
    Self::Variable { slot }
  }

  pub fn assign(slot: usize, value: Expr) -> Self {
    Self::Assign {
      slot,
      value: Box::new(value),
    }
  }

  pub fn binary(lhs: Expr, op: Binop, rhs: Expr) -> Self {
    Self::Binexp {
      lhs: Box::new(lhs),
      op,
      rhs: Box::new(rhs),
    }
  }

  pub fn if_else(cond: Cond, then_body: Expr, else_body: Expr) -> Self {
    Self::If {
      cond,
      then_body: Box::new(then_body),
      else_body: Box::new(else_body),
    }
  }

  pub fn while_loop(cond: Cond, body: Expr) -> Self {
    Self::While {
      cond,
      body: Box::new(body),
    }
  }

  pub fn repeat_until(body: Expr, cond: Cond) -> Self {
    Self::RepeatUntil {
      body: Box::new(body),
      cond,
    }
  }

  pub fn invoke(name: impl Into<String>, args: Vec<Expr>) -> Self {
    Self::Invoke {
      name: name.into(),
      args,
    }
  }

  pub fn seq(first: Expr, second: Expr) -> Self {
    Self::Seq {
      first: Box::new(first),
      second: Box::new(second),
    }
  }

  /// Right-nested `Seq` chain of `exprs`; an empty list yields `Skip`.
  pub fn block(exprs: impl IntoIterator<Item = Expr>) -> Self {
    let mut exprs: Vec<Expr> = exprs.into_iter().collect();
    let Some(mut node) = exprs.pop() else {
      return Self::Skip;
    };
    while let Some(prev) = exprs.pop() {
      node = Self::seq(prev, node);
    }
    node
  }
}

/// A function-like declaration: entry point, argument count and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  pub id: String,
  pub num_of_args: usize,
  pub body: Expr,
}

impl Declaration {
  pub fn new(id: impl Into<String>, num_of_args: usize, body: Expr) -> Self {
    Self {
      id: id.into(),
      num_of_args,
      body,
    }
  }
}

/// Declarations in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub decls: Vec<Declaration>,
}

impl Program {
  pub fn new(decls: Vec<Declaration>) -> Self {
    Self { decls }
  }
}

impl FromIterator<Declaration> for Program {
  fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn block_nests_to_the_right() {
    let expr = Expr::block([Expr::number(1), Expr::number(2), Expr::number(3)]);
    assert_eq!(
      expr,
      Expr::seq(
        Expr::number(1),
        Expr::seq(Expr::number(2), Expr::number(3))
      )
    );
  }

  #[test]
  fn empty_block_is_skip() {
    assert_eq!(Expr::block(std::iter::empty()), Expr::Skip);
    assert_eq!(Expr::block([Expr::Break]), Expr::Break);
  }
}
