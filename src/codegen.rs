//! Code generation: lower the resolved AST into RISC-V assembly.
//!
//! The emitter is an accumulator machine. Every expression leaves its value in
//! `a0`; when a second operand is needed the first one is staged in a stack
//! slot and popped into `t1` right before the combining instruction. Frames
//! have a fixed layout, two header words followed by the arguments, and are
//! addressed relative to `s0`.
//!
//! The generator keeps a running count of the bytes the current function has
//! pushed below its reserved slot. `break` and `continue` use it to unwind
//! back to the stack height of their loop before jumping, so every path
//! through a function leaves `sp` where it found it.

use std::collections::HashMap;

use log::{debug, trace};
use snafu::{OptionExt, ensure};

use crate::asm::{
  ACC, AluOp, BREAK_TARGET, BranchCond, CONTINUE_TARGET, EXIT_SYSCALL, FRAME_PTR, Instr,
  RETURN_ADDR, Reg, SCRATCH, STACK_PTR, SYSCALL_REG, WORD_SIZE,
};
use crate::ast::{Binop, Comp, Cond, Declaration, Expr, Program};
use crate::error::{
  ArityMismatchSnafu, BreakOutsideLoopSnafu, CodegenResult, ContinueOutsideLoopSnafu,
  DuplicateFunctionSnafu,
};
use crate::label::{Label, LabelAllocator};

/// Saved return address and saved frame pointer.
const FRAME_HEADER_SLOTS: i64 = 2;

/// Offsets of a loop's staged targets relative to `sp`, once the stack has been
/// unwound to the loop's own height. The exit address is staged first.
const BREAK_SLOT: i64 = 2 * WORD_SIZE;
const CONTINUE_SLOT: i64 = WORD_SIZE;

/// Emit assembly for every declaration of `program`, in order.
///
/// Each call owns its label counters, so generating the same program twice
/// yields identical output.
pub fn generate(program: &Program) -> CodegenResult<Vec<Instr>> {
  debug!("generating {} declaration(s)", program.decls.len());

  let mut codegen = Codegen::new(program)?;
  for decl in &program.decls {
    codegen.emit_decl(decl)?;
  }

  debug!("emitted {} line(s)", codegen.out.len());
  Ok(codegen.out)
}

/// Stack height, in bytes below the function's reserved slot, at which the
/// innermost loop finished staging its jump targets.
#[derive(Debug, Clone, Copy)]
struct LoopFrame {
  depth: i64,
}

struct Codegen<'p> {
  out: Vec<Instr>,
  labels: LabelAllocator,
  arities: HashMap<&'p str, usize>,
  function: &'p str,
  depth: i64,
}

impl<'p> Codegen<'p> {
  fn new(program: &'p Program) -> CodegenResult<Self> {
    let mut arities = HashMap::with_capacity(program.decls.len());
    for decl in &program.decls {
      let previous = arities.insert(decl.id.as_str(), decl.num_of_args);
      ensure!(
        previous.is_none(),
        DuplicateFunctionSnafu {
          function: decl.id.as_str()
        }
      );
    }

    Ok(Self {
      out: Vec::new(),
      labels: LabelAllocator::new(),
      arities,
      function: "",
      depth: 0,
    })
  }

  fn emit(&mut self, instr: Instr) {
    trace!("{instr}");
    self.out.push(instr);
  }

  fn emit_decl(&mut self, decl: &'p Declaration) -> CodegenResult<()> {
    debug!("compiling `{}` ({} argument(s))", decl.id, decl.num_of_args);
    self.function = &decl.id;
    self.depth = 0;
    let frame_size = (FRAME_HEADER_SLOTS + decl.num_of_args as i64) * WORD_SIZE;

    self.emit(Instr::Label(Label::entry(&decl.id)));
    self.emit(Instr::Mv {
      rd: FRAME_PTR,
      rs: STACK_PTR,
    });
    self.emit(Instr::Sw {
      rs: RETURN_ADDR,
      offset: 0,
      base: STACK_PTR,
    });
    self.emit(Instr::adjust_sp(-WORD_SIZE));

    self.emit_expr(&decl.body, None)?;
    debug_assert_eq!(self.depth, 0, "unbalanced stack in `{}`", decl.id);

    self.emit(Instr::Lw {
      rd: RETURN_ADDR,
      offset: WORD_SIZE,
      base: STACK_PTR,
    });
    self.emit(Instr::adjust_sp(frame_size));
    self.emit(Instr::Lw {
      rd: FRAME_PTR,
      offset: 0,
      base: STACK_PTR,
    });
    self.emit(Instr::Li {
      rd: SYSCALL_REG,
      imm: EXIT_SYSCALL,
    });
    self.emit(Instr::Ecall);
    self.emit(Instr::Jr(RETURN_ADDR));
    Ok(())
  }

  /// Emit code leaving the value of `expr` (if it has one) in the accumulator.
  fn emit_expr(&mut self, expr: &Expr, enclosing: Option<LoopFrame>) -> CodegenResult<()> {
    match expr {
      Expr::IntLiteral { value } => self.emit(Instr::Li {
        rd: ACC,
        imm: *value,
      }),
      Expr::Variable { slot } => self.emit(Instr::Lw {
        rd: ACC,
        offset: slot_offset(*slot),
        base: FRAME_PTR,
      }),
      Expr::Assign { slot, value } => {
        self.emit_expr(value, enclosing)?;
        self.emit(Instr::Sw {
          rs: ACC,
          offset: slot_offset(*slot),
          base: FRAME_PTR,
        });
      }
      Expr::Binexp { lhs, op, rhs } => {
        self.emit_operands(lhs, rhs, enclosing)?;
        self.emit(lower_binop(*op));
      }
      Expr::If {
        cond,
        then_body,
        else_body,
      } => {
        let labels = self.labels.next_if();
        self.emit_cond(cond, &labels.then_, enclosing)?;
        self.emit(Instr::Label(labels.else_));
        self.emit_expr(else_body, enclosing)?;
        self.emit(Instr::B(labels.exit.clone()));
        self.emit(Instr::Label(labels.then_));
        self.emit_expr(then_body, enclosing)?;
        self.emit(Instr::Label(labels.exit));
      }
      Expr::While { cond, body } => {
        let labels = self.labels.next_while();
        let frame = self.stage_loop_targets(&labels.exit, &labels.head);
        self.emit(Instr::Label(labels.head.clone()));
        self.emit_cond(cond, &labels.body, Some(frame))?;
        self.emit(Instr::J(labels.exit.clone()));
        self.emit(Instr::Label(labels.body));
        self.emit_expr(body, Some(frame))?;
        self.emit(Instr::J(labels.head));
        self.emit(Instr::Label(labels.exit));
        self.unstage_loop_targets();
      }
      Expr::RepeatUntil { body, cond } => {
        let labels = self.labels.next_repeat();
        let frame = self.stage_loop_targets(&labels.exit, &labels.head);
        self.emit(Instr::Label(labels.head.clone()));
        self.emit_expr(body, Some(frame))?;
        self.emit_cond(cond, &labels.exit, Some(frame))?;
        self.emit(Instr::J(labels.head));
        self.emit(Instr::Label(labels.exit));
        self.unstage_loop_targets();
      }
      Expr::Invoke { name, args } => {
        // Callees outside this program are resolved at link time.
        if let Some(&expected) = self.arities.get(name.as_str()) {
          ensure!(
            expected == args.len(),
            ArityMismatchSnafu {
              function: self.function,
              callee: name.as_str(),
              expected,
              found: args.len(),
            }
          );
        }

        self.push(FRAME_PTR);
        for arg in args.iter().rev() {
          self.emit_expr(arg, enclosing)?;
          self.push(ACC);
        }
        self.emit(Instr::Jal(Label::entry(name)));
        // The callee's epilogue releases the arguments and the saved frame pointer.
        self.depth -= (args.len() as i64 + 1) * WORD_SIZE;
      }
      Expr::Seq { first, second } => {
        self.emit_expr(first, enclosing)?;
        self.emit_expr(second, enclosing)?;
      }
      Expr::Skip => self.emit(Instr::Nop),
      Expr::Break => {
        let frame = enclosing.context(BreakOutsideLoopSnafu {
          function: self.function,
        })?;
        self.emit_loop_jump(frame, BREAK_TARGET, BREAK_SLOT);
      }
      Expr::Continue => {
        let frame = enclosing.context(ContinueOutsideLoopSnafu {
          function: self.function,
        })?;
        self.emit_loop_jump(frame, CONTINUE_TARGET, CONTINUE_SLOT);
      }
    }
    Ok(())
  }

  /// Evaluate `lhs` then `rhs`, leaving lhs in the scratch register and rhs in
  /// the accumulator.
  fn emit_operands(
    &mut self,
    lhs: &Expr,
    rhs: &Expr,
    enclosing: Option<LoopFrame>,
  ) -> CodegenResult<()> {
    self.emit_expr(lhs, enclosing)?;
    self.push(ACC);
    self.emit_expr(rhs, enclosing)?;
    self.pop(SCRATCH);
    Ok(())
  }

  /// Branch to `target` when `cond` holds; fall through otherwise.
  fn emit_cond(
    &mut self,
    cond: &Cond,
    target: &Label,
    enclosing: Option<LoopFrame>,
  ) -> CodegenResult<()> {
    self.emit_operands(&cond.lhs, &cond.rhs, enclosing)?;
    self.emit(lower_comp(cond.comp, target.clone()));
    Ok(())
  }

  fn push(&mut self, reg: Reg) {
    self.emit(Instr::Sw {
      rs: reg,
      offset: 0,
      base: STACK_PTR,
    });
    self.emit(Instr::adjust_sp(-WORD_SIZE));
    self.depth += WORD_SIZE;
  }

  fn pop(&mut self, reg: Reg) {
    self.emit(Instr::Lw {
      rd: reg,
      offset: WORD_SIZE,
      base: STACK_PTR,
    });
    self.emit(Instr::adjust_sp(WORD_SIZE));
    self.depth -= WORD_SIZE;
  }

  /// Load and push the exit and restart addresses of a loop. Emitted before
  /// the loop head so that back-edges never stage them again.
  fn stage_loop_targets(&mut self, exit: &Label, restart: &Label) -> LoopFrame {
    self.emit(Instr::La {
      rd: BREAK_TARGET,
      label: exit.clone(),
    });
    self.push(BREAK_TARGET);
    self.emit(Instr::La {
      rd: CONTINUE_TARGET,
      label: restart.clone(),
    });
    self.push(CONTINUE_TARGET);
    LoopFrame { depth: self.depth }
  }

  fn unstage_loop_targets(&mut self) {
    self.pop(CONTINUE_TARGET);
    self.pop(BREAK_TARGET);
  }

  /// Drop whatever was pushed since the loop staged its targets, reload the
  /// target register from its slot and jump through it.
  fn emit_loop_jump(&mut self, frame: LoopFrame, reg: Reg, slot: i64) {
    let unwind = self.depth - frame.depth;
    if unwind > 0 {
      self.emit(Instr::adjust_sp(unwind));
    }
    self.emit(Instr::Lw {
      rd: reg,
      offset: slot,
      base: STACK_PTR,
    });
    self.emit(Instr::Jr(reg));
  }
}

fn slot_offset(slot: usize) -> i64 {
  slot as i64 * WORD_SIZE
}

/// `t1` holds the left operand, `a0` the right.
fn lower_binop(op: Binop) -> Instr {
  let op = match op {
    Binop::Plus => AluOp::Add,
    Binop::Minus => AluOp::Sub,
    Binop::Times => AluOp::Mul,
    Binop::Div => AluOp::Div,
  };
  Instr::Alu {
    op,
    rd: ACC,
    rs1: SCRATCH,
    rs2: ACC,
  }
}

fn lower_comp(comp: Comp, target: Label) -> Instr {
  let (cond, rs1, rs2) = match comp {
    Comp::Equals => (BranchCond::Eq, ACC, SCRATCH),
    Comp::Less => (BranchCond::Lt, SCRATCH, ACC),
    Comp::Greater => (BranchCond::Gt, SCRATCH, ACC),
    Comp::LessEq => (BranchCond::Le, SCRATCH, ACC),
    Comp::GreaterEq => (BranchCond::Ge, SCRATCH, ACC),
  };
  Instr::Branch {
    cond,
    rs1,
    rs2,
    target,
  }
}
