//! Target instruction set: a RISC-V subset printed one instruction per line.
//!
//! Operands are separated by single spaces (`add a0 t1 a0`), memory operands
//! use `offset(base)` and labels are printed with a trailing colon.

use std::fmt;

use crate::label::Label;

/// Bytes per stack slot / frame word.
pub const WORD_SIZE: i64 = 4;

/// Holds the value of the expression just compiled.
pub const ACC: Reg = Reg::A0;
/// Receives the staged left operand of a binary operation or comparison.
pub const SCRATCH: Reg = Reg::T1;
/// Loop-exit address for `break`.
pub const BREAK_TARGET: Reg = Reg::T2;
/// Loop-restart address for `continue`.
pub const CONTINUE_TARGET: Reg = Reg::T3;
pub const FRAME_PTR: Reg = Reg::S0;
pub const STACK_PTR: Reg = Reg::Sp;
pub const RETURN_ADDR: Reg = Reg::Ra;
/// Syscall number register and the value that requests program exit.
pub const SYSCALL_REG: Reg = Reg::A7;
pub const EXIT_SYSCALL: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
  A0,
  A7,
  T1,
  T2,
  T3,
  S0,
  Sp,
  Ra,
}

impl Reg {
  pub fn name(self) -> &'static str {
    match self {
      Self::A0 => "a0",
      Self::A7 => "a7",
      Self::T1 => "t1",
      Self::T2 => "t2",
      Self::T3 => "t3",
      Self::S0 => "s0",
      Self::Sp => "sp",
      Self::Ra => "ra",
    }
  }
}

impl fmt::Display for Reg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Three-register arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl AluOp {
  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Sub => "sub",
      Self::Mul => "mul",
      Self::Div => "div",
    }
  }
}

/// Conditions for `b<cond> rs1 rs2 label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
  Eq,
  Lt,
  Gt,
  Le,
  Ge,
}

impl BranchCond {
  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Eq => "beq",
      Self::Lt => "blt",
      Self::Gt => "bgt",
      Self::Le => "ble",
      Self::Ge => "bge",
    }
  }
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
  /// Label definition, `name:`.
  Label(Label),
  /// `li rd imm`
  Li { rd: Reg, imm: i64 },
  /// `la rd label`
  La { rd: Reg, label: Label },
  /// `lw rd offset(base)`
  Lw { rd: Reg, offset: i64, base: Reg },
  /// `sw rs offset(base)`
  Sw { rs: Reg, offset: i64, base: Reg },
  /// `mv rd rs`
  Mv { rd: Reg, rs: Reg },
  /// `addi rd rs imm`
  Addi { rd: Reg, rs: Reg, imm: i64 },
  /// `<op> rd rs1 rs2`
  Alu {
    op: AluOp,
    rd: Reg,
    rs1: Reg,
    rs2: Reg,
  },
  /// `<cond> rs1 rs2 target`
  Branch {
    cond: BranchCond,
    rs1: Reg,
    rs2: Reg,
    target: Label,
  },
  /// `b target`
  B(Label),
  /// `j target`
  J(Label),
  /// `jal target`
  Jal(Label),
  /// `jr rs`
  Jr(Reg),
  Ecall,
  Nop,
}

impl Instr {
  /// Stack-pointer adjustment by `bytes` (negative grows the stack).
  pub fn adjust_sp(bytes: i64) -> Self {
    Self::Addi {
      rd: STACK_PTR,
      rs: STACK_PTR,
      imm: bytes,
    }
  }

  /// The label this line defines, if it is a label line.
  pub fn defined_label(&self) -> Option<&Label> {
    match self {
      Self::Label(label) => Some(label),
      _ => None,
    }
  }
}

impl fmt::Display for Instr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Label(label) => write!(f, "{label}:"),
      Self::Li { rd, imm } => write!(f, "li {rd} {imm}"),
      Self::La { rd, label } => write!(f, "la {rd} {label}"),
      Self::Lw { rd, offset, base } => write!(f, "lw {rd} {offset}({base})"),
      Self::Sw { rs, offset, base } => write!(f, "sw {rs} {offset}({base})"),
      Self::Mv { rd, rs } => write!(f, "mv {rd} {rs}"),
      Self::Addi { rd, rs, imm } => write!(f, "addi {rd} {rs} {imm}"),
      Self::Alu { op, rd, rs1, rs2 } => write!(f, "{} {rd} {rs1} {rs2}", op.mnemonic()),
      Self::Branch {
        cond,
        rs1,
        rs2,
        target,
      } => write!(f, "{} {rs1} {rs2} {target}", cond.mnemonic()),
      Self::B(target) => write!(f, "b {target}"),
      Self::J(target) => write!(f, "j {target}"),
      Self::Jal(target) => write!(f, "jal {target}"),
      Self::Jr(rs) => write!(f, "jr {rs}"),
      Self::Ecall => f.write_str("ecall"),
      Self::Nop => f.write_str("nop"),
    }
  }
}

/// Render instructions as newline-terminated lines.
pub fn render(instrs: &[Instr]) -> String {
  let mut asm = String::new();
  for instr in instrs {
    asm.push_str(&instr.to_string());
    asm.push('\n');
  }
  asm
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_operands_use_offset_base_form() {
    let load = Instr::Lw {
      rd: SCRATCH,
      offset: 4,
      base: STACK_PTR,
    };
    let store = Instr::Sw {
      rs: ACC,
      offset: -8,
      base: FRAME_PTR,
    };
    assert_eq!(load.to_string(), "lw t1 4(sp)");
    assert_eq!(store.to_string(), "sw a0 -8(s0)");
  }

  #[test]
  fn branch_and_label_lines() {
    let target = Label::new("then_1");
    let branch = Instr::Branch {
      cond: BranchCond::Le,
      rs1: SCRATCH,
      rs2: ACC,
      target: target.clone(),
    };
    assert_eq!(branch.to_string(), "ble t1 a0 then_1");
    assert_eq!(Instr::Label(target).to_string(), "then_1:");
    assert_eq!(Instr::adjust_sp(-4).to_string(), "addi sp sp -4");
  }

  #[test]
  fn render_terminates_every_line() {
    let asm = render(&[Instr::Nop, Instr::Ecall]);
    assert_eq!(asm, "nop\necall\n");
    assert_eq!(render(&[]), "");
  }
}
