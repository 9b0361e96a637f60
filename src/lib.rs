//! Crate root: the code-generation stage of a small imperative language.
//!
//! Input is an already-resolved syntax tree and output is RISC-V assembly
//! text. The pieces are kept separate so each can be read on its own:
//! - `ast` is the resolved tree handed over by the front-end.
//! - `label` hands out unique jump-target names for one generation run.
//! - `asm` models target instructions and their textual form.
//! - `codegen` lowers declarations and expressions into instructions.
//! - `error` lists the ways generation can fail.

pub mod asm;
pub mod ast;
pub mod codegen;
pub mod error;
pub mod label;

pub use ast::{Binop, Comp, Cond, Declaration, Expr, Program};
pub use error::{CodegenError, CodegenResult};

/// Compile a program into assembly text, one newline-terminated line per
/// instruction or label.
pub fn generate_assembly(program: &Program) -> CodegenResult<String> {
  let instrs = codegen::generate(program)?;
  Ok(asm::render(&instrs))
}
