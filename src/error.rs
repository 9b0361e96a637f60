//! Errors raised while lowering a program to assembly.
//!
//! Generation is all-or-nothing: the first error aborts the run and no partial
//! listing is returned to the caller.

use snafu::Snafu;

pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodegenError {
  #[snafu(display("in `{function}`: `break` used outside of a loop"))]
  BreakOutsideLoop { function: String },

  #[snafu(display("in `{function}`: `continue` used outside of a loop"))]
  ContinueOutsideLoop { function: String },

  #[snafu(display("`{function}` is declared more than once"))]
  DuplicateFunction { function: String },

  #[snafu(display(
    "in `{function}`: `{callee}` takes {expected} argument(s) but {found} were supplied"
  ))]
  ArityMismatch {
    function: String,
    callee: String,
    expected: usize,
    found: usize,
  },
}

impl CodegenError {
  /// Name of the declaration the error was raised for.
  pub fn function(&self) -> &str {
    match self {
      Self::BreakOutsideLoop { function }
      | Self::ContinueOutsideLoop { function }
      | Self::DuplicateFunction { function }
      | Self::ArityMismatch { function, .. } => function,
    }
  }
}
