//! Symbolic jump targets and the per-run counters that keep them unique.

use std::fmt;

/// A jump target name, printed without the trailing colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  /// Entry point of the function called `id`.
  pub fn entry(id: &str) -> Self {
    Self(format!("{id}_entry"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Targets of one `if`: taken branch, fall-through branch, join point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfLabels {
  pub then_: Label,
  pub else_: Label,
  pub exit: Label,
}

/// Targets of one `while`: condition test, body, exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileLabels {
  pub head: Label,
  pub body: Label,
  pub exit: Label,
}

/// Targets of one `repeat ... until`: body start, exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatLabels {
  pub head: Label,
  pub exit: Label,
}

/// One counter per construct kind. Owned by a single generation run, so
/// independent runs number their labels identically.
#[derive(Debug, Default)]
pub struct LabelAllocator {
  ifs: u32,
  whiles: u32,
  repeats: u32,
}

impl LabelAllocator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next_if(&mut self) -> IfLabels {
    self.ifs += 1;
    let n = self.ifs;
    log::trace!("allocated if labels #{n}");
    IfLabels {
      then_: Label(format!("then_{n}")),
      else_: Label(format!("else_{n}")),
      exit: Label(format!("exit_{n}")),
    }
  }

  pub fn next_while(&mut self) -> WhileLabels {
    self.whiles += 1;
    let n = self.whiles;
    log::trace!("allocated while labels #{n}");
    WhileLabels {
      head: Label(format!("loop_{n}")),
      body: Label(format!("loop_body_{n}")),
      exit: Label(format!("loop_exit_{n}")),
    }
  }

  pub fn next_repeat(&mut self) -> RepeatLabels {
    self.repeats += 1;
    let n = self.repeats;
    log::trace!("allocated repeat labels #{n}");
    RepeatLabels {
      head: Label(format!("repeat_{n}")),
      exit: Label(format!("repeat_exit_{n}")),
    }
  }
}
