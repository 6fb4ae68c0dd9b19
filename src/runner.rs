use super::*;

/// Ties a set of [`Parameters`] to the single `execute()` call that is
/// allowed to consume them (§3 lifecycle).
///
/// A `Runner` holds default parameters until the caller overrides them,
/// then `execute()` forks, monitors, and reaps exactly one child. Calling
/// `execute()` again while a previous call on this (or any other) `Runner`
/// is still in progress fails deterministically with
/// [`Error::AlreadyRunning`] — the process only has one
/// [`ActiveChildLock`](crate::monitor) slot.
#[derive(Debug, Clone, Default)]
pub struct Runner {
  params: Parameters,
}

impl Runner {
  pub fn new(params: Parameters) -> Self {
    Self { params }
  }

  pub fn params(&self) -> &Parameters {
    &self.params
  }

  pub fn params_mut(&mut self) -> &mut Parameters {
    &mut self.params
  }

  /// Fork, monitor, and reap one child under `self.params()`, returning its
  /// frozen verdict.
  ///
  /// Validation, OS, and child-pre-exec failures are all folded into a
  /// `RunResults` carrying `Status::RunFail` rather than propagated as
  /// `Err` — see §7. `Err` is reserved for the one caller contract
  /// violation this type can detect on its own: re-entering `execute()`
  /// while a run is already active somewhere in this process.
  pub fn execute(&self) -> Result<RunResults> {
    monitor::run(&self.params)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fresh_runner_carries_supplied_parameters() {
    let runner = Runner::new(Parameters::new("/bin/true").time_limit(3.0));
    assert_eq!(runner.params().time_limit, 3.0);
  }

  #[test]
  fn params_mut_allows_incremental_overrides() {
    let mut runner = Runner::new(Parameters::new("/bin/true"));
    runner.params_mut().memory_limit = 32.0;
    assert_eq!(runner.params().memory_limit, 32.0);
  }
}
