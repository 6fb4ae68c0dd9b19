use super::*;

use {
  nix::sys::signal::Signal,
  serde::{Deserialize, Serialize},
};

/// The nine verdict tags from the wire protocol, in the order the original
/// runner declares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
  Ok,
  TimeLimit,
  IdleLimit,
  MemoryLimit,
  RuntimeError,
  /// Reserved for a stronger isolation policy layered in front of this
  /// runner. Never produced here.
  SecurityError,
  RunFail,
  /// Transient only; never present on a result returned from `execute()`.
  Running,
  None,
}

impl Default for Status {
  fn default() -> Self {
    Status::None
  }
}

/// The outcome of one `Runner::execute()` call.
///
/// Every field starts at a zero value under `status = Running` and is only
/// ever tightened, never loosened, as the monitor loop progresses — times
/// and memory are monotonic non-decreasing, `status` only changes to reflect
/// a limit newly exceeded or the final wait-status translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunResults {
  pub time: f64,
  pub clock_time: f64,
  pub memory: f64,
  pub exitcode: i32,
  pub signal: i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub signal_name: Option<String>,
  pub status: Status,
  pub comment: String,
}

impl Default for RunResults {
  fn default() -> Self {
    Self {
      time: 0.0,
      clock_time: 0.0,
      memory: 0.0,
      exitcode: 0,
      signal: 0,
      signal_name: None,
      status: Status::Running,
      comment: String::new(),
    }
  }
}

impl RunResults {
  pub fn run_fail(comment: impl Into<String>) -> Self {
    Self {
      status: Status::RunFail,
      comment: comment.into(),
      ..Self::default()
    }
  }

  /// Record a live sample taken mid-run. Both fields only ever increase:
  /// a later, lower read (e.g. `/proc` momentarily unreadable) never
  /// overwrites a higher earlier one.
  pub fn record_sample(&mut self, time: f64, memory: f64) {
    self.time = self.time.max(time);
    self.memory = self.memory.max(memory);
  }

  pub fn record_clock(&mut self, clock_time: f64) {
    self.clock_time = self.clock_time.max(clock_time);
  }

  /// Check the three limits in time, idle, memory order, so that when more
  /// than one is exceeded on the same tick the last assignment wins:
  /// memory dominates idle dominates time.
  pub fn evaluate_limits(&mut self, params: &Parameters) -> bool {
    let mut tripped = false;

    if self.time > params.time_limit {
      self.status = Status::TimeLimit;
      tripped = true;
    }

    if self.clock_time > params.idle_limit {
      self.status = Status::IdleLimit;
      tripped = true;
    }

    if self.memory > params.memory_limit {
      self.status = Status::MemoryLimit;
      tripped = true;
    }

    tripped
  }

  /// Translate a reaped child's wait-status into a verdict. Does not
  /// re-evaluate limits — callers must do that afterwards so a child
  /// SIGKILLed for exceeding a limit is still reported under that limit,
  /// not as `RuntimeError`.
  pub fn apply_wait_status(&mut self, exit_code: Option<i32>, signal: Option<i32>) {
    match (exit_code, signal) {
      (Some(0), None) => {
        self.exitcode = 0;
        self.signal = 0;
        self.status = Status::Ok;
      }
      (Some(code), None) => {
        self.exitcode = code;
        self.signal = 0;
        self.status = Status::RuntimeError;
      }
      (None, Some(signal)) => {
        self.exitcode = 0;
        self.signal = signal;
        self.signal_name = Signal::try_from(signal).ok().map(|s| s.as_str().to_string());
        self.status = Status::RuntimeError;
      }
      (None, None) | (Some(_), Some(_)) => unreachable!("a wait-status has exactly one outcome"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params() -> Parameters {
    Parameters::new("/bin/true")
      .time_limit(1.0)
      .idle_limit(5.0)
      .memory_limit(64.0)
  }

  #[test]
  fn default_status_is_running() {
    assert_eq!(RunResults::default().status, Status::Running);
  }

  #[test]
  fn memory_dominates_idle_dominates_time() {
    let mut results = RunResults::default();
    results.record_sample(2.0, 128.0);
    results.record_clock(10.0);

    assert!(results.evaluate_limits(&params()));
    assert_eq!(results.status, Status::MemoryLimit);
  }

  #[test]
  fn only_time_exceeded() {
    let mut results = RunResults::default();
    results.record_sample(2.0, 1.0);
    results.record_clock(0.1);

    assert!(results.evaluate_limits(&params()));
    assert_eq!(results.status, Status::TimeLimit);
  }

  #[test]
  fn nothing_exceeded() {
    let mut results = RunResults::default();
    results.record_sample(0.1, 1.0);
    results.record_clock(0.1);

    assert!(!results.evaluate_limits(&params()));
  }

  #[test]
  fn normal_exit_is_ok() {
    let mut results = RunResults::default();
    results.apply_wait_status(Some(0), None);
    assert_eq!(results.status, Status::Ok);
  }

  #[test]
  fn nonzero_exit_is_runtime_error() {
    let mut results = RunResults::default();
    results.apply_wait_status(Some(1), None);
    assert_eq!(results.status, Status::RuntimeError);
    assert_eq!(results.exitcode, 1);
  }

  #[test]
  fn signalled_child_carries_signal_name() {
    let mut results = RunResults::default();
    results.apply_wait_status(None, Some(libc::SIGSEGV));
    assert_eq!(results.status, Status::RuntimeError);
    assert_eq!(results.signal, libc::SIGSEGV);
    assert_eq!(results.signal_name.as_deref(), Some("SIGSEGV"));
  }

  #[test]
  fn exitcode_and_signal_invariant_holds() {
    let mut exit = RunResults::default();
    exit.apply_wait_status(Some(1), None);
    assert!(exit.signal == 0);

    let mut signalled = RunResults::default();
    signalled.apply_wait_status(None, Some(libc::SIGKILL));
    assert!(signalled.exitcode == 0);
  }
}
