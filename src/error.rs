use super::*;

/// The three error kinds the runner can produce.
///
/// `Validation` and `Os` are raised by the parent before or around the fork;
/// `ChildPreExec` is relayed from the child through the failure pipe. All
/// three collapse to `Status::RunFail` at the `Runner::execute` boundary —
/// the runner never retries and never exposes a fourth kind.
#[derive(Debug, Error)]
pub enum Error {
  /// Parameters failed validation before any process was created.
  #[error("invalid parameters: {0}")]
  Validation(String),

  /// A syscall failed unexpectedly in the parent.
  #[error("os error: {0}")]
  Os(String),

  /// The child reported a failure before it could exec.
  #[error("child setup failed: {0}")]
  ChildPreExec(String),

  /// The pipe handshake did not follow the length-prefix protocol.
  #[error("failure pipe protocol violation: {0}")]
  Protocol(String),

  /// `execute()` was called while a run is already in progress, or another
  /// `Runner` already holds the active-child slot.
  #[error("a run is already active")]
  AlreadyRunning,
}

impl From<nix::Error> for Error {
  fn from(errno: nix::Error) -> Self {
    Error::Os(errno.to_string())
  }
}

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Self {
    Error::Os(err.to_string())
  }
}

pub type Result<T = ()> = std::result::Result<T, Error>;
