use super::*;

use nix::{
  fcntl::{open, OFlag},
  sys::stat::Mode,
  unistd::{close, dup2},
};
use std::os::unix::io::RawFd;

const NULL_DEVICE: &str = "/dev/null";

/// Open `path` (or the null device, when `path` is empty) and duplicate it
/// onto `target_fd`, closing the freshly opened descriptor afterwards.
///
/// Errno is preserved across the cleanup close: if `dup2` fails, the error
/// returned is `dup2`'s, not whatever `close` produces afterwards.
fn redirect(target_fd: RawFd, path: &Utf8Path, flags: OFlag, mode: Mode) -> Result<()> {
  let source = if path.as_str().is_empty() {
    NULL_DEVICE
  } else {
    path.as_str()
  };

  let fd = open(source, flags, mode)?;

  let result = dup2(fd, target_fd).map(|_| ()).map_err(Error::from);

  let _ = close(fd);

  result
}

pub fn redirect_stdin(path: &Utf8Path) -> Result<()> {
  redirect(libc::STDIN_FILENO, path, OFlag::O_RDONLY, Mode::empty())
}

pub fn redirect_stdout(path: &Utf8Path) -> Result<()> {
  redirect(
    libc::STDOUT_FILENO,
    path,
    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
    Mode::from_bits_truncate(0o644),
  )
}

pub fn redirect_stderr(path: &Utf8Path) -> Result<()> {
  redirect(
    libc::STDERR_FILENO,
    path,
    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
    Mode::from_bits_truncate(0o644),
  )
}
