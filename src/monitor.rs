use super::*;

use {
  nix::{
    sys::{
      signal::{kill, sigaction, SigAction, SigHandler, Signal},
      wait::waitpid,
    },
    unistd::{close, fork, ForkResult},
  },
  std::{
    os::unix::io::RawFd,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::atomic::{AtomicI32, Ordering},
    thread,
  },
};

/// Sampling resolution of the monitor loop (§4.4): how often the parent
/// polls the child between `wait4` calls.
const TICK: Duration = Duration::from_millis(10);

/// Length, in bytes, of the failure pipe's length prefix.
const LENGTH_PREFIX_SIZE: usize = 4;

/// Process-wide slot naming the pid a live signal handler should forward
/// SIGINT/SIGTERM/SIGQUIT to. Zero means no child is registered.
///
/// This is the only state a signal handler touches. Handlers only read it;
/// it is only written at `ActiveChildLock` construction and destruction.
static ACTIVE_CHILD: AtomicI32 = AtomicI32::new(0);

extern "C" fn forward_signal(_signum: libc::c_int) {
  let pid = ACTIVE_CHILD.load(Ordering::SeqCst);

  if pid != 0 {
    unsafe {
      libc::kill(pid, libc::SIGKILL);
    }
  }

  unsafe {
    libc::kill(0, libc::SIGKILL);
  }
}

/// Registers the live child pid in [`ACTIVE_CHILD`] and installs SIGINT/
/// SIGTERM/SIGQUIT forwarding for the lifetime of the guard. At most one
/// guard can exist at a time: a second construction while one is already
/// live fails with [`Error::AlreadyRunning`].
///
/// Restores whatever handlers were previously installed, and clears
/// `ACTIVE_CHILD`, on every exit path (the guard's `Drop`).
struct ActiveChildLock {
  old_handlers: Vec<(Signal, SigAction)>,
}

impl ActiveChildLock {
  fn acquire(pid: Pid) -> Result<Self> {
    ACTIVE_CHILD
      .compare_exchange(0, pid.as_raw(), Ordering::SeqCst, Ordering::SeqCst)
      .map_err(|_| Error::AlreadyRunning)?;

    let action = SigAction::new(
      SigHandler::Handler(forward_signal),
      nix::sys::signal::SaFlags::empty(),
      nix::sys::signal::SigSet::empty(),
    );

    let mut old_handlers = Vec::with_capacity(3);

    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT] {
      match unsafe { sigaction(signal, &action) } {
        Ok(old) => old_handlers.push((signal, old)),
        Err(errno) => {
          for (signal, old) in &old_handlers {
            let _ = unsafe { sigaction(*signal, old) };
          }
          ACTIVE_CHILD.store(0, Ordering::SeqCst);
          return Err(Error::from(errno));
        }
      }
    }

    Ok(Self { old_handlers })
  }
}

impl Drop for ActiveChildLock {
  fn drop(&mut self) {
    for (signal, old) in &self.old_handlers {
      let _ = unsafe { sigaction(*signal, old) };
    }

    ACTIVE_CHILD.store(0, Ordering::SeqCst);
  }
}

/// Run one child to completion under `params` and return its verdict.
///
/// Never returns `Err` for anything the original taxonomy (§7) attributes
/// to validation, the parent's own syscalls, or the child's pre-exec path —
/// all three collapse into a `RunResults` carrying `Status::RunFail`. The
/// only error this surfaces to the caller is [`Error::AlreadyRunning`],
/// which is a caller contract violation, not a run outcome.
pub fn run(params: &Parameters) -> Result<RunResults> {
  if let Err(err) = params.validate(&MaterialSystem) {
    return Ok(RunResults::run_fail(err.to_string()));
  }

  let outcome = catch_unwind(AssertUnwindSafe(|| run_child(params)));

  match outcome {
    Ok(Ok(results)) => Ok(results),
    Ok(Err(err)) => match err {
      // A second concurrent execute() is the caller's mistake, not a run
      // outcome: surface it as an error rather than folding it into a
      // RunResults the caller might not even look at.
      Error::AlreadyRunning => Err(err),
      other => Ok(RunResults::run_fail(other.to_string())),
    },
    Err(payload) => Ok(RunResults::run_fail(panic_message(&payload))),
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "runner panicked with a non-string payload".to_string()
  }
}

fn run_child(params: &Parameters) -> Result<RunResults> {
  let (read_fd, write_fd) = create_failure_pipe()?;

  match unsafe { fork()? } {
    ForkResult::Child => {
      let _ = close(read_fd);
      child::exec(params, write_fd);
    }
    ForkResult::Parent { child } => {
      let _ = close(write_fd);
      let _lock = ActiveChildLock::acquire(child)?;
      monitor(child, read_fd, params)
    }
  }
}

/// Creates the failure pipe with both ends close-on-exec (§4.3): the
/// child's copy of the write end closes automatically on a successful
/// `exec`, which is what turns into the EOF the parent reads as success.
fn create_failure_pipe() -> Result<(RawFd, RawFd)> {
  let mut fds: [RawFd; 2] = [0; 2];

  if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
    return Err(Error::from(std::io::Error::last_os_error()));
  }

  let (read_fd, write_fd) = (fds[0], fds[1]);

  for fd in [read_fd, write_fd] {
    set_cloexec(fd)?;
  }

  Ok((read_fd, write_fd))
}

fn set_cloexec(fd: RawFd) -> Result<()> {
  let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };

  if flags < 0 {
    return Err(Error::from(std::io::Error::last_os_error()));
  }

  if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
    return Err(Error::from(std::io::Error::last_os_error()));
  }

  Ok(())
}

/// Blocking-reads exactly the length-prefix size from the failure pipe.
///
/// `Ok(None)` is EOF: the exec succeeded and the write end (close-on-exec)
/// was closed by the kernel. `Ok(Some(message))` is a pre-exec failure.
/// Anything else — a short read of the prefix itself — is a protocol
/// violation, not a child failure.
fn read_exact_or_eof(fd: RawFd, buf: &mut [u8]) -> Result<usize> {
  let ret = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };

  if ret < 0 {
    return Err(Error::from(std::io::Error::last_os_error()));
  }

  Ok(ret as usize)
}

fn read_failure_message(read_fd: RawFd) -> Result<Option<String>> {
  let mut length_prefix = [0u8; LENGTH_PREFIX_SIZE];
  let read_bytes = read_exact_or_eof(read_fd, &mut length_prefix)?;

  if read_bytes == 0 {
    return Ok(None);
  }

  if read_bytes != LENGTH_PREFIX_SIZE {
    return Err(Error::Protocol(format!(
      "short read of failure-pipe length prefix: got {read_bytes} of {LENGTH_PREFIX_SIZE} bytes"
    )));
  }

  let message_len = u32::from_ne_bytes(length_prefix) as usize;
  let mut message = vec![0u8; message_len];
  let mut filled = 0;

  while filled < message_len {
    let read_bytes = read_exact_or_eof(read_fd, &mut message[filled..])?;
    if read_bytes == 0 {
      break;
    }
    filled += read_bytes;
  }

  message.truncate(filled);

  Ok(Some(String::from_utf8_lossy(&message).into_owned()))
}

enum WaitOutcome {
  StillRunning,
  Exited {
    exit_code: Option<i32>,
    signal: Option<i32>,
    rusage: libc::rusage,
  },
}

/// Non-blocking `wait4`, which `nix` does not wrap (it has no rusage-
/// carrying wait call). Stopped children (`WUNTRACED`) are treated as
/// still-running: §9 specifies continuing to poll, never resuming them.
fn wait_nonblocking(pid: Pid) -> Result<WaitOutcome> {
  let mut status: libc::c_int = 0;
  let mut rusage: libc::rusage = unsafe { std::mem::zeroed() };

  let ret = unsafe {
    libc::wait4(
      pid.as_raw(),
      &mut status,
      libc::WNOHANG | libc::WUNTRACED,
      &mut rusage,
    )
  };

  if ret == -1 {
    return Err(Error::from(std::io::Error::last_os_error()));
  }

  if ret == 0 || libc::WIFSTOPPED(status) {
    return Ok(WaitOutcome::StillRunning);
  }

  if libc::WIFEXITED(status) {
    return Ok(WaitOutcome::Exited {
      exit_code: Some(libc::WEXITSTATUS(status)),
      signal: None,
      rusage,
    });
  }

  if libc::WIFSIGNALED(status) {
    return Ok(WaitOutcome::Exited {
      exit_code: None,
      signal: Some(libc::WTERMSIG(status)),
      rusage,
    });
  }

  Ok(WaitOutcome::StillRunning)
}

fn reap_blocking(pid: Pid) {
  let _ = waitpid(pid, None);
}

#[cfg(target_os = "macos")]
fn maxrss_bytes(rusage: &libc::rusage) -> f64 {
  rusage.ru_maxrss as f64
}

#[cfg(not(target_os = "macos"))]
fn maxrss_bytes(rusage: &libc::rusage) -> f64 {
  rusage.ru_maxrss as f64 * 1024.0
}

fn rusage_cpu_seconds(rusage: &libc::rusage) -> f64 {
  timer::timeval_to_seconds(timer::timeval_sum(rusage.ru_utime, rusage.ru_stime))
}

fn monitor(pid: Pid, read_fd: RawFd, params: &Parameters) -> Result<RunResults> {
  let timer = timer::Timer::start();

  if let Some(message) = read_failure_message(read_fd)? {
    reap_blocking(pid);
    return Ok(RunResults::run_fail(message));
  }

  let mut results = RunResults::default();
  let mut sampled_live = false;
  let clock_ticks_per_second = unsafe { libc::sysconf(libc::_SC_CLK_TCK) } as f64;

  loop {
    match wait_nonblocking(pid) {
      Ok(WaitOutcome::StillRunning) => {
        if let Some((cpu_time, memory)) = platform::sample_live(pid, clock_ticks_per_second) {
          results.record_sample(cpu_time, memory);
          sampled_live = true;
        }

        results.record_clock(timer.elapsed_seconds());

        if results.evaluate_limits(params) {
          let _ = kill(pid, Signal::SIGKILL);
          reap_blocking(pid);
          break;
        }

        thread::sleep(TICK);
      }
      Ok(WaitOutcome::Exited {
        exit_code,
        signal,
        rusage,
      }) => {
        results.record_clock(timer.elapsed_seconds());
        results.time = results.time.max(rusage_cpu_seconds(&rusage));

        if !sampled_live {
          results.memory = results.memory.max(maxrss_bytes(&rusage) / (1024.0 * 1024.0));
          log::warn!("memory measurement is not precise!");
          results.comment = "memory measurement is not precise!".to_string();
        }

        results.apply_wait_status(exit_code, signal);
        results.evaluate_limits(params);
        break;
      }
      Err(err) => {
        let _ = kill(pid, Signal::SIGKILL);
        return Err(err);
      }
    }
  }

  Ok(results)
}
