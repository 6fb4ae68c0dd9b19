use super::*;

use {
  nix::{
    sys::resource::Resource,
    unistd::{chdir, execvp, setsid},
  },
  std::{ffi::CString, os::unix::io::RawFd},
};

/// `_exit` code the child uses to signal a pre-exec failure. Never observed
/// outside the process: the parent reads the failure message from the pipe
/// and never inspects this code directly.
const PRE_EXEC_FAILURE_EXIT: i32 = 42;

/// The fixed order of steps a forked child runs before it can exec.
///
/// This never returns: it either execs successfully (replacing the process
/// image) or reports a failure through `failure_pipe` and calls `_exit`.
/// Nothing here may unwind into the parent's Rust state — a panic here
/// would corrupt the forked copy of the parent's heap without the parent
/// ever finding out.
pub fn exec(params: &Parameters, failure_pipe: RawFd) -> ! {
  if let Err(message) = run(params) {
    report_failure(failure_pipe, &message);
  }

  unreachable!("run() only returns on success, and success means exec replaced this process");
}

fn run(params: &Parameters) -> std::result::Result<(), String> {
  setsid().map_err(|errno| format!("setsid: {errno}"))?;

  install_limits(params).map_err(|err| err.to_string())?;

  if !params.working_dir.as_str().is_empty() {
    chdir(params.working_dir.as_std_path()).map_err(|errno| format!("chdir: {errno}"))?;
  }

  redirect::redirect_stdin(&params.stdin_redir).map_err(|err| err.to_string())?;
  redirect::redirect_stdout(&params.stdout_redir).map_err(|err| err.to_string())?;
  redirect::redirect_stderr(&params.stderr_redir).map_err(|err| err.to_string())?;

  prepare_environment(params);

  let executable = CString::new(params.executable.as_str())
    .map_err(|_| "executable path contains a NUL byte".to_string())?;

  let mut argv = Vec::with_capacity(params.args.len() + 1);
  argv.push(executable.clone());

  for arg in &params.args {
    argv.push(CString::new(arg.as_str()).map_err(|_| "argument contains a NUL byte".to_string())?);
  }

  let error = execvp(executable.as_c_str(), &argv).expect_err("execvp only returns on failure");

  Err(format!("execvp: {error}"))
}

fn install_limits(params: &Parameters) -> Result<()> {
  let cpu_seconds = (params.time_limit + 0.2).ceil() as u64;
  limits::install_limit(Resource::RLIMIT_CPU, cpu_seconds)?;

  let memory_bytes = (2.0 * params.memory_limit * 1024.0 * 1024.0) as u64;
  limits::install_limit(Resource::RLIMIT_AS, memory_bytes)?;
  limits::install_limit(Resource::RLIMIT_DATA, memory_bytes)?;
  limits::install_limit(Resource::RLIMIT_STACK, memory_bytes)?;

  Ok(())
}

fn prepare_environment(params: &Parameters) {
  if params.clear_env {
    unsafe {
      let _ = nix::env::clearenv();
    }
  }

  for (key, value) in &params.env {
    unsafe {
      std::env::set_var(key, value);
    }
  }
}

fn report_failure(failure_pipe: RawFd, message: &str) -> ! {
  let length = (message.len() as u32).to_ne_bytes();

  unsafe {
    libc::write(failure_pipe, length.as_ptr() as *const libc::c_void, length.len());
    libc::write(
      failure_pipe,
      message.as_ptr() as *const libc::c_void,
      message.len(),
    );
    libc::_exit(PRE_EXEC_FAILURE_EXIT);
  }
}
