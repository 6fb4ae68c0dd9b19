//! Thin CLI entry point over the `isolate_runner` library (§6).
//!
//! `-?` prints a runner-info JSON document and exits 0. Otherwise, reads one
//! Parameters JSON document from stdin, executes it, and writes one
//! RunResults JSON document to stdout — even when the run itself failed
//! (`status: "run-fail"` is still a successful report). Exit is non-zero
//! only when the runner cannot read its input or write its output at all.

use {
  isolate_runner::{Parameters, Runner},
  serde_json::json,
  std::{
    io::{self, Read, Write},
    process::ExitCode,
  },
};

fn main() -> ExitCode {
  env_logger::init();

  let mut args = std::env::args().skip(1);

  if args.next().as_deref() == Some("-?") {
    return print_runner_info();
  }

  run_from_stdin()
}

fn print_runner_info() -> ExitCode {
  let defaults = Parameters::default();

  let info = json!({
    "name": env!("CARGO_PKG_NAME"),
    "version": env!("CARGO_PKG_VERSION"),
    "defaults": {
      "time-limit": defaults.time_limit,
      "idle-limit": defaults.idle_limit,
      "memory-limit": defaults.memory_limit,
    },
  });

  match serde_json::to_writer_pretty(io::stdout(), &info) {
    Ok(()) => {
      println!();
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("isolate-run: failed to write runner-info: {err}");
      ExitCode::FAILURE
    }
  }
}

fn run_from_stdin() -> ExitCode {
  let mut input = String::new();

  if let Err(err) = io::stdin().read_to_string(&mut input) {
    eprintln!("isolate-run: failed to read parameters from stdin: {err}");
    return ExitCode::FAILURE;
  }

  let params = match Parameters::from_json(&input) {
    Ok(params) => params,
    Err(err) => {
      return write_results(isolate_runner::RunResults::run_fail(err.to_string()));
    }
  };

  let results = match Runner::new(params).execute() {
    Ok(results) => results,
    Err(err) => {
      log::error!("runner rejected execute(): {err}");
      isolate_runner::RunResults::run_fail(err.to_string())
    }
  };

  write_results(results)
}

fn write_results(results: isolate_runner::RunResults) -> ExitCode {
  let encoded = match serde_json::to_string(&results) {
    Ok(encoded) => encoded,
    Err(err) => {
      eprintln!("isolate-run: failed to encode results: {err}");
      return ExitCode::FAILURE;
    }
  };

  match writeln!(io::stdout(), "{encoded}") {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("isolate-run: failed to write results: {err}");
      ExitCode::FAILURE
    }
  }
}
