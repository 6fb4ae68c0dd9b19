//! A sandboxed process runner: launches a single child under enforced
//! CPU-time, wall-clock and memory limits, with controlled standard-stream
//! redirection and environment scrubbing, and reports a structured verdict
//! about how the child terminated.
//!
//! This is the building block of an automated judging pipeline, not the
//! pipeline itself: one child per [`Runner::execute`] call, no pools, no
//! persistence, no daemon mode. It does not provide filesystem jailing,
//! syscall filtering, namespace isolation, or user/group switching — for
//! those, a stronger isolation policy would sit in front of this crate.

#[macro_use]
mod ensure;

mod child;
mod error;
mod limits;
mod monitor;
mod parameters;
mod platform;
mod redirect;
mod runner;
mod system;
mod timer;
mod verdict;

pub use error::{Error, Result};
pub use parameters::Parameters;
pub use runner::Runner;
pub use system::{MaterialSystem, System};
pub use verdict::{RunResults, Status};

use {
  camino::{Utf8Path, Utf8PathBuf},
  nix::unistd::{getegid, geteuid, getgid, getuid, Gid, Pid, Uid},
  std::{collections::HashMap, fmt, fs, time::Duration},
  thiserror::Error,
};
