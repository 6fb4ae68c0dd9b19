use super::*;

use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};

const READ_PERM: u32 = 0o444;
const WRITE_PERM: u32 = 0o222;
const EXEC_PERM: u32 = 0o111;

/// Effective permission bits of a path for the calling identity, computed
/// the same way the original runner does it: owner bits if the caller's
/// effective uid matches the file's owner, else group bits if the effective
/// gid matches, else other bits. This is advisory only — it narrows a race
/// between this check and the later open/exec, not a TOCTOU defense.
fn file_permissions(path: &Utf8Path, system: &impl System) -> Option<u32> {
  let metadata = fs::metadata(path).ok()?;
  let file_type = metadata.file_type();

  if !(file_type.is_file()
    || file_type.is_symlink()
    || file_type.is_block_device()
    || file_type.is_char_device())
  {
    return None;
  }

  let mode = metadata.permissions().mode();

  if metadata.uid() == system.geteuid().as_raw() {
    Some(mode & 0o700)
  } else if metadata.gid() == system.getegid().as_raw() {
    Some(mode & 0o070)
  } else {
    Some(mode & 0o007)
  }
}

/// True if `path` exists and is usable in the sense `file_permissions`
/// cares about — a regular file, symlink, or device node.
pub fn file_is_good(path: &Utf8Path, system: &impl System) -> bool {
  file_permissions(path, system).is_some()
}

pub fn is_readable(path: &Utf8Path, system: &impl System) -> bool {
  match file_permissions(path, system) {
    Some(perms) => perms & READ_PERM != 0,
    None => false,
  }
}

pub fn is_writable(path: &Utf8Path, system: &impl System) -> bool {
  match file_permissions(path, system) {
    Some(perms) => perms & WRITE_PERM != 0,
    None => false,
  }
}

pub fn is_executable(path: &Utf8Path, system: &impl System) -> bool {
  match file_permissions(path, system) {
    Some(perms) => perms & EXEC_PERM != 0,
    None => false,
  }
}

pub fn directory_exists(path: &Utf8Path) -> bool {
  fs::metadata(path)
    .map(|metadata| metadata.is_dir())
    .unwrap_or(false)
}

/// Live CPU time and memory sample of a running child, taken from
/// `/proc/<pid>/stat` (§4.4). Returns `(cpu_seconds, memory_mebibytes)`.
///
/// Parses past the command field's closing `)` so that a command name
/// containing spaces or parentheses doesn't shift the fixed-width fields
/// after it, then reads field 14 (`utime`), field 15 (`stime`), and field 23
/// (`vsize`) by position.
#[cfg(target_os = "linux")]
pub fn sample_live(pid: Pid, clock_ticks_per_second: f64) -> Option<(f64, f64)> {
  let contents = fs::read_to_string(format!("/proc/{}/stat", pid.as_raw())).ok()?;
  let after_comm = contents.rsplit(')').next()?;
  let fields: Vec<&str> = after_comm.split_whitespace().collect();

  // Field numbering in `proc(5)` is 1-based and includes `pid` and `comm`,
  // which are consumed above; `fields[0]` is field 3 (`state`).
  let utime: u64 = fields.get(14 - 3)?.parse().ok()?;
  let stime: u64 = fields.get(15 - 3)?.parse().ok()?;
  let vsize: u64 = fields.get(23 - 3)?.parse().ok()?;

  let cpu_seconds = (utime + stime) as f64 / clock_ticks_per_second;
  let memory_mebibytes = vsize as f64 / (1024.0 * 1024.0);

  Some((cpu_seconds, memory_mebibytes))
}

/// On platforms without `/proc`, live sampling is a no-op: the monitor loop
/// falls back to the final `rusage` at termination, with coarser
/// resolution and a comment noting the imprecision.
#[cfg(not(target_os = "linux"))]
pub fn sample_live(_pid: Pid, _clock_ticks_per_second: f64) -> Option<(f64, f64)> {
  None
}
