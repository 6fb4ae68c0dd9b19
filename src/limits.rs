use super::*;

use nix::sys::resource::{getrlimit, setrlimit, Resource};

/// Clamp `value` against the resource's current hard ceiling and install it
/// as both the soft and hard limit.
///
/// If the hard ceiling is already infinite, `value` is used verbatim;
/// otherwise the lower of `value` and the ceiling wins. This mirrors the
/// original runner's `updateLimit`: the kernel never gets to raise a limit
/// past what it already allowed, only to narrow it.
pub fn install_limit(resource: Resource, value: u64) -> Result<()> {
  let (_soft, hard) = getrlimit(resource)?;

  let clamped = if hard == libc::RLIM_INFINITY as u64 {
    value
  } else {
    value.min(hard)
  };

  setrlimit(resource, clamped, clamped)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn install_limit_never_exceeds_existing_hard_ceiling() {
    let (_soft, hard) = getrlimit(Resource::RLIMIT_STACK).unwrap();

    if hard == libc::RLIM_INFINITY as u64 {
      return;
    }

    install_limit(Resource::RLIMIT_STACK, hard + 1).unwrap();

    let (soft_after, hard_after) = getrlimit(Resource::RLIMIT_STACK).unwrap();

    assert_eq!(soft_after, hard);
    assert_eq!(hard_after, hard);
  }
}
