use super::*;

use std::time::Instant;

const USEC_IN_SECOND: i64 = 1_000_000;

/// A monotonic wall-clock timer, started at construction.
///
/// Used for `clockTime`: the wall-clock duration since fork, independent of
/// whatever the system clock is doing.
#[derive(Debug)]
pub struct Timer {
  start: Instant,
}

impl Timer {
  pub fn start() -> Self {
    Self {
      start: Instant::now(),
    }
  }

  pub fn elapsed_seconds(&self) -> f64 {
    self.start.elapsed().as_secs_f64()
  }
}

/// Add two `timeval`s, carrying the microsecond overflow into seconds.
pub fn timeval_sum(a: libc::timeval, b: libc::timeval) -> libc::timeval {
  normalize(a.tv_sec + b.tv_sec, a.tv_usec as i64 + b.tv_usec as i64)
}

/// Subtract `start` from `finish`, borrowing a second when the microsecond
/// difference goes negative.
pub fn timeval_difference(start: libc::timeval, finish: libc::timeval) -> libc::timeval {
  normalize(finish.tv_sec - start.tv_sec, finish.tv_usec as i64 - start.tv_usec as i64)
}

fn normalize(mut secs: libc::time_t, mut usecs: i64) -> libc::timeval {
  if usecs >= USEC_IN_SECOND {
    secs += 1;
    usecs -= USEC_IN_SECOND;
  } else if usecs < 0 {
    secs -= 1;
    usecs += USEC_IN_SECOND;
  }

  libc::timeval {
    tv_sec: secs,
    tv_usec: usecs as libc::suseconds_t,
  }
}

pub fn timeval_to_seconds(value: libc::timeval) -> f64 {
  value.tv_sec as f64 + value.tv_usec as f64 / USEC_IN_SECOND as f64
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tv(sec: i64, usec: i64) -> libc::timeval {
    libc::timeval {
      tv_sec: sec,
      tv_usec: usec as libc::suseconds_t,
    }
  }

  #[test]
  fn sum_carries_overflow() {
    let sum = timeval_sum(tv(1, 700_000), tv(2, 500_000));
    assert_eq!(sum.tv_sec, 4);
    assert_eq!(sum.tv_usec, 200_000);
  }

  #[test]
  fn difference_borrows_on_negative_usec() {
    let diff = timeval_difference(tv(1, 700_000), tv(3, 200_000));
    assert_eq!(diff.tv_sec, 1);
    assert_eq!(diff.tv_usec, 500_000);
  }

  #[test]
  fn to_seconds_round_trips() {
    assert_eq!(timeval_to_seconds(tv(2, 500_000)), 2.5);
  }

  #[test]
  fn timer_reports_nonnegative_elapsed() {
    let timer = Timer::start();
    assert!(timer.elapsed_seconds() >= 0.0);
  }
}
