//! Grows a buffer a few mebibytes at a time, touching every new page, until
//! it reaches the requested size.
//!
//! Takes the target size in mebibytes as `argv[1]` (defaults to 128). Growth
//! is incremental rather than a single up-front allocation: a single
//! `vec![0u8; target * 1024 * 1024]` request against a `2 x memory_limit`
//! `RLIMIT_AS` fails at `mmap` time with `ENOMEM` well before the monitor's
//! 10ms-tick live sampling ever gets a chance to observe and kill it on the
//! `memory_limit` itself, which turns the intended `MemoryLimit` verdict into
//! a `RuntimeError` from the allocator aborting instead. Growing a step at a
//! time, with a short sleep between steps, gives `sample_live` room to catch
//! the process while its actual footprint is still comfortably under the
//! `RLIMIT_AS` ceiling.
//! Touching every new page matters too: an untouched allocation may never
//! become resident, so vsize-based live sampling would see it but
//! rusage-based `ru_maxrss` fallback might not.

use std::{thread, time::Duration};

const STEP_MEBIBYTES: usize = 4;

fn main() {
  let target_mebibytes: usize = std::env::args()
    .nth(1)
    .and_then(|value| value.parse().ok())
    .unwrap_or(128);

  let mut buffer: Vec<u8> = Vec::new();
  let mut grown_mebibytes = 0;

  while grown_mebibytes < target_mebibytes {
    let step = STEP_MEBIBYTES.min(target_mebibytes - grown_mebibytes);
    buffer.resize(buffer.len() + step * 1024 * 1024, 0);

    for page in buffer[buffer.len() - step * 1024 * 1024..].chunks_mut(4096) {
      page[0] = 1;
    }

    grown_mebibytes += step;
    thread::sleep(Duration::from_millis(50));
  }

  std::hint::black_box(&buffer);

  loop {
    thread::sleep(Duration::from_secs(1));
  }
}
