//! Raises `SIGSEGV` against itself, for exercising the `RuntimeError`
//! signal-termination path (spec scenario 3: `kill(getpid(), SIGSEGV)`).

fn main() {
  unsafe {
    libc::kill(libc::getpid(), libc::SIGSEGV);
  }
}
