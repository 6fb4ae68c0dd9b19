//! Busy-loops, burning CPU time, until killed. Exercises `TimeLimit`
//! without sleeping (`IdleLimit` would trip on a `sleep` instead).

fn main() {
  let mut accumulator: u64 = 0;

  loop {
    accumulator = accumulator.wrapping_add(1);
    std::hint::black_box(accumulator);
  }
}
