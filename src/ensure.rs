#[cfg(test)]
use super::*;

#[macro_export]
macro_rules! ensure {
  ($cond:expr, $err:expr) => {
    if !($cond) {
      return Err($err);
    }
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ensures_properly() {
    fn validate_time_limit(seconds: f64) -> Result<()> {
      ensure!(
        seconds > 0.0,
        Error::Validation("time-limit must be positive".into())
      );

      Ok(())
    }

    assert!(validate_time_limit(2.0).is_ok());

    assert!(matches!(
      validate_time_limit(0.0),
      Err(Error::Validation(_))
    ));
  }
}
