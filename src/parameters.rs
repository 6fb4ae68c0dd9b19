use super::*;

use serde::Deserialize;

/// The input contract: limits, the program to run, and how its standard
/// streams and environment are set up. Built with setter methods so a
/// caller only overrides what it needs from the defaults in the wire
/// format's table.
#[derive(Debug, Clone)]
pub struct Parameters {
  pub time_limit: f64,
  pub idle_limit: f64,
  pub memory_limit: f64,
  pub executable: Utf8PathBuf,
  pub args: Vec<String>,
  pub clear_env: bool,
  pub env: HashMap<String, String>,
  pub working_dir: Utf8PathBuf,
  pub stdin_redir: Utf8PathBuf,
  pub stdout_redir: Utf8PathBuf,
  pub stderr_redir: Utf8PathBuf,
}

impl Default for Parameters {
  fn default() -> Self {
    Self {
      time_limit: 2.0,
      idle_limit: 7.0,
      memory_limit: 256.0,
      executable: Utf8PathBuf::new(),
      args: Vec::new(),
      clear_env: false,
      env: HashMap::new(),
      working_dir: Utf8PathBuf::new(),
      stdin_redir: Utf8PathBuf::new(),
      stdout_redir: Utf8PathBuf::new(),
      stderr_redir: Utf8PathBuf::new(),
    }
  }
}

impl Parameters {
  pub fn new(executable: impl Into<Utf8PathBuf>) -> Self {
    Self {
      executable: executable.into(),
      ..Self::default()
    }
  }

  pub fn time_limit(mut self, seconds: f64) -> Self {
    self.time_limit = seconds;
    self
  }

  pub fn idle_limit(mut self, seconds: f64) -> Self {
    self.idle_limit = seconds;
    self
  }

  pub fn memory_limit(mut self, mebibytes: f64) -> Self {
    self.memory_limit = mebibytes;
    self
  }

  pub fn args(mut self, args: Vec<String>) -> Self {
    self.args = args;
    self
  }

  pub fn clear_env(mut self, clear_env: bool) -> Self {
    self.clear_env = clear_env;
    self
  }

  pub fn env(mut self, env: HashMap<String, String>) -> Self {
    self.env = env;
    self
  }

  pub fn working_dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
    self.working_dir = path.into();
    self
  }

  pub fn stdin_redir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
    self.stdin_redir = path.into();
    self
  }

  pub fn stdout_redir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
    self.stdout_redir = path.into();
    self
  }

  pub fn stderr_redir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
    self.stderr_redir = path.into();
    self
  }

  /// Parse a Parameters JSON document (§6 of the wire format). When
  /// `idle-limit` is absent it defaults to `3.5 * time-limit`, not to the
  /// fixed default in the struct's own `Default` impl.
  pub fn from_json(input: &str) -> Result<Self> {
    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Raw {
      #[serde(default = "default_time_limit")]
      time_limit: f64,
      #[serde(default)]
      idle_limit: Option<f64>,
      #[serde(default = "default_memory_limit")]
      memory_limit: f64,
      executable: Utf8PathBuf,
      #[serde(default)]
      args: Vec<String>,
      #[serde(default)]
      clear_env: bool,
      #[serde(default)]
      env: HashMap<String, String>,
      #[serde(default)]
      working_dir: Utf8PathBuf,
      #[serde(default)]
      stdin_redir: Utf8PathBuf,
      #[serde(default)]
      stdout_redir: Utf8PathBuf,
      #[serde(default)]
      stderr_redir: Utf8PathBuf,
    }

    fn default_time_limit() -> f64 {
      2.0
    }

    fn default_memory_limit() -> f64 {
      256.0
    }

    let raw: Raw =
      serde_json::from_str(input).map_err(|err| Error::Validation(err.to_string()))?;

    let idle_limit = raw.idle_limit.unwrap_or(raw.time_limit * 3.5);

    Ok(Self {
      time_limit: raw.time_limit,
      idle_limit,
      memory_limit: raw.memory_limit,
      executable: raw.executable,
      args: raw.args,
      clear_env: raw.clear_env,
      env: raw.env,
      working_dir: raw.working_dir,
      stdin_redir: raw.stdin_redir,
      stdout_redir: raw.stdout_redir,
      stderr_redir: raw.stderr_redir,
    })
  }

  /// Reject non-positive limits, an unusable `executable`, a missing
  /// `working_dir`, or an unreadable `stdin_redir`. Output redirections are
  /// deliberately not write-checked: they are created, not opened.
  pub fn validate(&self, system: &impl System) -> Result<()> {
    ensure!(
      self.time_limit > 0.0,
      Error::Validation("time-limit must be positive".into())
    );
    ensure!(
      self.idle_limit > 0.0,
      Error::Validation("idle-limit must be positive".into())
    );
    ensure!(
      self.memory_limit > 0.0,
      Error::Validation("memory-limit must be positive".into())
    );
    ensure!(
      !self.executable.as_str().is_empty(),
      Error::Validation("executable is required".into())
    );
    ensure!(
      platform::file_is_good(&self.executable, system),
      Error::Validation(format!(
        "{} does not exist or is not a regular file, symlink, or device",
        self.executable
      ))
    );
    ensure!(
      platform::is_executable(&self.executable, system),
      Error::Validation(format!("{} is not executable", self.executable))
    );

    if !self.working_dir.as_str().is_empty() {
      ensure!(
        platform::directory_exists(&self.working_dir),
        Error::Validation(format!("working-dir {} does not exist", self.working_dir))
      );
    }

    if !self.stdin_redir.as_str().is_empty() {
      ensure!(
        platform::is_readable(&self.stdin_redir, system),
        Error::Validation(format!("stdin-redir {} is not readable", self.stdin_redir))
      );
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct AnySystem;

  impl System for AnySystem {
    fn getegid(&self) -> Gid {
      getegid()
    }

    fn geteuid(&self) -> Uid {
      geteuid()
    }

    fn getgid(&self) -> Gid {
      getgid()
    }

    fn getuid(&self) -> Uid {
      getuid()
    }
  }

  #[test]
  fn defaults_match_wire_table() {
    let params = Parameters::new("/bin/true");
    assert_eq!(params.time_limit, 2.0);
    assert_eq!(params.idle_limit, 7.0);
    assert_eq!(params.memory_limit, 256.0);
  }

  #[test]
  fn idle_limit_defaults_from_time_limit_when_absent_in_json() {
    let params = Parameters::from_json(r#"{"executable": "/bin/true", "time-limit": 4.0}"#)
      .unwrap();
    assert_eq!(params.idle_limit, 14.0);
  }

  #[test]
  fn idle_limit_explicit_in_json_is_honored() {
    let params = Parameters::from_json(
      r#"{"executable": "/bin/true", "time-limit": 4.0, "idle-limit": 1.0}"#,
    )
    .unwrap();
    assert_eq!(params.idle_limit, 1.0);
  }

  #[test]
  fn rejects_nonpositive_time_limit() {
    let params = Parameters::new("/bin/true").time_limit(0.0);
    assert!(matches!(
      params.validate(&AnySystem),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn rejects_nonexistent_executable() {
    let params = Parameters::new("/nonexistent/definitely/not/here");
    assert!(matches!(
      params.validate(&AnySystem),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn rejects_missing_working_dir() {
    let params = Parameters::new("/bin/true").working_dir("/nonexistent/dir");
    assert!(matches!(
      params.validate(&AnySystem),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn accepts_true_with_no_overrides() {
    let params = Parameters::new("/bin/true");
    assert!(params.validate(&AnySystem).is_ok());
  }
}
