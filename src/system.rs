use super::*;

/// Thin seam over process identity, so the permission-bit matching in
/// `platform` can be exercised with fabricated identities instead of the
/// real calling process.
pub trait System {
  fn getegid(&self) -> Gid;
  fn geteuid(&self) -> Uid;
  fn getgid(&self) -> Gid;
  fn getuid(&self) -> Uid;
}

pub struct MaterialSystem;

impl System for MaterialSystem {
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
