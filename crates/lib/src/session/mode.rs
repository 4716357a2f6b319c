/// Execution mode of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode {
  /// Render operations instead of performing them.
  pub simulate: bool,

  /// Perform downloads for real even while simulating.
  pub allow_real_download: bool,
}

impl Mode {
  pub const APPLY: Mode = Mode {
    simulate: false,
    allow_real_download: false,
  };

  pub const SIMULATE: Mode = Mode {
    simulate: true,
    allow_real_download: false,
  };

  pub fn is_simulating(&self) -> bool {
    self.simulate
  }

  /// Downloads happen for real unless simulating without `allow_real_download`.
  pub fn should_download_for_real(&self) -> bool {
    !self.simulate || self.allow_real_download
  }
}
