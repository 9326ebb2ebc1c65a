//! Output mode for a bundle invocation.

use std::fmt;

/// How a bundle is produced and where it ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Live session build: unminified, served over the reload socket.
    Development,
    /// One-shot build written to the output directory with a version suffix.
    Release,
    /// Self-contained build stored in place of the dev agent.
    Offline,
}

impl OutputMode {
    /// Whether optimizations (minification, style compaction) apply.
    #[inline]
    pub const fn optimize(self) -> bool {
        !matches!(self, Self::Development)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Release => "release",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
