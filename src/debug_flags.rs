use anyhow::{bail, Result};

/// Host debug flags. Only gate diagnostics, never control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugFlags(u64);

impl DebugFlags {
    pub const NONE: DebugFlags = DebugFlags(0);
    /// Priority calculation diagnostics
    pub const PRIORITY: DebugFlags = DebugFlags(1 << 0);

    pub fn contains(self, other: DebugFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Parse a single flag name (case-insensitive)
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "priority" | "prio" => Ok(DebugFlags::PRIORITY),
            other => bail!("Unknown debug flag: {}", other),
        }
    }

    /// Parse a list of flag names into one set
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .try_fold(DebugFlags::NONE, |acc, n| Ok(acc | DebugFlags::parse(n.as_ref())?))
    }
}

impl std::ops::BitOr for DebugFlags {
    type Output = DebugFlags;

    fn bitor(self, rhs: DebugFlags) -> DebugFlags {
        DebugFlags(self.0 | rhs.0)
    }
}
