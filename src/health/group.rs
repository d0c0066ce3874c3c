//! Probe group bit mask.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use super::HealthzError;

/// Bit mask of probe groups a dependency contributes to.
///
/// Groups combine with `|`:
///
/// ```rust
/// use healthz::ProbeGroup;
///
/// let groups = ProbeGroup::STARTUP | ProbeGroup::READY;
/// assert!(groups.contains(ProbeGroup::READY));
/// assert!(groups.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeGroup(u8);

impl ProbeGroup {
    /// Polled on every cycle without gating any verdict.
    pub const COMMON: ProbeGroup = ProbeGroup(1 << 0);
    /// Startup probe bucket.
    pub const STARTUP: ProbeGroup = ProbeGroup(1 << 1);
    /// Liveness probe bucket.
    pub const LIVE: ProbeGroup = ProbeGroup(1 << 2);
    /// Readiness probe bucket.
    pub const READY: ProbeGroup = ProbeGroup(1 << 3);
    /// Union of every known group.
    pub const ALL: ProbeGroup = ProbeGroup(
        Self::COMMON.0 | Self::STARTUP.0 | Self::LIVE.0 | Self::READY.0,
    );

    /// Wrap a raw mask. Not validated; see [`ProbeGroup::validate`].
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if any bit of `other` is set in `self`.
    #[inline]
    pub const fn intersects(self, other: ProbeGroup) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: ProbeGroup) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check that the mask is non-zero and only uses known groups.
    pub fn validate(self) -> Result<(), HealthzError> {
        if self.0 == 0 {
            return Err(HealthzError::EmptyGroup);
        }

        if self.0 & Self::ALL.0 != self.0 {
            return Err(HealthzError::InvalidGroup(self.0));
        }

        Ok(())
    }
}

impl BitOr for ProbeGroup {
    type Output = ProbeGroup;

    fn bitor(self, rhs: Self) -> Self::Output {
        ProbeGroup(self.0 | rhs.0)
    }
}

impl BitOrAssign for ProbeGroup {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ProbeGroup {
    type Output = ProbeGroup;

    fn bitand(self, rhs: Self) -> Self::Output {
        ProbeGroup(self.0 & rhs.0)
    }
}

impl fmt::Display for ProbeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ProbeGroup, &str); 4] = [
            (ProbeGroup::COMMON, "common"),
            (ProbeGroup::STARTUP, "startup"),
            (ProbeGroup::LIVE, "live"),
            (ProbeGroup::READY, "ready"),
        ];

        let mut first = true;
        for (group, name) in NAMES {
            if self.intersects(group) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }

        let unknown = self.0 & !Self::ALL.0;
        if unknown != 0 {
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{:#x}", unknown)?;
        } else if first {
            write!(f, "none")?;
        }

        Ok(())
    }
}
