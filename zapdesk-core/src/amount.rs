//! Amounts in satoshis and millisatoshis.
//!
//! Callers think in sats; LNURL-pay speaks millisats (`1 sat = 1000 msat`).
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::ZapdeskCoreError;

pub const MSAT_PER_SAT: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sats(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Millisats(pub u64);

impl Sats {
    pub fn to_msat(self) -> Result<Millisats, ZapdeskCoreError> {
        self.0
            .checked_mul(MSAT_PER_SAT)
            .map(Millisats)
            .ok_or(ZapdeskCoreError::AmountOverflow(self.0))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Millisats {
    /// Whole sats, rounding down.
    pub const fn to_sat_floor(self) -> Sats {
        Sats(self.0 / MSAT_PER_SAT)
    }

    /// Whole sats, rounding up.
    pub const fn to_sat_ceil(self) -> Sats {
        Sats(self.0.div_ceil(MSAT_PER_SAT))
    }
}

impl From<u64> for Sats {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl From<u64> for Millisats {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl Display for Sats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

impl Display for Millisats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} msat", self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Millisats, Sats};

    #[test]
    fn test_sat_to_msat() -> anyhow::Result<()> {
        assert_eq!(Millisats(100_000), Sats(100).to_msat()?);
        assert_eq!(Millisats(0), Sats(0).to_msat()?);
        Ok(())
    }

    #[test]
    fn test_sat_to_msat_overflow() {
        assert!(Sats(u64::MAX).to_msat().is_err());
        assert!(Sats(u64::MAX / 1_000 + 1).to_msat().is_err());
    }

    #[test]
    fn test_msat_to_sat_rounding() {
        assert_eq!(Sats(1), Millisats(1_999).to_sat_floor());
        assert_eq!(Sats(2), Millisats(1_001).to_sat_ceil());
        assert_eq!(Sats(1), Millisats(1_000).to_sat_ceil());
    }

    #[test]
    fn test_display() {
        assert_eq!("21 sat", Sats(21).to_string());
        assert_eq!("21000 msat", Millisats(21_000).to_string());
    }
}
