//! Threshold parameters `(t, r, n)` shared out of band by client and servers.

use serde::{Deserialize, Serialize};

use crate::PrandError;

/// Threshold parameters of a deal.
///
/// - `n`: number of insurers picked per deal.
/// - `r`: minimum valid responses before a deal is considered usable.
/// - `t`: minimum shares needed to reconstruct a dealt secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThresholdParams {
    pub t: u32,
    pub r: u32,
    pub n: u32,
}

impl ThresholdParams {
    pub fn new(t: u32, r: u32, n: u32) -> Result<Self, PrandError> {
        let params = Self { t, r, n };
        params.check_shape()?;
        Ok(params)
    }

    /// Check `1 <= t <= r <= n`.
    pub fn check_shape(&self) -> Result<(), PrandError> {
        if self.t == 0 {
            return Err(PrandError::InvalidThreshold("t must be at least 1".into()));
        }
        if self.t > self.r {
            return Err(PrandError::InvalidThreshold(format!(
                "t ({}) exceeds r ({})",
                self.t, self.r
            )));
        }
        if self.r > self.n {
            return Err(PrandError::InvalidThreshold(format!(
                "r ({}) exceeds n ({})",
                self.r, self.n
            )));
        }
        Ok(())
    }

    /// Check `1 <= t <= r <= n <= roster_len`.
    pub fn validate(&self, roster_len: usize) -> Result<(), PrandError> {
        self.check_shape()?;
        if self.n as usize > roster_len {
            return Err(PrandError::InvalidThreshold(format!(
                "n ({}) exceeds roster size ({roster_len})",
                self.n
            )));
        }
        Ok(())
    }

    /// Canonical byte encoding, used in hashed transcripts.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..4].copy_from_slice(&self.t.to_le_bytes());
        out[4..8].copy_from_slice(&self.r.to_le_bytes());
        out[8..].copy_from_slice(&self.n.to_le_bytes());
        out
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { t: 2, r: 2, n: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_two_two_three() {
        let p = ThresholdParams::default();
        assert_eq!((p.t, p.r, p.n), (2, 2, 3));
        assert!(p.validate(3).is_ok());
    }

    #[test]
    fn zero_t_rejected() {
        assert!(ThresholdParams::new(0, 1, 1).is_err());
    }

    #[test]
    fn t_above_r_rejected() {
        assert!(ThresholdParams::new(3, 2, 3).is_err());
    }

    #[test]
    fn r_above_n_rejected() {
        assert!(ThresholdParams::new(1, 4, 3).is_err());
    }

    #[test]
    fn n_above_roster_rejected() {
        let p = ThresholdParams::new(2, 2, 5).unwrap();
        let err = p.validate(4).unwrap_err();
        assert!(matches!(err, PrandError::InvalidThreshold(_)));
    }

    #[test]
    fn to_bytes_is_little_endian() {
        let p = ThresholdParams { t: 1, r: 2, n: 3 };
        assert_eq!(p.to_bytes(), [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
    }
}
