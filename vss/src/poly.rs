//! Polynomial evaluation, Feldman commitment evaluation, and Lagrange recovery.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;

use crate::{Deal, Share, VssError};

/// The x-coordinate assigned to share index `index`. Zero is reserved for the secret.
pub(crate) fn share_x(index: u32) -> Scalar {
    Scalar::from(index as u64 + 1)
}

/// Horner evaluation of `Σ coeffs[j] x^j`.
pub(crate) fn eval(coeffs: &[Scalar], x: Scalar) -> Scalar {
    coeffs
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, coeff| acc * x + coeff)
}

/// Evaluate the committed polynomial in the exponent: `Σ C_j x^j`.
pub(crate) fn eval_commitments(commitments: &[RistrettoPoint], x: Scalar) -> RistrettoPoint {
    commitments
        .iter()
        .rev()
        .fold(RistrettoPoint::identity(), |acc, c| acc * x + c)
}

/// Recover a deal's secret from at least `t` revealed shares.
///
/// Shares that fail verification against the deal commitments are ignored,
/// as are repeated indices. The recovered value is checked against the
/// deal's public key before it is returned.
pub fn recover_secret(deal: &Deal, shares: &[Share]) -> Result<Scalar, VssError> {
    let need = deal.params().t as usize;
    let mut points: Vec<(Scalar, Scalar)> = Vec::with_capacity(need);
    let mut seen: Vec<u32> = Vec::with_capacity(need);

    for share in shares {
        if points.len() == need {
            break;
        }
        if seen.contains(&share.index) {
            continue;
        }
        let Ok(value) = deal.verify_share(share) else {
            continue;
        };
        seen.push(share.index);
        points.push((share_x(share.index), value));
    }

    if points.len() < need {
        return Err(VssError::InsufficientShares {
            need,
            have: points.len(),
        });
    }

    let mut secret = Scalar::ZERO;
    for (i, (xi, yi)) in points.iter().enumerate() {
        let mut num = Scalar::ONE;
        let mut den = Scalar::ONE;
        for (j, (xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            num *= xj;
            den *= xj - xi;
        }
        secret += yi * num * den.invert();
    }

    if secret * RISTRETTO_BASEPOINT_POINT != deal.public_key() {
        return Err(VssError::Malformed(
            "recovered secret does not match the deal public key".into(),
        ));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_constant_polynomial() {
        let c = Scalar::from(9u64);
        assert_eq!(eval(&[c], Scalar::from(5u64)), c);
    }

    #[test]
    fn eval_matches_direct_computation() {
        // f(x) = 3 + 2x + x^2, f(4) = 27
        let coeffs = [Scalar::from(3u64), Scalar::from(2u64), Scalar::ONE];
        assert_eq!(eval(&coeffs, Scalar::from(4u64)), Scalar::from(27u64));
    }

    #[test]
    fn commitments_evaluate_in_the_exponent() {
        let coeffs = [Scalar::from(11u64), Scalar::from(5u64), Scalar::from(7u64)];
        let commitments: Vec<RistrettoPoint> = coeffs
            .iter()
            .map(|c| c * RISTRETTO_BASEPOINT_POINT)
            .collect();
        let x = share_x(2);
        assert_eq!(
            eval_commitments(&commitments, x),
            eval(&coeffs, x) * RISTRETTO_BASEPOINT_POINT
        );
    }

    #[test]
    fn share_x_skips_zero() {
        assert_eq!(share_x(0), Scalar::ONE);
        assert_eq!(share_x(4), Scalar::from(5u64));
    }
}
