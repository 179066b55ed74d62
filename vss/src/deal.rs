//! Deal construction, serialization, and share verification.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use prand_types::{Digest, KeyPair, PublicKey, ThresholdParams};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::poly::{eval, eval_commitments, share_x};
use crate::{Share, VssError};

const DEAL_DOMAIN: &[u8] = b"prand-deal";

/// A freshly generated one-time secret and its public key. The secret is the
/// value a dealer contributes to the session.
pub struct SecretPair {
    secret: Scalar,
    public: RistrettoPoint,
}

impl SecretPair {
    pub fn generate() -> Self {
        Self::from_secret(Scalar::random(&mut OsRng))
    }

    pub fn from_secret(secret: Scalar) -> Self {
        Self {
            secret,
            public: secret * RISTRETTO_BASEPOINT_POINT,
        }
    }

    pub fn public(&self) -> RistrettoPoint {
        self.public
    }
}

/// A dealt secret: public commitments plus one encrypted share per insurer.
///
/// Immutable once constructed. The wire form is produced by [`Deal::to_bytes`]
/// and read back with [`Deal::from_bytes`], which validates the shape against
/// the configured threshold parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deal {
    dealer: PublicKey,
    params: ThresholdParams,
    insurers: Vec<PublicKey>,
    commitments: Vec<RistrettoPoint>,
    encrypted_shares: Vec<Vec<u8>>,
    id: Digest,
}

#[derive(Serialize, Deserialize)]
struct WireDeal {
    dealer: PublicKey,
    params: ThresholdParams,
    insurers: Vec<PublicKey>,
    commitments: Vec<[u8; 32]>,
    encrypted_shares: Vec<Vec<u8>>,
}

fn deal_id(
    dealer: &PublicKey,
    params: &ThresholdParams,
    insurers: &[PublicKey],
    commitments: &[RistrettoPoint],
) -> Digest {
    let compressed: Vec<[u8; 32]> = commitments.iter().map(|c| c.compress().to_bytes()).collect();
    let params_bytes = params.to_bytes();
    let mut parts: Vec<&[u8]> = vec![DEAL_DOMAIN, dealer.as_bytes().as_slice(), params_bytes.as_slice()];
    parts.extend(insurers.iter().map(|k| k.as_bytes().as_slice()));
    parts.extend(compressed.iter().map(|c| c.as_slice()));
    Digest(prand_crypto::blake2b_256_multi(&parts))
}

/// Key-derivation context binding a share ciphertext to its deal and index.
pub(crate) fn share_context(id: &Digest, index: u32) -> [u8; 36] {
    let mut ctx = [0u8; 36];
    ctx[..32].copy_from_slice(id.as_bytes());
    ctx[32..].copy_from_slice(&index.to_le_bytes());
    ctx
}

impl Deal {
    /// Split `secret` among `insurers` under `params`.
    ///
    /// Share `k` is `f(k + 1)` for a random polynomial `f` of degree `t - 1`
    /// with `f(0) = secret`, encrypted to `insurers[k]` with the dealer's
    /// long-term key.
    pub fn construct(
        secret: &SecretPair,
        dealer: &KeyPair,
        params: ThresholdParams,
        insurers: Vec<PublicKey>,
    ) -> Result<Self, VssError> {
        params
            .check_shape()
            .map_err(|e| VssError::Malformed(e.to_string()))?;
        if insurers.len() != params.n as usize {
            return Err(VssError::InsurerCount {
                expected: params.n as usize,
                got: insurers.len(),
            });
        }

        let mut coeffs = Vec::with_capacity(params.t as usize);
        coeffs.push(secret.secret);
        coeffs.extend((1..params.t).map(|_| Scalar::random(&mut OsRng)));
        let commitments: Vec<RistrettoPoint> =
            coeffs.iter().map(|a| a * RISTRETTO_BASEPOINT_POINT).collect();

        let id = deal_id(&dealer.public, &params, &insurers, &commitments);

        let mut encrypted_shares = Vec::with_capacity(insurers.len());
        for (k, insurer) in insurers.iter().enumerate() {
            let index = k as u32;
            let share = eval(&coeffs, share_x(index));
            encrypted_shares.push(prand_crypto::encrypt_share(
                share.as_bytes(),
                insurer,
                &dealer.private,
                &share_context(&id, index),
            )?);
        }

        Ok(Self {
            dealer: dealer.public.clone(),
            params,
            insurers,
            commitments,
            encrypted_shares,
            id,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, VssError> {
        let wire = WireDeal {
            dealer: self.dealer.clone(),
            params: self.params,
            insurers: self.insurers.clone(),
            commitments: self
                .commitments
                .iter()
                .map(|c| c.compress().to_bytes())
                .collect(),
            encrypted_shares: self.encrypted_shares.clone(),
        };
        bincode::serialize(&wire).map_err(|e| VssError::Serialization(e.to_string()))
    }

    /// Decode a deal, rejecting it unless it was dealt under `params` and
    /// every vector has the length those parameters imply.
    pub fn from_bytes(bytes: &[u8], params: ThresholdParams) -> Result<Self, VssError> {
        params
            .check_shape()
            .map_err(|e| VssError::Malformed(e.to_string()))?;
        let wire: WireDeal =
            bincode::deserialize(bytes).map_err(|e| VssError::Malformed(e.to_string()))?;

        if wire.params != params {
            return Err(VssError::ParamsMismatch {
                expected: params,
                found: wire.params,
            });
        }
        if wire.insurers.len() != params.n as usize {
            return Err(VssError::InsurerCount {
                expected: params.n as usize,
                got: wire.insurers.len(),
            });
        }
        if wire.encrypted_shares.len() != params.n as usize {
            return Err(VssError::Malformed(format!(
                "expected {} encrypted shares, got {}",
                params.n,
                wire.encrypted_shares.len()
            )));
        }
        if wire.commitments.len() != params.t as usize {
            return Err(VssError::Malformed(format!(
                "expected {} commitments, got {}",
                params.t,
                wire.commitments.len()
            )));
        }

        let commitments = wire
            .commitments
            .iter()
            .map(|bytes| {
                CompressedRistretto(*bytes)
                    .decompress()
                    .ok_or_else(|| VssError::Malformed("commitment is not a valid point".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = deal_id(&wire.dealer, &wire.params, &wire.insurers, &commitments);
        Ok(Self {
            dealer: wire.dealer,
            params: wire.params,
            insurers: wire.insurers,
            commitments,
            encrypted_shares: wire.encrypted_shares,
            id,
        })
    }

    /// Unique identifier binding dealer, parameters, insurers and commitments.
    pub fn id(&self) -> &Digest {
        &self.id
    }

    pub fn dealer(&self) -> &PublicKey {
        &self.dealer
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    pub fn insurers(&self) -> &[PublicKey] {
        &self.insurers
    }

    /// Public key of the dealt secret (the constant-term commitment).
    pub fn public_key(&self) -> RistrettoPoint {
        self.commitments[0]
    }

    pub(crate) fn encrypted_share(&self, index: u32) -> Result<&[u8], VssError> {
        self.encrypted_shares
            .get(index as usize)
            .map(Vec::as_slice)
            .ok_or(VssError::IndexOutOfRange(index))
    }

    /// Check a share against the commitments and return its scalar value.
    pub fn verify_share(&self, share: &Share) -> Result<Scalar, VssError> {
        if share.index >= self.params.n {
            return Err(VssError::IndexOutOfRange(share.index));
        }
        let value = Option::<Scalar>::from(Scalar::from_canonical_bytes(share.value))
            .ok_or(VssError::InvalidShare(share.index))?;
        let expected = eval_commitments(&self.commitments, share_x(share.index));
        if value * RISTRETTO_BASEPOINT_POINT != expected {
            return Err(VssError::InvalidShare(share.index));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prand_crypto::keypair_from_seed;

    fn insurers(n: u8) -> Vec<KeyPair> {
        (0..n).map(|i| keypair_from_seed(&[100 + i; 32])).collect()
    }

    fn make_deal(params: ThresholdParams, keys: &[KeyPair]) -> Deal {
        let dealer = keypair_from_seed(&[1u8; 32]);
        let publics = keys.iter().map(|k| k.public.clone()).collect();
        Deal::construct(&SecretPair::generate(), &dealer, params, publics).unwrap()
    }

    #[test]
    fn construct_shapes_follow_params() {
        let params = ThresholdParams::new(2, 2, 3).unwrap();
        let deal = make_deal(params, &insurers(3));
        assert_eq!(deal.insurers().len(), 3);
        assert_eq!(deal.commitments.len(), 2);
        assert_eq!(deal.encrypted_shares.len(), 3);
    }

    #[test]
    fn construct_rejects_wrong_insurer_count() {
        let params = ThresholdParams::new(2, 2, 3).unwrap();
        let dealer = keypair_from_seed(&[1u8; 32]);
        let publics = insurers(2).iter().map(|k| k.public.clone()).collect();
        let err = Deal::construct(&SecretPair::generate(), &dealer, params, publics).unwrap_err();
        assert_eq!(err, VssError::InsurerCount { expected: 3, got: 2 });
    }

    #[test]
    fn bytes_roundtrip_preserves_id() {
        let params = ThresholdParams::new(2, 3, 4).unwrap();
        let deal = make_deal(params, &insurers(4));
        let decoded = Deal::from_bytes(&deal.to_bytes().unwrap(), params).unwrap();
        assert_eq!(decoded, deal);
        assert_eq!(decoded.id(), deal.id());
    }

    #[test]
    fn from_bytes_rejects_other_params() {
        let params = ThresholdParams::new(2, 2, 3).unwrap();
        let deal = make_deal(params, &insurers(3));
        let other = ThresholdParams::new(1, 2, 3).unwrap();
        let err = Deal::from_bytes(&deal.to_bytes().unwrap(), other).unwrap_err();
        assert!(matches!(err, VssError::ParamsMismatch { .. }));
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let params = ThresholdParams::default();
        let err = Deal::from_bytes(b"definitely not a deal", params).unwrap_err();
        assert!(matches!(err, VssError::Malformed(_)));
    }

    #[test]
    fn from_bytes_rejects_truncated_encoding() {
        let params = ThresholdParams::default();
        let bytes = make_deal(params, &insurers(3)).to_bytes().unwrap();
        let err = Deal::from_bytes(&bytes[..bytes.len() / 2], params).unwrap_err();
        assert!(matches!(err, VssError::Malformed(_)));
    }

    #[test]
    fn distinct_deals_have_distinct_ids() {
        let params = ThresholdParams::default();
        let keys = insurers(3);
        assert_ne!(make_deal(params, &keys).id(), make_deal(params, &keys).id());
    }

    #[test]
    fn public_key_matches_secret() {
        let params = ThresholdParams::default();
        let dealer = keypair_from_seed(&[1u8; 32]);
        let secret = SecretPair::generate();
        let publics = insurers(3).iter().map(|k| k.public.clone()).collect();
        let deal = Deal::construct(&secret, &dealer, params, publics).unwrap();
        assert_eq!(deal.public_key(), secret.public());
    }
}
