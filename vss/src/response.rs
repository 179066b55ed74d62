//! Insurer responses and revealed shares.

use prand_types::{Digest, KeyPair, Signature};
use serde::{Deserialize, Serialize};

use crate::deal::share_context;
use crate::{Deal, VssError};

const RESPONSE_DOMAIN: &[u8] = b"prand-response";

/// A decrypted share held by an insurer. Kept private until the reveal round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub index: u32,
    pub value: [u8; 32],
}

/// An insurer's signed statement that its share of a deal is well-formed.
/// Reveals nothing about the share itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub deal_id: Digest,
    pub index: u32,
    pub signature: Signature,
}

fn response_message(deal_id: &Digest, index: u32) -> [u8; 36] {
    share_context(deal_id, index)
}

impl Share {
    pub fn to_bytes(&self) -> Result<Vec<u8>, VssError> {
        bincode::serialize(self).map_err(|e| VssError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VssError> {
        bincode::deserialize(bytes).map_err(|e| VssError::Malformed(e.to_string()))
    }
}

impl Response {
    pub fn to_bytes(&self) -> Result<Vec<u8>, VssError> {
        bincode::serialize(self).map_err(|e| VssError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VssError> {
        bincode::deserialize(bytes).map_err(|e| VssError::Malformed(e.to_string()))
    }
}

impl Deal {
    /// Decrypt and check share `index` as insurer `own`, returning the share
    /// together with a signed response.
    ///
    /// Fails if `own` is not the insurer at `index`, if the ciphertext does not
    /// decrypt, or if the decrypted share does not match the commitments.
    pub fn produce_response(&self, index: u32, own: &KeyPair) -> Result<(Share, Response), VssError> {
        let expected = self
            .insurers()
            .get(index as usize)
            .ok_or(VssError::IndexOutOfRange(index))?;
        if *expected != own.public {
            return Err(VssError::NotInsurer(index));
        }

        let value = prand_crypto::decrypt_share(
            self.encrypted_share(index)?,
            self.dealer(),
            &own.private,
            &share_context(self.id(), index),
        )?;
        let share = Share { index, value };
        self.verify_share(&share)?;

        let signature = prand_crypto::sign_message(
            RESPONSE_DOMAIN,
            &response_message(self.id(), index),
            &own.private,
        );
        let response = Response {
            deal_id: *self.id(),
            index,
            signature,
        };
        Ok((share, response))
    }

    /// Check that `response` approves this deal and is signed by the insurer
    /// at its index.
    pub fn verify_response(&self, response: &Response) -> Result<(), VssError> {
        if response.deal_id != *self.id() {
            return Err(VssError::InvalidResponse(response.index));
        }
        let insurer = self
            .insurers()
            .get(response.index as usize)
            .ok_or(VssError::IndexOutOfRange(response.index))?;
        let message = response_message(&response.deal_id, response.index);
        if !prand_crypto::verify_signature(RESPONSE_DOMAIN, &message, &response.signature, insurer) {
            return Err(VssError::InvalidResponse(response.index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{recover_secret, SecretPair};
    use prand_crypto::keypair_from_seed;
    use prand_types::ThresholdParams;

    struct Fixture {
        dealer: KeyPair,
        insurers: Vec<KeyPair>,
        secret: SecretPair,
        deal: Deal,
    }

    fn fixture(t: u32, r: u32, n: u32) -> Fixture {
        let params = ThresholdParams::new(t, r, n).unwrap();
        let dealer = keypair_from_seed(&[1u8; 32]);
        let insurers: Vec<KeyPair> = (0..n as u8).map(|i| keypair_from_seed(&[50 + i; 32])).collect();
        let secret = SecretPair::generate();
        let publics = insurers.iter().map(|k| k.public.clone()).collect();
        let deal = Deal::construct(&secret, &dealer, params, publics).unwrap();
        Fixture {
            dealer,
            insurers,
            secret,
            deal,
        }
    }

    #[test]
    fn every_insurer_gets_a_valid_share() {
        let f = fixture(2, 2, 3);
        for (k, insurer) in f.insurers.iter().enumerate() {
            let (share, response) = f.deal.produce_response(k as u32, insurer).unwrap();
            assert_eq!(share.index, k as u32);
            assert!(f.deal.verify_share(&share).is_ok());
            assert!(f.deal.verify_response(&response).is_ok());
        }
    }

    #[test]
    fn wrong_insurer_is_rejected() {
        let f = fixture(2, 2, 3);
        let err = f.deal.produce_response(0, &f.insurers[1]).unwrap_err();
        assert_eq!(err, VssError::NotInsurer(0));
    }

    #[test]
    fn index_out_of_range_is_rejected() {
        let f = fixture(2, 2, 3);
        let err = f.deal.produce_response(3, &f.insurers[0]).unwrap_err();
        assert_eq!(err, VssError::IndexOutOfRange(3));
    }

    #[test]
    fn response_from_serialized_deal_is_identical() {
        let f = fixture(2, 2, 3);
        let decoded = Deal::from_bytes(&f.deal.to_bytes().unwrap(), f.deal.params()).unwrap();
        let (share_a, resp_a) = f.deal.produce_response(1, &f.insurers[1]).unwrap();
        let (share_b, resp_b) = decoded.produce_response(1, &f.insurers[1]).unwrap();
        assert_eq!(share_a, share_b);
        assert_eq!(resp_a, resp_b);
    }

    #[test]
    fn forged_response_is_rejected() {
        let f = fixture(2, 2, 3);
        let (_, mut response) = f.deal.produce_response(0, &f.insurers[0]).unwrap();
        response.index = 1;
        assert_eq!(
            f.deal.verify_response(&response),
            Err(VssError::InvalidResponse(1))
        );
    }

    #[test]
    fn response_for_other_deal_is_rejected() {
        let a = fixture(2, 2, 3);
        let b = fixture(2, 2, 3);
        let (_, response) = a.deal.produce_response(0, &a.insurers[0]).unwrap();
        assert!(b.deal.verify_response(&response).is_err());
    }

    #[test]
    fn tampered_share_fails_verification() {
        let f = fixture(2, 2, 3);
        let (mut share, _) = f.deal.produce_response(0, &f.insurers[0]).unwrap();
        share.value[0] ^= 1;
        assert!(f.deal.verify_share(&share).is_err());
    }

    #[test]
    fn threshold_shares_recover_the_secret() {
        let f = fixture(3, 3, 5);
        let shares: Vec<Share> = [4usize, 0, 2]
            .iter()
            .map(|&k| f.deal.produce_response(k as u32, &f.insurers[k]).unwrap().0)
            .collect();
        let recovered = recover_secret(&f.deal, &shares).unwrap();
        assert_eq!(SecretPair::from_secret(recovered).public(), f.secret.public());
    }

    #[test]
    fn too_few_shares_cannot_recover() {
        let f = fixture(3, 3, 5);
        let share = f.deal.produce_response(0, &f.insurers[0]).unwrap().0;
        let err = recover_secret(&f.deal, &[share.clone(), share]).unwrap_err();
        assert_eq!(err, VssError::InsufficientShares { need: 3, have: 1 });
    }

    #[test]
    fn invalid_shares_are_skipped_during_recovery() {
        let f = fixture(2, 2, 3);
        let mut bad = f.deal.produce_response(0, &f.insurers[0]).unwrap().0;
        bad.value[1] ^= 0x40;
        let good: Vec<Share> = (1..3)
            .map(|k| f.deal.produce_response(k, &f.insurers[k as usize]).unwrap().0)
            .collect();
        let shares = vec![bad, good[0].clone(), good[1].clone()];
        assert!(recover_secret(&f.deal, &shares).is_ok());
    }

    #[test]
    fn share_and_response_bytes_roundtrip() {
        let f = fixture(2, 2, 3);
        let (share, response) = f.deal.produce_response(2, &f.insurers[2]).unwrap();
        assert_eq!(Share::from_bytes(&share.to_bytes().unwrap()).unwrap(), share);
        assert_eq!(
            Response::from_bytes(&response.to_bytes().unwrap()).unwrap(),
            response
        );
        assert_eq!(f.deal.dealer(), &f.dealer.public);
    }
}
