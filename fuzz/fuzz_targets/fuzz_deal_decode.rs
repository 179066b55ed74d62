#![no_main]

use libfuzzer_sys::fuzz_target;
use prand_crypto::keypair_from_seed;
use prand_types::ThresholdParams;
use prand_vss::{Deal, Response, Share};

fuzz_target!(|data: &[u8]| {
    let Ok(params) = ThresholdParams::new(2, 2, 3) else {
        return;
    };

    // A decoded deal must be safe to query and answer.
    if let Ok(deal) = Deal::from_bytes(data, params) {
        let _ = deal.public_key();
        let insurer = keypair_from_seed(&[1u8; 32]);
        for index in 0..4 {
            let _ = deal.produce_response(index, &insurer);
        }
        if let Ok(share) = Share::from_bytes(data) {
            let _ = deal.verify_share(&share);
            let _ = prand_vss::recover_secret(&deal, &[share]);
        }
    }

    let _ = Response::from_bytes(data);
});
