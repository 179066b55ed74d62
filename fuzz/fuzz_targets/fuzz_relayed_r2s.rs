#![no_main]

//! Drive a server session to round 3 and hand it an I3 whose relayed R2
//! slots are attacker-controlled. The session may fail, but must not panic.

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use prand_crypto::{keypair_from_seed, StreamSeedSource};
use prand_messages::{Message, I1, I2, I3};
use prand_protocol::{envelope, ServerIdentity, ServerSession, SessionConfig};
use prand_types::{Roster, Seed, ThresholdParams};

fuzz_target!(|r2s: Vec<Vec<u8>>| {
    let servers: Vec<_> = (1..=3u8).map(|i| keypair_from_seed(&[i; 32])).collect();
    let Ok(roster) = Roster::new(servers.iter().map(|k| k.public.clone()).collect()) else {
        return;
    };
    let client = keypair_from_seed(&[0xC1; 32]);
    let Ok(identity) =
        ServerIdentity::new(0, keypair_from_seed(&[1; 32]), roster, client.public.clone())
    else {
        return;
    };
    let Ok(params) = ThresholdParams::new(2, 2, 3) else {
        return;
    };
    let Ok(mut session) = ServerSession::with_seed_source(
        Arc::new(identity),
        SessionConfig::new(params),
        Box::new(StreamSeedSource::from_key([5; 32])),
    ) else {
        return;
    };

    let rc = Seed([9; 32]);
    let messages = [
        Message::I1(I1 {
            hrc: prand_crypto::commit(&rc),
        }),
        Message::I2(I2 { rc }),
        Message::I3(I3 { r2s }),
    ];
    for message in &messages {
        let Ok(bytes) = envelope::encode(&client, message) else {
            return;
        };
        if session.handle(&bytes).is_err() {
            return;
        }
    }
});
