#![no_main]

use libfuzzer_sys::fuzz_target;
use prand_types::PublicKey;

fuzz_target!(|data: &[u8]| {
    // Opening an envelope must never panic, whatever the bytes.
    let sender = PublicKey([7u8; 32]);
    let _ = prand_protocol::envelope::decode(&sender, data);

    // Raw message payloads, as they appear once a signature checks out.
    let _ = bincode::deserialize::<prand_messages::Message>(data);
});
