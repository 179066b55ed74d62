//! The client driver and transcript verification against real server
//! sessions.

mod common;

use std::thread;

use common::{client_key, roster, run_threaded, server_key, server_session, Cluster};
use prand_messages::{Message, R2};
use prand_nullables::{channel_pair, NullSeeds};
use prand_protocol::{
    envelope, verify_transcript, ClientError, ClientSession, Phase, SessionConfig,
};
use prand_types::{Seed, ThresholdParams};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn params() -> ThresholdParams {
    ThresholdParams::new(2, 2, 3).unwrap()
}

fn client() -> ClientSession {
    let mut seeds = NullSeeds::constant([0xAA; 32]);
    ClientSession::new(client_key(), roster(3), params(), &mut seeds).unwrap()
}

fn relay(cluster: &mut Cluster, message: &[u8]) -> Vec<Option<Vec<u8>>> {
    cluster
        .sessions
        .iter_mut()
        .map(|s| s.handle(message).ok())
        .collect()
}

/// Run rounds 1 to 3 between `client` and `cluster`, returning the R3 replies.
fn through_round_three(client: &mut ClientSession, cluster: &mut Cluster) -> Vec<Option<Vec<u8>>> {
    let i1 = client.start().unwrap();
    let r1s = relay(cluster, &i1);
    let i2 = client.on_r1s(&r1s).unwrap();
    let r2s = relay(cluster, &i2);
    let i3 = client.on_r2s(&r2s).unwrap();
    relay(cluster, &i3)
}

// ---------------------------------------------------------------------------
// 1. Full runs
// ---------------------------------------------------------------------------

#[test]
fn threaded_run_produces_verifiable_output() {
    let (output, transcript, outcomes) = run_threaded(3, SessionConfig::new(params()));

    assert_eq!(output.dealers, vec![0, 1, 2]);
    assert_eq!(
        verify_transcript(params(), &roster(3), &client_key().public, &transcript).unwrap(),
        output
    );
    for outcome in outcomes {
        assert_eq!(outcome.responses, 3);
        assert_eq!(outcome.shares_revealed, 3);
    }
}

#[test]
fn silent_server_is_left_out() {
    let config = SessionConfig::new(params());
    let mut ends = Vec::new();
    let mut servers = Vec::new();
    for i in 0..3 {
        if i == 1 {
            ends.push(None);
            continue;
        }
        let (client_end, mut server_end) = channel_pair();
        let mut session = server_session(i, 3, config);
        servers.push(thread::spawn(move || session.serve(&mut server_end)));
        ends.push(Some(client_end));
    }

    let (output, transcript) = client().run(&mut ends).unwrap();
    assert_eq!(output.dealers, vec![0, 2]);
    assert!(transcript.r4s[1].is_empty());
    for server in servers {
        assert!(server.join().unwrap().is_ok());
    }
}

#[test]
fn stepwise_run_matches_threaded_shape() {
    let mut cluster = Cluster::with_params(3, params());
    let mut client = client();
    let r3s = through_round_three(&mut client, &mut cluster);
    let i4 = client.on_r3s(&r3s).unwrap();
    let r4s = relay(&mut cluster, &i4);
    let output = client.on_r4s(&r4s).unwrap();

    assert_eq!(output.dealers, vec![0, 1, 2]);
    assert!(cluster.sessions.iter().all(|s| s.phase() == Phase::Done));
    assert_eq!(
        verify_transcript(params(), &roster(3), &client_key().public, client.transcript()).unwrap(),
        output
    );
}

// ---------------------------------------------------------------------------
// 2. Client-side rejection
// ---------------------------------------------------------------------------

#[test]
fn r2_not_matching_its_commitment_is_dropped() {
    let mut cluster = Cluster::with_params(3, params());
    let mut client = client();
    let i1 = client.start().unwrap();
    let r1s = relay(&mut cluster, &i1);
    let i2 = client.on_r1s(&r1s).unwrap();
    let mut r2s = relay(&mut cluster, &i2);

    // Server 2 reveals a seed other than the one it committed to.
    let honest = r2s[2].take().unwrap();
    let Message::R2(r2) = cluster.open(2, &honest) else {
        panic!("expected R2");
    };
    let forged = R2 {
        rs: Seed([0x99; 32]),
        ..r2
    };
    r2s[2] = Some(envelope::encode(&server_key(2), &Message::R2(forged)).unwrap());

    let i3 = client.on_r2s(&r2s).unwrap();
    let Message::I3(i3) = envelope::decode(&client_key().public, &i3).unwrap() else {
        panic!("expected I3");
    };
    assert!(!i3.r2s[0].is_empty());
    assert!(!i3.r2s[1].is_empty());
    assert!(i3.r2s[2].is_empty());
}

#[test]
fn too_few_responses_leave_no_dealers() {
    let mut cluster = Cluster::with_params(3, params());
    let mut client = client();
    let mut r3s = through_round_three(&mut client, &mut cluster);
    r3s[1] = None;
    r3s[2] = None;

    assert!(matches!(client.on_r3s(&r3s), Err(ClientError::NoDealers(2))));
}

#[test]
fn withheld_shares_make_the_run_fail() {
    let mut cluster = Cluster::with_params(3, params());
    let mut client = client();
    let r3s = through_round_three(&mut client, &mut cluster);
    let i4 = client.on_r3s(&r3s).unwrap();
    let mut r4s = relay(&mut cluster, &i4);
    r4s[0] = None;
    r4s[1] = None;

    assert!(matches!(
        client.on_r4s(&r4s),
        Err(ClientError::Unrecoverable { .. })
    ));
}

#[test]
fn one_withheld_reveal_is_tolerated() {
    let mut cluster = Cluster::with_params(3, params());
    let mut client = client();
    let r3s = through_round_three(&mut client, &mut cluster);
    let i4 = client.on_r3s(&r3s).unwrap();
    let mut r4s = relay(&mut cluster, &i4);
    r4s[0] = None;

    let output = client.on_r4s(&r4s).unwrap();
    assert_eq!(output.dealers, vec![0, 1, 2]);
}

// ---------------------------------------------------------------------------
// 3. Transcript verification
// ---------------------------------------------------------------------------

#[test]
fn transcript_with_dropped_responses_fails_verification() {
    let (_, mut transcript, _) = run_threaded(3, SessionConfig::new(params()));
    transcript.r3s[0].clear();
    transcript.r3s[1].clear();

    let err = verify_transcript(params(), &roster(3), &client_key().public, &transcript).unwrap_err();
    assert!(matches!(err, ClientError::Transcript(_)));
}

#[test]
fn transcript_with_forged_client_message_fails_verification() {
    let (_, mut transcript, _) = run_threaded(3, SessionConfig::new(params()));
    let last = transcript.i4.len() - 1;
    transcript.i4[last] ^= 0x01;

    let err = verify_transcript(params(), &roster(3), &client_key().public, &transcript).unwrap_err();
    assert!(matches!(err, ClientError::Envelope(_)));
}

#[test]
fn transcript_under_wrong_parameters_fails_verification() {
    let (_, transcript, _) = run_threaded(3, SessionConfig::new(params()));
    let other = ThresholdParams::new(1, 1, 3).unwrap();
    assert!(verify_transcript(other, &roster(3), &client_key().public, &transcript).is_err());
}
