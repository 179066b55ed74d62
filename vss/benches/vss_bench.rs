use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prand_types::{KeyPair, ThresholdParams};
use prand_vss::{recover_secret, Deal, SecretPair, Share};

fn insurers(n: u8) -> Vec<KeyPair> {
    (0..n).map(|i| prand_crypto::keypair_from_seed(&[i + 1; 32])).collect()
}

fn deal_construct_bench(c: &mut Criterion) {
    let dealer = prand_crypto::generate_keypair();
    let keys = insurers(7);
    let publics: Vec<_> = keys.iter().map(|k| k.public.clone()).collect();
    let params = ThresholdParams::new(4, 5, 7).unwrap();

    c.bench_function("deal_construct_t4_n7", |b| {
        b.iter(|| {
            Deal::construct(&SecretPair::generate(), &dealer, params, black_box(publics.clone()))
        })
    });
}

fn produce_response_bench(c: &mut Criterion) {
    let dealer = prand_crypto::generate_keypair();
    let keys = insurers(7);
    let publics: Vec<_> = keys.iter().map(|k| k.public.clone()).collect();
    let params = ThresholdParams::new(4, 5, 7).unwrap();
    let deal = Deal::construct(&SecretPair::generate(), &dealer, params, publics).unwrap();

    c.bench_function("produce_response_t4_n7", |b| {
        b.iter(|| deal.produce_response(black_box(3), &keys[3]))
    });
}

fn recover_bench(c: &mut Criterion) {
    let dealer = prand_crypto::generate_keypair();
    let keys = insurers(7);
    let publics: Vec<_> = keys.iter().map(|k| k.public.clone()).collect();
    let params = ThresholdParams::new(4, 5, 7).unwrap();
    let deal = Deal::construct(&SecretPair::generate(), &dealer, params, publics).unwrap();
    let shares: Vec<Share> = (0..4)
        .filter_map(|k| deal.produce_response(k, &keys[k as usize]).ok())
        .map(|(share, _)| share)
        .collect();

    c.bench_function("recover_secret_t4", |b| {
        b.iter(|| recover_secret(&deal, black_box(&shares)))
    });
}

criterion_group!(benches, deal_construct_bench, produce_response_bench, recover_bench);
criterion_main!(benches);
