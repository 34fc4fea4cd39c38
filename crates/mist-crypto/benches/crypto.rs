use mist_crypto::{derive_keys, seal_block, CipherSession, SymmetricKey};
use secrecy::SecretString;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_ctr_apply(bencher: divan::Bencher, size: usize) {
    let key = [0x42u8; 32];
    let nonce = [0x24u8; 16];
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let mut session = CipherSession::new(divan::black_box(&key), &nonce).unwrap();
            session.apply(divan::black_box(&data))
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_seal_block(bencher: divan::Bencher, size: usize) {
    let key = SymmetricKey::from_bytes([0x42u8; 32]);
    let archive_id = [0xABu8; 32];
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            seal_block(
                divan::black_box(&key),
                0,
                divan::black_box(&archive_id),
                divan::black_box(&data),
            )
            .unwrap()
        });
}

#[divan::bench]
fn bench_derive_keys() {
    let passphrase = SecretString::from("correct horse");
    let salt = [7u8; 32];
    derive_keys(divan::black_box(&passphrase), divan::black_box(&salt)).unwrap();
}

fn main() {
    divan::main();
}
