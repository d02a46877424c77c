use chain_hashmap::{Mapping, Set};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// Capacity is fixed, so chains average N / CAPACITY entries.
const CAPACITY: usize = 1_024;
const N: usize = 10_000;

fn filled(seed: u64) -> (Mapping<String, u64>, Vec<String>) {
    let mut m = Mapping::with_capacity(CAPACITY).unwrap();
    let keys: Vec<_> = lcg(seed).take(N).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.add(k.clone(), i as u64).unwrap();
    }
    (m, keys)
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("mapping::add_10k", |b| {
        b.iter_batched(
            || Mapping::<String, u64>::with_capacity(CAPACITY).unwrap(),
            |mut m| {
                for (i, x) in lcg(1).take(N).enumerate() {
                    m.add(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("mapping::get_hit", |b| {
        let (m, keys) = filled(7);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()).unwrap());
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("mapping::get_miss", |b| {
        let (m, _) = filled(11);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(&k).unwrap());
        })
    });
}

fn bench_filter_map_reduce(c: &mut Criterion) {
    c.bench_function("mapping::filter_map_reduce_10k", |b| {
        let (m, _) = filled(3);
        b.iter(|| {
            let evens = m.filter(|_, v| v % 2 == 0);
            let doubled = evens.map(|v| v * 2).unwrap();
            black_box(doubled.reduce(|acc, v| acc.wrapping_add(*v), 0u64))
        })
    });
}

fn bench_set_concat(c: &mut Criterion) {
    c.bench_function("set::concat_2x5k", |b| {
        let mut a = Set::with_capacity(CAPACITY).unwrap();
        let mut z = Set::with_capacity(CAPACITY).unwrap();
        for x in lcg(5).take(N / 2) {
            a.add(x).unwrap();
        }
        for x in lcg(9).take(N / 2) {
            z.add(x).unwrap();
        }
        b.iter(|| black_box(a.concat(&z).unwrap()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_add, bench_get_hit, bench_get_miss, bench_filter_map_reduce, bench_set_concat
}
criterion_main!(benches);
