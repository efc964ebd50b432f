use core::hash::BuildHasher;
use core::hint::black_box;

use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use flat_hash::FlatHashMap;
use siphasher::sip::SipHasher;

#[derive(Clone, Default)]
struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

const SIZES: &[usize] = &[
    ((1 << 10) as f32 * 0.87) as usize,
    ((1 << 15) as f32 * 0.87) as usize,
];

fn make_keys(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("key_{i}")).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &size in SIZES {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("flat_hash/{size}"), |b| {
            b.iter(|| {
                let mut map = FlatHashMap::with_hasher(SipHashBuilder);
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u64);
                }
                black_box(map)
            })
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                let mut map = std::collections::HashMap::with_hasher(SipHashBuilder);
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u64);
                }
                black_box(map)
            })
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut map = hashbrown::HashMap::with_hasher(SipHashBuilder);
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u64);
                }
                black_box(map)
            })
        });
    }

    group.finish();
}

fn bench_lookup_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_hit");

    for &size in SIZES {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        let mut flat = FlatHashMap::with_hasher(SipHashBuilder);
        let mut std_map = std::collections::HashMap::with_hasher(SipHashBuilder);
        let mut brown = hashbrown::HashMap::with_hasher(SipHashBuilder);
        for (i, key) in keys.iter().enumerate() {
            flat.insert(key.clone(), i as u64);
            std_map.insert(key.clone(), i as u64);
            brown.insert(key.clone(), i as u64);
        }

        group.bench_function(format!("flat_hash/{size}"), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*flat.get(key).unwrap());
                }
                black_box(sum)
            })
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*std_map.get(key).unwrap());
                }
                black_box(sum)
            })
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*brown.get(key).unwrap());
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

fn bench_remove_half(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_half");

    for &size in SIZES {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64 / 2));

        group.bench_function(format!("flat_hash/{size}"), |b| {
            b.iter_with_setup(
                || {
                    let mut map = FlatHashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.iter().enumerate() {
                        map.insert(key.clone(), i as u64);
                    }
                    map
                },
                |mut map| {
                    for key in keys.iter().step_by(2) {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
            )
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter_with_setup(
                || {
                    let mut map = std::collections::HashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.iter().enumerate() {
                        map.insert(key.clone(), i as u64);
                    }
                    map
                },
                |mut map| {
                    for key in keys.iter().step_by(2) {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
            )
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_with_setup(
                || {
                    let mut map = hashbrown::HashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.iter().enumerate() {
                        map.insert(key.clone(), i as u64);
                    }
                    map
                },
                |mut map| {
                    for key in keys.iter().step_by(2) {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup_hit, bench_remove_half);
criterion_main!(benches);
