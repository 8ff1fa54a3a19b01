use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use owned_collections::{LinkedList, TreeMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_put_random_100k(c: &mut Criterion) {
    c.bench_function("tree::put_random_100k", |b| {
        b.iter_batched(
            TreeMap::<u64, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(x, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_put_ascending_100k(c: &mut Criterion) {
    // Sorted input is the rotation-heavy case.
    c.bench_function("tree::put_ascending_100k", |b| {
        b.iter_batched(
            TreeMap::<u64, u64>::new,
            |mut m| {
                for i in 0..100_000u64 {
                    m.put(i, i);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("tree::get_hit_10k_on_100k", |b| {
        let keys: Vec<u64> = lcg(7).take(100_000).collect();
        let mut m = TreeMap::new();
        for (i, &k) in keys.iter().enumerate() {
            m.put(k, i as u64);
        }
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<u64> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n]
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                let _ = black_box(m.get(k));
            }
        })
    });
}

fn bench_remove_first_drain(c: &mut Criterion) {
    c.bench_function("tree::remove_first_drain_50k", |b| {
        b.iter_batched(
            || {
                let mut m = TreeMap::new();
                for (i, x) in lcg(17).take(50_000).enumerate() {
                    m.put(x, i as u64);
                }
                m
            },
            |mut m| {
                while let Ok(e) = m.remove_first() {
                    black_box(e);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_both_ends(c: &mut Criterion) {
    c.bench_function("tree::iter_forward_and_back_100k", |b| {
        let mut m = TreeMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            m.put(x, i as u64);
        }
        b.iter(|| {
            let fwd = m.values().fold(0u64, |a, v| a.wrapping_add(*v));
            let back = m.values().rev().fold(0u64, |a, v| a.wrapping_add(*v));
            black_box((fwd, back))
        })
    });
}

fn bench_list_sort_100k(c: &mut Criterion) {
    c.bench_function("list::sort_by_relink_100k", |b| {
        b.iter_batched(
            || lcg(31).take(100_000).collect::<LinkedList<u64>>(),
            |mut l| {
                l.sort_by(|a, b| a.cmp(b));
                black_box(l)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_put_random_100k, bench_put_ascending_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_get_hit_10k,
              bench_remove_first_drain,
              bench_iter_both_ends,
              bench_list_sort_100k
}
criterion_main!(benches_insert, benches_ops);
