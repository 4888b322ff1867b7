use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use halo2_msm::ff::Field;
use halo2_msm::group::{prime::PrimeCurveAffine, Curve, Group};
use halo2_msm::halo2curves::bn256::{Fr, G1Affine, G1};
use halo2_msm::{generate_point_table, MsmContext};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rayon::prelude::*;

const SIZES: [u32; 4] = [10, 14, 16, 18];

fn generate_points(n: usize, rng: &mut ChaCha20Rng) -> Vec<G1Affine> {
    let projective: Vec<G1> = (0..n).map(|_| G1::random(&mut *rng)).collect();
    let mut points = vec![G1Affine::identity(); n];
    G1::batch_normalize(&projective, &mut points);
    points
}

fn generate_scalars(n: usize, rng: &mut ChaCha20Rng) -> Vec<Fr> {
    (0..n).map(|_| Fr::random(&mut *rng)).collect()
}

fn bench_msm(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let max_points = 1 << SIZES[SIZES.len() - 1];
    let points = generate_points(max_points, &mut rng);
    let scalars = generate_scalars(max_points, &mut rng);
    let table = generate_point_table(&points);
    let mut context = MsmContext::new();
    context.reserve(max_points);

    let mut group = c.benchmark_group("msm");
    group.sample_size(10);
    for log2 in SIZES {
        let n = 1usize << log2;
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("safe", log2), &n, |b, &n| {
            b.iter(|| context.msm_safe(&scalars[..n], &table).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("unsafe", log2), &n, |b, &n| {
            b.iter(|| context.msm_unsafe(&scalars[..n], &table).unwrap())
        });
        if log2 <= 14 {
            group.bench_with_input(BenchmarkId::new("naive", log2), &n, |b, &n| {
                b.iter(|| {
                    points[..n]
                        .par_iter()
                        .zip(scalars[..n].par_iter())
                        .map(|(p, s)| *p * *s)
                        .reduce(G1::identity, |a, b| a + b)
                })
            });
        }
    }
    group.finish();
}

fn bench_point_table(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let points = generate_points(1 << 16, &mut rng);
    c.bench_function("generate_point_table 2^16", |b| b.iter(|| generate_point_table(&points)));
    let table = generate_point_table(&points);
    assert_eq!(table.len(), points.len());
    assert_eq!(table[7], points[7]);
}

criterion_group!(benches, bench_msm, bench_point_table);
criterion_main!(benches);
