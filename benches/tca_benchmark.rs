use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tandem::estimator::Transformer;
use tandem::jda::{self, JdaConfig};
use tandem::kernel::{self, Kernel};
use tandem::tca::{Tca, TcaConfig};
use tandem::test_fixtures::{DomainPair, DomainPairBuilder};

fn domain_pair(size: usize) -> DomainPair {
    DomainPairBuilder::new(size, size, 20)
        .with_separation(1.0)
        .with_target_shift(0.5)
        .seed(0x5EED + size as u64)
        .build()
}

fn benchmark_gram(c: &mut Criterion) {
    let sizes = [50_usize, 100, 200];
    let pairs: Vec<_> = sizes.iter().map(|&size| (size, domain_pair(size))).collect();

    let mut group = c.benchmark_group("gram_matrix");
    for (size, pair) in pairs.iter() {
        group.throughput(Throughput::Elements((*size * *size) as u64));
        for (name, k) in [("linear", Kernel::Linear), ("rbf", Kernel::Rbf { gamma: 0.1 })] {
            group.bench_with_input(BenchmarkId::new(name, size), pair, |b, input| {
                b.iter(|| {
                    let gram = kernel::gram_matrix(black_box(input.xs.view()), &k);
                    black_box(gram).ok();
                });
            });
        }
    }
    group.finish();
}

fn benchmark_fit(c: &mut Criterion) {
    let sizes = [50_usize, 100, 200];
    let pairs: Vec<_> = sizes.iter().map(|&size| (size, domain_pair(size))).collect();

    let mut group = c.benchmark_group("embedding_fit");
    group.sample_size(10);
    for (size, pair) in pairs.iter() {
        group.bench_with_input(BenchmarkId::new("tca", size), pair, |b, input| {
            b.iter(|| {
                let mut tca = Tca::new(TcaConfig {
                    n_components: 10,
                    ..TcaConfig::default()
                });
                black_box(tca.fit_transform(input.xs.view(), input.xt.view())).ok();
            });
        });

        let config = JdaConfig {
            k: 10,
            lambda: 1.0,
            ..JdaConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("jda", size), pair, |b, input| {
            b.iter(|| {
                let out = jda::jda(
                    input.xs.t(),
                    input.xt.t(),
                    input.ys.view(),
                    input.yt.view(),
                    &config,
                );
                black_box(out).ok();
            });
        });
    }
    group.finish();
}

criterion_group!(tca_benchmark, benchmark_gram, benchmark_fit);
criterion_main!(tca_benchmark);
