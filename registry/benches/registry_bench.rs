use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use verileaf_nullables::NullStore;
use verileaf_registry::{
    CallContext, ImpactAssessment, MemoryEventLog, Registry, VegetationMetrics,
};
use verileaf_types::{Identity, Timestamp};

const OWNER: Identity = Identity::new([1u8; 32]);
const VERIFIER: Identity = Identity::new([2u8; 32]);

fn identity(i: u32) -> Identity {
    let mut bytes = [0xAAu8; 32];
    bytes[..4].copy_from_slice(&i.to_le_bytes());
    Identity::new(bytes)
}

fn populated(claims: u32) -> Registry<NullStore, MemoryEventLog> {
    let ctx = CallContext::new(OWNER, Timestamp::new(0));
    let mut registry =
        Registry::construct(NullStore::new(), MemoryEventLog::new(), &ctx, Some(VERIFIER)).unwrap();
    for i in 0..claims {
        let ctx = CallContext::new(identity(i), Timestamp::new(i as u64));
        registry
            .register_claim(&ctx, b"polygon".to_vec(), format!("Plot {i}"))
            .unwrap();
    }
    registry
}

fn bench_register_claim(c: &mut Criterion) {
    let mut registry = populated(0);
    let ctx = CallContext::new(identity(7), Timestamp::new(1));
    let geometry = vec![b'x'; 512];

    c.bench_function("register_claim", |b| {
        b.iter(|| {
            registry
                .register_claim(black_box(&ctx), geometry.clone(), "Green Valley".into())
                .unwrap()
        });
    });
}

fn bench_submit_score(c: &mut Criterion) {
    let mut registry = populated(0);
    let ctx = CallContext::new(VERIFIER, Timestamp::new(1));

    c.bench_function("submit_impact_score", |b| {
        b.iter(|| {
            registry
                .submit_impact_score(black_box(&ctx), identity(3), black_box(87))
                .unwrap()
        });
    });
}

fn bench_get_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_claim");

    for claims in [10, 1_000, 10_000] {
        let registry = populated(claims);
        let target = identity(claims / 2);
        group.bench_with_input(BenchmarkId::new("claims", claims), &claims, |b, _| {
            b.iter(|| black_box(registry.get_claim(black_box(&target)).unwrap()));
        });
    }

    group.finish();
}

fn bench_assessment(c: &mut Criterion) {
    let before = VegetationMetrics {
        ndvi_mean: 0.31,
        ndvi_std: 0.08,
        evi_mean: 0.22,
        evi_std: 0.05,
        fvc_mean: 0.40,
        fvc_std: 0.11,
        lai_mean: 1.2,
        lai_std: 0.3,
    };
    let after = VegetationMetrics {
        ndvi_mean: 0.45,
        evi_mean: 0.30,
        fvc_mean: 0.55,
        lai_mean: 1.9,
        ..before
    };

    c.bench_function("impact_assessment", |b| {
        b.iter(|| black_box(ImpactAssessment::from_metrics(black_box(&before), black_box(&after))));
    });
}

criterion_group!(
    benches,
    bench_register_claim,
    bench_submit_score,
    bench_get_claim,
    bench_assessment
);
criterion_main!(benches);
