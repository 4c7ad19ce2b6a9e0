//! Benchmarks for buffer marshalling and primitive invocation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sodium_bridge::{BufferResolver, Invoker, ManagedHeap, PrimitiveId};

/// Benchmark resolve/release for direct and pinned buffers of varying size
fn bench_resolve_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_release");
    let heap = ManagedHeap::new();
    let resolver = BufferResolver::new(&heap);

    for &size in &[32usize, 1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));

        let direct = heap.allocate_direct(size);
        group.bench_function(format!("direct_{}", size), |b| {
            b.iter(|| {
                let view = resolver.resolve(Some(&direct)).unwrap();
                black_box(view.data_ptr());
                resolver.release_as_output(view);
            })
        });

        let array = heap.allocate_array(size + 16);
        let pinned = heap.wrap(array, 8, size).unwrap();
        group.bench_function(format!("pinned_output_{}", size), |b| {
            b.iter(|| {
                let view = resolver.resolve(Some(&pinned)).unwrap();
                black_box(view.data_ptr());
                resolver.release_as_output(view);
            })
        });
        group.bench_function(format!("pinned_input_{}", size), |b| {
            b.iter(|| {
                let view = resolver.resolve(Some(&pinned)).unwrap();
                black_box(view.data_ptr());
                resolver.release_as_input(view);
            })
        });
    }

    group.finish();
}

/// Benchmark a full call: marshalling plus X25519
fn bench_scalarmult_base(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalarmult_base");
    let heap = ManagedHeap::new();
    let invoker = Invoker::new(&heap);

    let q = heap.allocate_direct(32);
    let n = heap.direct_from(&[7u8; 32]);
    group.bench_function("direct", |b| {
        b.iter(|| {
            let status = invoker
                .call(PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), Some(&n)], &[])
                .unwrap();
            black_box(status)
        })
    });

    let q_array = heap.allocate_array(40);
    let q_pinned = heap.wrap(q_array, 8, 32).unwrap();
    let n_array = heap.new_array(&[7u8; 40]);
    let n_pinned = heap.wrap(n_array, 8, 32).unwrap();
    group.bench_function("pinned", |b| {
        b.iter(|| {
            let status = invoker
                .call(
                    PrimitiveId::ScalarmultCurve25519Base,
                    &[Some(&q_pinned), Some(&n_pinned)],
                    &[],
                )
                .unwrap();
            black_box(status)
        })
    });

    group.finish();
}

/// Benchmark AEAD sealing, where marshalling cost scales with the message
fn bench_aead_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("xchacha20poly1305_encrypt");
    let heap = ManagedHeap::new();
    let invoker = Invoker::new(&heap);
    let key = heap.direct_from(&[1u8; 32]);
    let npub = heap.direct_from(&[2u8; 24]);
    let mac = heap.allocate_direct(16);

    for &size in &[64usize, 4096, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let m = heap.wrap_array(heap.allocate_array(size)).unwrap();
        let out = heap.wrap_array(heap.allocate_array(size)).unwrap();

        group.bench_function(format!("pinned_{}", size), |b| {
            b.iter(|| {
                let status = invoker
                    .call(
                        PrimitiveId::XChaCha20Poly1305IetfEncryptDetached,
                        &[Some(&out), Some(&mac), Some(&m), None, Some(&npub), Some(&key)],
                        &[],
                    )
                    .unwrap();
                black_box(status)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_release,
    bench_scalarmult_base,
    bench_aead_encrypt
);
criterion_main!(benches);
