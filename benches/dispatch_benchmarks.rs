use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use async_requests::errors::TransportError;
use async_requests::{
    pool::Config,
    session::Session,
    transport::{Request, Response, Transport},
};
use std::hint::black_box;
use std::sync::Arc;

struct NoopTransport;

impl Transport for NoopTransport {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        Ok(Response {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            url: request.url,
            data: None,
        })
    }
}

// Benchmark 1: Dispatch overhead
fn bench_dispatch_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_overhead");

    for size in [100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("dispatch_wait", size),
            &size,
            |b, &size| {
                let session = Session::with_transport(Config::sized(2, 4), Arc::new(NoopTransport));

                b.iter(|| {
                    let handles: Vec<_> = (0..size)
                        .map(|_| session.get("bench://noop").send().unwrap())
                        .collect();

                    for handle in handles {
                        black_box(handle.wait().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark 2: Single round-trip latency
fn bench_single_roundtrip(c: &mut Criterion) {
    let session = Session::with_transport(Config::sized(1, 1), Arc::new(NoopTransport));

    c.bench_function("single_roundtrip", |b| {
        b.iter(|| black_box(session.get("bench://one").send().unwrap().wait().unwrap()));
    });
}

criterion_group!(benches, bench_dispatch_overhead, bench_single_roundtrip);
criterion_main!(benches);
