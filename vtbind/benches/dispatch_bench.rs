//! Dispatch cost through facades using criterion.
//!
//! Run with: cargo bench --bench dispatch_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vtbind::{bind, implement, interface, Binder, Interface, Policy, StaticInterface};

interface! {
    pub interface Accumulator {
        fn add(&mut self, value: u64) -> u64;
        fn total(&self) -> u64;
        fn identity(value: u64) -> u64;
    }
}

struct Sum {
    total: u64,
}

implement! {
    impl Sum {
        fn add(&mut self, value: u64) -> u64 {
            self.total = self.total.wrapping_add(value);
            self.total
        }

        fn total(&self) -> u64 {
            self.total
        }

        fn identity(value: u64) -> u64 {
            value
        }

        fn echo(value: u64) -> u64 {
            value
        }
    }
}

interface! {
    pub interface Echo {
        fn echo(value: u64) -> u64;
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    group.bench_function("direct_shared", |b| {
        let sum = Sum { total: 7 };
        b.iter(|| black_box(sum.total()));
    });

    group.bench_function("facade_shared", |b| {
        let mut sum = Sum { total: 7 };
        let facade = Interface::<Accumulator>::make(&mut sum).expect("bind");
        b.iter(|| black_box(facade.total()));
    });

    group.bench_function("direct_exclusive", |b| {
        let mut sum = Sum { total: 0 };
        b.iter(|| black_box(sum.add(black_box(1))));
    });

    group.bench_function("facade_exclusive", |b| {
        let mut sum = Sum { total: 0 };
        let mut facade = Interface::<Accumulator>::make(&mut sum).expect("bind");
        b.iter(|| black_box(facade.add(black_box(1))));
    });

    group.bench_function("facade_free", |b| {
        let facade = StaticInterface::<Echo>::make::<Sum>().expect("bind");
        b.iter(|| black_box(facade.echo(black_box(3))));
    });

    group.finish();
}

fn bench_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding");

    group.bench_function("fresh_bind", |b| {
        b.iter(|| black_box(bind::<Sum, Accumulator>().expect("bind")));
    });

    group.bench_function("memoized_table", |b| {
        let binder = Binder::default();
        b.iter(|| black_box(binder.table::<Sum, Accumulator>(Policy::Any).expect("bind")));
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_binding);
criterion_main!(benches);
