use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use arbor_core::{ModuleDefinition, Store};
use serde_json::{json, Value};

fn add_age(state: &mut Value, payload: &Value) {
    let age = state["age"].as_i64().unwrap_or(0);
    state["age"] = json!(age + payload.as_i64().unwrap_or(0));
}

fn counter() -> ModuleDefinition {
    ModuleDefinition::new()
        .state(json!({ "age": 0 }))
        .mutation("changeAge", add_age)
        .getter("doubled", |state| json!(state["age"].as_i64().unwrap_or(0) * 2))
}

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| {
            let store = Store::new(
                counter()
                    .module("a", counter().module("c", counter()))
                    .module("b", counter()),
            );
            black_box(store)
        });
    });
}

fn commit_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");

    for depth in [1usize, 4, 16].iter() {
        let mut def = counter();
        for level in (1..*depth).rev() {
            def = counter().module(format!("m{level}"), def);
        }
        let store = Store::new(def).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| {
                store.commit("changeAge", black_box(json!(1))).unwrap();
            });
        });
    }
    group.finish();
}

fn cached_getter_benchmark(c: &mut Criterion) {
    let store = Store::new(counter()).unwrap();

    c.bench_function("cached_getter", |b| {
        b.iter(|| {
            black_box(store.getter("doubled").unwrap());
        });
    });
}

fn dirty_getter_benchmark(c: &mut Criterion) {
    let store = Store::new(counter()).unwrap();

    c.bench_function("dirty_getter", |b| {
        b.iter(|| {
            store.commit("changeAge", json!(1)).unwrap();
            black_box(store.getter("doubled").unwrap());
        });
    });
}

criterion_group!(
    benches,
    store_creation_benchmark,
    commit_benchmark,
    cached_getter_benchmark,
    dirty_getter_benchmark,
);
criterion_main!(benches);
