use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use autowire::model::{
    InjectableMember, InstanceSharing, Lifetime, OptionsKind, Primitive, TypeDescriptor, TypeRef,
};
use autowire::{CollectingDiagnosticHandler, ProgramModel, RegistrationCompiler};

fn compile(model: &ProgramModel) {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let compiler = RegistrationCompiler::new(handler);
    let output = compiler.compile(model).expect("Compilation failed");
    black_box(output);
}

fn generate_deep_chain(depth: usize) -> ProgramModel {
    let mut types = vec![TypeDescriptor::new("Bench.Data", "Database")];
    for level in 1..=depth {
        let mut ty = TypeDescriptor::new("Bench.Chain", format!("Level{}", level))
            .with_lifetime(Lifetime::Transient)
            .with_member(InjectableMember::configuration(
                format!("_setting{}", level),
                format!("Level{}:Setting", level),
                TypeRef::primitive(Primitive::String),
            ))
            .with_member(InjectableMember::service(
                format!("_database{}", level),
                TypeRef::class("Bench.Data", "Database"),
            ));
        if level > 1 {
            ty = ty.with_base(TypeRef::class("Bench.Chain", format!("Level{}", level - 1)));
        }
        types.push(ty);
    }
    ProgramModel::new(types).expect("Invalid model")
}

fn generate_wide_services(count: usize) -> ProgramModel {
    let types = (0..count)
        .map(|i| {
            let mut ty = TypeDescriptor::new("Bench.Services", format!("Service{}", i))
                .with_lifetime(Lifetime::Scoped)
                .with_sharing(if i % 2 == 0 {
                    InstanceSharing::Shared
                } else {
                    InstanceSharing::Separate
                })
                .with_interface(TypeRef::interface("Bench.Services", format!("IService{}", i)))
                .with_member(InjectableMember::options(
                    "_options",
                    OptionsKind::Snapshot,
                    TypeRef::class("Bench.Options", format!("Options{}", i % 10)),
                ));
            if i > 0 {
                ty = ty.with_member(InjectableMember::service(
                    "_previous",
                    TypeRef::interface("Bench.Services", format!("IService{}", i - 1)),
                ));
            }
            ty
        })
        .collect();
    ProgramModel::new(types).expect("Invalid model")
}

/// Singletons that all reach one scoped type through a transient hop
fn generate_capture_heavy(count: usize) -> ProgramModel {
    let mut types = vec![
        TypeDescriptor::new("Bench.Data", "Session").with_lifetime(Lifetime::Scoped),
        TypeDescriptor::new("Bench.Data", "Reader")
            .with_lifetime(Lifetime::Transient)
            .with_member(InjectableMember::service(
                "_session",
                TypeRef::class("Bench.Data", "Session"),
            )),
    ];
    for i in 0..count {
        types.push(
            TypeDescriptor::new("Bench.Caches", format!("Cache{}", i))
                .with_lifetime(Lifetime::Singleton)
                .with_member(InjectableMember::service(
                    "_reader",
                    TypeRef::class("Bench.Data", "Reader"),
                )),
        );
    }
    ProgramModel::new(types).expect("Invalid model")
}

fn benchmark_deep_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_chain");

    for depth in [5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::new("levels", depth), &depth, |b, &depth| {
            let model = generate_deep_chain(depth);
            b.iter(|| compile(black_box(&model)))
        });
    }

    group.finish();
}

fn benchmark_wide_services(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_services");

    for count in [100, 500, 1000, 5000] {
        group.bench_with_input(BenchmarkId::new("services", count), &count, |b, &count| {
            let model = generate_wide_services(count);
            b.iter(|| compile(black_box(&model)))
        });
    }

    group.finish();
}

fn benchmark_capture_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_heavy");

    for count in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("singletons", count), &count, |b, &count| {
            let model = generate_capture_heavy(count);
            b.iter(|| compile(black_box(&model)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_deep_chain,
    benchmark_wide_services,
    benchmark_capture_heavy
);
criterion_main!(benches);
