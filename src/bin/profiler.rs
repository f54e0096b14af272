use std::sync::Arc;
use std::time::{Duration, Instant};

use autowire::model::{
    InjectableMember, InstanceSharing, Lifetime, Primitive, TypeDescriptor, TypeRef,
};
use autowire::state::Phase;
use autowire::{
    CollectingDiagnosticHandler, DiagnosticHandler, ProgramModel, RegistrationCompiler,
};

/// `Level1 <- Level2 <- ... <- LevelN`, each level binding one setting and one service
fn deep_chain(depth: usize) -> Vec<TypeDescriptor> {
    let mut types =
        vec![TypeDescriptor::new("Bench.Data", "Database").with_lifetime(Lifetime::Scoped)];
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
    types
}

/// `width` services, each exposing two interfaces and depending on the previous service
fn wide_fan_out(width: usize) -> Vec<TypeDescriptor> {
    (0..width)
        .map(|i| {
            let mut ty = TypeDescriptor::new("Bench.Services", format!("Service{}", i))
                .with_lifetime(if i % 3 == 0 {
                    Lifetime::Singleton
                } else {
                    Lifetime::Scoped
                })
                .with_sharing(if i % 2 == 0 {
                    InstanceSharing::Shared
                } else {
                    InstanceSharing::Separate
                })
                .with_interface(TypeRef::interface("Bench.Services", format!("IService{}", i)))
                .with_interface(TypeRef::interface("Bench.Services", format!("IReadable{}", i)));
            if i > 0 {
                ty = ty.with_member(InjectableMember::service(
                    "_previous",
                    TypeRef::interface("Bench.Services", format!("IService{}", i - 1)),
                ));
            }
            ty
        })
        .collect()
}

struct ProfileRun {
    total: Duration,
    phases: Vec<(Phase, Duration)>,
    plan_hit_rate: f64,
    constructors: usize,
    registrations: usize,
    errors: usize,
    warnings: usize,
}

fn profile(types: Vec<TypeDescriptor>) -> Result<ProfileRun, String> {
    let model = ProgramModel::new(types).map_err(|e| format!("Model error: {}", e))?;
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let compiler = RegistrationCompiler::new(handler.clone());

    let start = Instant::now();
    let output = compiler
        .compile(&model)
        .map_err(|e| format!("Compilation error: {}", e))?;
    let total = start.elapsed();

    Ok(ProfileRun {
        total,
        phases: output.metrics.phase_times.clone(),
        plan_hit_rate: output.metrics.plan_hit_rate,
        constructors: output.metrics.constructors_synthesized,
        registrations: output.metrics.registrations_emitted,
        errors: handler.error_count(),
        warnings: handler.warning_count(),
    })
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{}.{:02}ms", micros / 1000, (micros % 1000) / 10)
    } else {
        format!(
            "{}.{:02}s",
            micros / 1_000_000,
            (micros % 1_000_000) / 10000
        )
    }
}

fn main() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              autowire compilation pass PROFILER              ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let scenarios: Vec<(&str, Vec<TypeDescriptor>)> = vec![
        ("Deep chain (depth 10)", deep_chain(10)),
        ("Deep chain (depth 100)", deep_chain(100)),
        ("Wide fan-out (100 services)", wide_fan_out(100)),
        ("Wide fan-out (1000 services)", wide_fan_out(1000)),
    ];

    for (name, types) in scenarios {
        let count = types.len();
        println!("═══════════════════════════════════════════════════════════════");
        println!("📁 {} ({} types)", name, count);
        println!("═══════════════════════════════════════════════════════════════");

        let run = match profile(types) {
            Ok(run) => run,
            Err(message) => {
                println!("   ✗ {}\n", message);
                continue;
            }
        };

        println!();
        println!("   Total Pass Time: {}", format_duration(run.total));
        println!();
        println!("   BREAKDOWN:");
        let last = run.phases.len().saturating_sub(1);
        for (i, (phase, duration)) in run.phases.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            println!(
                "   {} {:<12} {:>10} ({:4.1}%)",
                branch,
                format!("{}:", phase.as_str()),
                format_duration(*duration),
                duration.as_secs_f64() / run.total.as_secs_f64() * 100.0
            );
        }
        println!();
        println!("   OUTPUT:");
        println!("   ├─ Constructors:     {:>10}", run.constructors);
        println!("   ├─ Registrations:    {:>10}", run.registrations);
        println!("   ├─ Plan hit rate:    {:>9.1}%", run.plan_hit_rate * 100.0);
        println!("   └─ Diagnostics:      {:>4} errors, {} warnings", run.errors, run.warnings);
        println!();
        println!("   THROUGHPUT:");
        let types_per_sec = count as f64 / run.total.as_secs_f64();
        println!("   └─ {:>10} types/sec", format!("{:.0}", types_per_sec));
        println!();
    }
}
