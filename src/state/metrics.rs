use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Compilation phases timed by the driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Resolve,
    Synthesize,
    Validate,
    Emit,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Synthesize => "synthesize",
            Phase::Validate => "validate",
            Phase::Emit => "emit",
        }
    }
}

#[derive(Debug, Default)]
pub struct PassMetrics {
    pub plan_lookups: AtomicUsize,
    pub plan_hits: AtomicUsize,
    pub plans_resolved: AtomicUsize,
    pub constructors_synthesized: AtomicUsize,
    pub constructors_skipped: AtomicUsize,
    pub edges_built: AtomicUsize,
    pub registrations_emitted: AtomicUsize,
    pub types_suppressed: AtomicUsize,
    pub diagnostics_reported: AtomicUsize,
    pub phase_times: Mutex<Vec<(Phase, Duration)>>,
}

impl PassMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.plan_lookups.store(0, Ordering::SeqCst);
        self.plan_hits.store(0, Ordering::SeqCst);
        self.plans_resolved.store(0, Ordering::SeqCst);
        self.constructors_synthesized.store(0, Ordering::SeqCst);
        self.constructors_skipped.store(0, Ordering::SeqCst);
        self.edges_built.store(0, Ordering::SeqCst);
        self.registrations_emitted.store(0, Ordering::SeqCst);
        self.types_suppressed.store(0, Ordering::SeqCst);
        self.diagnostics_reported.store(0, Ordering::SeqCst);
        self.phase_times.lock().unwrap().clear();
    }

    pub fn record_plan_lookup(&self, hit: bool) {
        self.plan_lookups.fetch_add(1, Ordering::SeqCst);
        if hit {
            self.plan_hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_plan_resolved(&self) {
        self.plans_resolved.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_constructor(&self, generated: bool) {
        if generated {
            self.constructors_synthesized.fetch_add(1, Ordering::SeqCst);
        } else {
            self.constructors_skipped.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_edges(&self, count: usize) {
        self.edges_built.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_registrations(&self, count: usize) {
        self.registrations_emitted.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_suppressed(&self) {
        self.types_suppressed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_diagnostic(&self) {
        self.diagnostics_reported.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_phase_time(&self, phase: Phase, duration: Duration) {
        self.phase_times.lock().unwrap().push((phase, duration));
    }

    pub fn plan_hit_rate(&self) -> f64 {
        let total = self.plan_lookups.load(Ordering::SeqCst);
        if total == 0 {
            return 1.0;
        }
        self.plan_hits.load(Ordering::SeqCst) as f64 / total as f64
    }

    pub fn get_summary(&self) -> MetricSummary {
        MetricSummary {
            plan_lookups: self.plan_lookups.load(Ordering::SeqCst),
            plan_hit_rate: self.plan_hit_rate(),
            plans_resolved: self.plans_resolved.load(Ordering::SeqCst),
            constructors_synthesized: self.constructors_synthesized.load(Ordering::SeqCst),
            constructors_skipped: self.constructors_skipped.load(Ordering::SeqCst),
            edges_built: self.edges_built.load(Ordering::SeqCst),
            registrations_emitted: self.registrations_emitted.load(Ordering::SeqCst),
            types_suppressed: self.types_suppressed.load(Ordering::SeqCst),
            diagnostics_reported: self.diagnostics_reported.load(Ordering::SeqCst),
            phase_times: self.phase_times.lock().unwrap().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub plan_lookups: usize,
    pub plan_hit_rate: f64,
    pub plans_resolved: usize,
    pub constructors_synthesized: usize,
    pub constructors_skipped: usize,
    pub edges_built: usize,
    pub registrations_emitted: usize,
    pub types_suppressed: usize,
    pub diagnostics_reported: usize,
    pub phase_times: Vec<(Phase, Duration)>,
}

impl MetricSummary {
    pub fn phase_time(&self, phase: Phase) -> Duration {
        self.phase_times
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, d)| *d)
            .sum()
    }

    pub fn format(&self) -> String {
        let mut out = format!(
            r#"=== Pass Metrics ===
Plan Lookups: {} (hit rate: {:.1}%)
Plans Resolved: {}
Constructors: {} generated, {} skipped
Dependency Edges: {}
Registrations: {} ({} types suppressed)
Diagnostics: {}"#,
            self.plan_lookups,
            self.plan_hit_rate * 100.0,
            self.plans_resolved,
            self.constructors_synthesized,
            self.constructors_skipped,
            self.edges_built,
            self.registrations_emitted,
            self.types_suppressed,
            self.diagnostics_reported
        );
        for (phase, duration) in &self.phase_times {
            out.push_str(&format!("\n{:<11} {:?}", phase.as_str(), duration));
        }
        out
    }
}
