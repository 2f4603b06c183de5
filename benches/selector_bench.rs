//! Benchmarks for scout selection and the offer lifecycle.
//!
//! Benchmarks cover:
//! - `RatingSelector` over growing candidate pools
//! - Offer / accept / complete round trips through the dispatcher

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hint::black_box;

use chrono::{DateTime, Utc};
use scout_dispatch::builders::{build_dispatcher, default_notifier};
use scout_dispatch::config::DispatchConfig;
use scout_dispatch::core::{
    Decision, RatingSelector, ScheduleOracle, Scout, ScoutId, ScoutSelector, SelectionContext,
    Task, TaskCategory, TaskLinkage, HOUSE_VISIT,
};
use scout_dispatch::infra::{AvailabilityBook, RequesterRegistry};

// ============================================================================
// Fixtures
// ============================================================================

struct EveryTenthBusy;

impl ScheduleOracle for EveryTenthBusy {
    fn has_conflict(&self, scout: ScoutId, _at: DateTime<Utc>) -> bool {
        scout % 10 == 0
    }
}

fn random_scouts(count: u64, rng: &mut StdRng) -> Vec<Scout> {
    (1..=count)
        .map(|id| Scout {
            id,
            name: format!("scout-{id}"),
            phone_no: format!("{:010}", 6_000_000_000 + id),
            active: rng.random_bool(0.8),
            rating: f64::from(rng.random_range(10..=50_u32)) / 10.0,
            ratings_received: rng.random_range(0..200),
            review_tags: BTreeSet::new(),
        })
        .collect()
}

fn sample_task() -> Task {
    let category = TaskCategory {
        name: HOUSE_VISIT.to_string(),
        earning: 100.0,
        sub_tasks: Vec::new(),
    };
    Task::new(
        1,
        &category,
        TaskLinkage::HouseVisit {
            house_id: 1,
            visit_id: 1,
        },
        Utc::now(),
    )
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_rating_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("rating_selector");
    let mut rng = StdRng::seed_from_u64(42);
    let task = sample_task();

    for count in [100_u64, 1_000, 10_000] {
        let scouts = random_scouts(count, &mut rng);
        let excluded: HashSet<ScoutId> = (1..=count).step_by(7).collect();
        let open_tasks: HashMap<ScoutId, usize> = scouts
            .iter()
            .map(|s| (s.id, rng.random_range(0..4)))
            .collect();
        let ctx = SelectionContext {
            excluded: &excluded,
            open_tasks: &open_tasks,
            schedule: &EveryTenthBusy,
        };

        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &scouts, |b, scouts| {
            b.iter(|| black_box(RatingSelector.select(&task, black_box(scouts), &ctx)));
        });
    }
    group.finish();
}

fn bench_offer_round_trip(c: &mut Criterion) {
    let d = build_dispatcher(
        &DispatchConfig::default(),
        default_notifier,
        Box::new(RequesterRegistry::new()),
        Box::new(AvailabilityBook::new()),
    )
    .expect("default config builds");
    for i in 0..50_u64 {
        let id = d
            .scouts()
            .register(format!("scout-{i}"), format!("{:010}", 6_000_000_000 + i))
            .expect("unique phone");
        d.scouts().set_active(id, true).expect("registered");
    }

    let mut visit = 0_u64;
    c.bench_function("offer_accept_complete", |b| {
        b.iter(|| {
            visit += 1;
            // Spread tasks a day apart so earlier assignments never conflict.
            let at = Utc::now() + chrono::Duration::days(i64::try_from(visit).unwrap_or(0));
            let task = d
                .create_task(
                    HOUSE_VISIT,
                    TaskLinkage::HouseVisit {
                        house_id: 1,
                        visit_id: visit,
                    },
                    at,
                )
                .expect("category exists");
            let request = d.assign_new(task).expect("scout available");
            d.respond(request.id, Decision::Accepted).expect("fresh request");
            black_box(d.complete(task, None).expect("assigned"))
        });
    });
}

criterion_group!(benches, bench_rating_selector, bench_offer_round_trip);
criterion_main!(benches);
