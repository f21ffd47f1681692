use criterion::{criterion_group, criterion_main, Criterion};
use tycoon_engine::{Action, Engine, EngineConfig, Env};

fn bench_advance_day(c: &mut Criterion) {
    let engine = Engine::standard(EngineConfig::default()).unwrap();
    let mut state = tycoon_core::GameState::fresh(false);
    state.money = 100_000_000;
    let mut env = Env::seeded(42, chrono::Utc::now());
    for kind in ["coffee_shop", "restaurant", "retail_store", "factory"] {
        for _ in 0..25 {
            state = engine.transition(
                &state,
                &Action::PurchaseBusiness {
                    business_type: kind.into(),
                },
                &mut env,
            );
        }
    }
    for staff in ["manager", "marketer", "accountant", "consultant"] {
        state = engine.transition(
            &state,
            &Action::HireStaff {
                staff_type: staff.into(),
            },
            &mut env,
        );
    }
    c.bench_function("advance_day_100_businesses", |b| {
        b.iter(|| engine.transition(&state, &Action::AdvanceDay, &mut env))
    });
    let next = engine.transition(&state, &Action::AdvanceDay, &mut env);
    c.bench_function("collect_all_100_businesses", |b| {
        b.iter(|| engine.transition(&next, &Action::CollectAllRevenue, &mut env))
    });
}

criterion_group!(benches, bench_advance_day);
criterion_main!(benches);
