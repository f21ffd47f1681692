#![deny(warnings)]

//! Headless CLI: runs a Business Tycoon session for a number of days with a
//! scripted or automatic player and prints KPIs.

mod autoplay;

use std::sync::Arc;

use anyhow::{Context, Result};
use persistence::{GameStore, SqliteStore, DEFAULT_LEADERBOARD_SIZE};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;
use tycoon_engine::Action;
use tycoon_runtime::{Session, SessionConfig, SystemClock};

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    db: Option<String>,
    user: Option<String>,
    days: Option<u32>,
    script: Option<String>,
    leaderboard: bool,
    seed: Option<u64>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--db" => args.db = it.next(),
            "--user" => args.user = it.next(),
            "--days" => args.days = it.next().and_then(|s| s.parse().ok()),
            "--script" => args.script = it.next(),
            "--leaderboard" => args.leaderboard = true,
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    args
}

fn ensure_db_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|p| !p.starts_with(":memory:"));
    if let Some(parent) = path.and_then(|p| std::path::Path::new(p).parent()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(?args, "starting CLI");

    let mut cfg = match &args.config {
        Some(path) => SessionConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => SessionConfig::default(),
    };
    if let Some(db) = args.db {
        cfg.database_url = db;
    }
    if let Some(user) = args.user {
        cfg.username = user.clone();
        cfg.user_id = user;
    }
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }

    ensure_db_dir(&cfg.database_url)?;
    let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);

    if args.leaderboard {
        for (rank, entry) in store
            .leaderboard(DEFAULT_LEADERBOARD_SIZE)
            .await?
            .iter()
            .enumerate()
        {
            println!(
                "{:>2}. {:<20} ${:>12} | day {:>4} | net worth ${}",
                rank + 1,
                entry.username,
                entry.money,
                entry.day,
                entry.stats.net_worth
            );
        }
        return Ok(());
    }

    let mut session = Session::new(&cfg, store, Arc::new(SystemClock))?;
    session.start().await;

    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let actions: Vec<Action> = serde_json::from_str(&text)?;
        for action in actions {
            session.dispatch(action).await;
            session.poll();
        }
    } else {
        for _ in 0..args.days.unwrap_or(30) {
            let plan = autoplay::plan_day(session.engine().catalog(), session.state());
            for action in plan {
                session.dispatch(action).await;
            }
            session.poll();
            if session.state().game_over {
                break;
            }
        }
    }

    if let Err(e) = session.save_now().await {
        warn!(error = %e, "final save failed");
    }
    session.flush().await;

    let s = session.state();
    println!(
        "Business Tycoon {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("TYCOON_REVISION"),
        env!("TYCOON_COMMIT_DATE")
    );
    println!(
        "KPI | day: {} | money: ${} | net worth: ${} | level: {} | businesses: {} | staff: {} | revenue: ${} | expenses: ${} | events: {} | game over: {}",
        s.day,
        s.money,
        s.stats.net_worth,
        s.level,
        s.businesses.len(),
        s.staff.len(),
        s.stats.total_revenue,
        s.stats.total_expenses,
        s.completed_special_events.len(),
        s.game_over
    );
    for n in &s.notifications {
        println!("  [{:?}] {}", n.kind, n.message);
    }

    Ok(())
}
