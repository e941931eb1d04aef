//! `ferryctl` — route keys to buckets with a consistent hashing ring.
//!
//! # Usage
//!
//! ```text
//! ferryctl -b c1 -b c2 route 1234sadf56           # which bucket owns a key
//! ferryctl -c ferry.toml route -n 3 user:42       # owner plus two fallbacks
//! ferryctl -c ferry.toml members                  # list active buckets
//! ferryctl simulate balance --buckets 2 --keys 1000000
//! ferryctl simulate disruption --buckets 10 --keys 10000
//! ```

mod config;
mod simulate;
mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ferry_balance::LoadBalancer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "ferryctl",
    version,
    about = "Consistent-hash key router for load balancing"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bucket to route to (repeatable). Replaces `[ring] buckets` from the config.
    #[arg(short, long, global = true)]
    bucket: Vec<String>,

    /// Virtual nodes per bucket.
    #[arg(long, global = true)]
    replicas: Option<u32>,

    /// Placement seed; routers sharing a seed agree on placement.
    #[arg(long, global = true, env = "FERRY_SEED")]
    seed: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bucket that owns each key.
    Route {
        /// Keys to route.
        #[arg(required = true)]
        keys: Vec<String>,

        /// Number of distinct buckets to print per key (owner first).
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// List active buckets.
    Members,

    /// Run a statistical check of the ring over random input.
    Simulate {
        #[command(subcommand)]
        scenario: Scenario,
    },
}

#[derive(Subcommand)]
enum Scenario {
    /// Route random keys over random buckets and report per-bucket spread.
    Balance {
        /// Number of buckets.
        #[arg(short = 'n', long = "buckets", default_value_t = 2)]
        bucket_count: usize,

        /// Number of keys.
        #[arg(short = 'k', long = "keys", default_value_t = 1_000_000)]
        key_count: usize,

        /// Seed for the random generator (random if omitted).
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Add one bucket to a ring and report how many keys moved.
    Disruption {
        /// Number of buckets before the addition.
        #[arg(short = 'n', long = "buckets", default_value_t = 10)]
        bucket_count: usize,

        /// Number of keys to sample.
        #[arg(short = 'k', long = "keys", default_value_t = 10_000)]
        key_count: usize,

        /// Seed for the random generator (random if omitted).
        #[arg(long)]
        rng_seed: Option<u64>,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    // CLI args override config file values.
    if !cli.bucket.is_empty() {
        config.ring.buckets = cli.bucket;
    }
    if cli.replicas.is_some() {
        config.ring.replicas = cli.replicas;
    }
    if cli.seed.is_some() {
        config.ring.seed = cli.seed;
    }

    match cli.command {
        Commands::Route { keys, count } => cmd_route(&config, &keys, count),
        Commands::Members => cmd_members(&config),
        Commands::Simulate { scenario } => cmd_simulate(&config, scenario),
    }
}

fn build_balancer(config: &CliConfig) -> Result<LoadBalancer> {
    let lb = LoadBalancer::with_hasher(
        config.ring_config()?,
        config.hasher(),
        config.ring.buckets.iter().cloned(),
    );
    if lb.len() < config.ring.buckets.len() {
        warn!(
            configured = config.ring.buckets.len(),
            distinct = lb.len(),
            "duplicate buckets ignored"
        );
    }
    Ok(lb)
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

fn cmd_route(config: &CliConfig, keys: &[String], count: usize) -> Result<()> {
    let lb = build_balancer(config)?;
    debug!(buckets = lb.len(), keys = keys.len(), "routing keys");

    for key in keys {
        let owners = lb
            .get_n(key, count.max(1))
            .with_context(|| format!("cannot route key {key:?}"))?;
        let owners: Vec<String> = owners.iter().map(ToString::to_string).collect();
        println!("{key}\t{}", owners.join(","));
    }
    Ok(())
}

fn cmd_members(config: &CliConfig) -> Result<()> {
    let lb = build_balancer(config)?;
    let ring = lb.snapshot();

    for bucket in ring.members() {
        println!("{bucket}");
    }
    println!();
    println!(
        "{} bucket(s), {} virtual node(s), {} per bucket",
        ring.len(),
        ring.vnode_count(),
        ring.replicas()
    );
    Ok(())
}

fn cmd_simulate(config: &CliConfig, scenario: Scenario) -> Result<()> {
    let ring_config = config.ring_config()?;
    let hasher = config.hasher();

    match scenario {
        Scenario::Balance {
            bucket_count,
            key_count,
            rng_seed,
        } => {
            let mut rng = rng_from(rng_seed);
            let report = simulate::balance(&mut rng, ring_config, hasher, bucket_count, key_count);

            println!("{:<34} {:>10} {:>8}", "BUCKET", "KEYS", "SHARE");
            for (bucket, count) in &report.counts {
                let share = *count as f64 / key_count.max(1) as f64 * 100.0;
                println!("{:<34} {:>10} {:>7.2}%", bucket.to_string(), count, share);
            }
            println!();
            println!("mean:    {:.1}", report.mean);
            println!("std dev: {:.1}", report.std_dev);

            if !report.is_balanced() {
                warn!(
                    mean = report.mean,
                    std_dev = report.std_dev,
                    "standard deviation exceeds mean"
                );
            }
        }
        Scenario::Disruption {
            bucket_count,
            key_count,
            rng_seed,
        } => {
            let mut rng = rng_from(rng_seed);
            let report =
                simulate::disruption(&mut rng, ring_config, hasher, bucket_count, key_count);

            println!("buckets:  {} -> {}", report.buckets, report.buckets + 1);
            println!("moved:    {}/{}", report.moved, report.keys);
            println!("fraction: {:.4}", report.fraction());
            println!("expected: {:.4}", report.expected());
            println!("offset:   {:.4}", report.offset());

            if !report.within_tolerance() {
                warn!(offset = report.offset(), "remap fraction outside tolerance");
            }
        }
    }
    Ok(())
}
