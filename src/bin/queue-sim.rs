//! Queue Simulator CLI Tool
//!
//! Drives an in-process box office through scripted or random customer
//! traffic and prints the line after every step.
//!
//! Usage:
//!   cargo run --bin queue-sim -- list
//!   cargo run --bin queue-sim scenario --name walkthrough
//!   cargo run --bin queue-sim random --customers 20 --vip-ratio 0.3 --seed 7

use std::sync::Arc;

use anyhow::{anyhow, Result};
use cinema_queue::config::QueueSettings;
use cinema_queue::message::{FallbackMessageGenerator, ResilientMessageProvider};
use cinema_queue::metrics::MetricsCollector;
use cinema_queue::profile::RandomProfileGenerator;
use cinema_queue::service::{BoxOffice, ServeOutcome};
use cinema_queue::utils::ticket_clock;
use cinema_queue::QueueError;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "queue-sim")]
#[command(about = "Simulate customer traffic against an in-process cinema box office")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed for customer profiles and messages
    #[arg(long, global = true, default_value = "42")]
    profile_seed: u64,

    /// Serve without attaching messages
    #[arg(long, global = true)]
    no_messages: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a predefined scenario
    Scenario {
        /// Scenario name (walkthrough, vip-rush, drain)
        #[arg(short, long)]
        name: String,
    },
    /// Random arrivals interleaved with serves, then drain the line
    Random {
        /// Number of customers that join
        #[arg(short, long, default_value = "12")]
        customers: usize,
        /// Probability that a joining customer is a VIP
        #[arg(short, long, default_value = "0.25")]
        vip_ratio: f64,
        /// Seed for arrivals and serve timing
        #[arg(short, long, default_value = "7")]
        seed: u64,
    },
    /// List available scenarios
    List,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Join { vip: bool },
    Serve,
}

const SCENARIOS: &[(&str, &str)] = &[
    (
        "walkthrough",
        "two regulars, two VIPs, then serve until the line is empty",
    ),
    (
        "vip-rush",
        "regulars wait while a run of VIPs keeps arriving and being served",
    ),
    ("drain", "six customers join, then serve one more time than needed"),
];

fn scenario_steps(name: &str) -> Result<Vec<Step>> {
    use Step::*;

    let steps = match name {
        "walkthrough" => vec![
            Join { vip: false },
            Join { vip: false },
            Join { vip: true },
            Join { vip: true },
            Serve,
            Serve,
            Serve,
            Serve,
            Serve,
        ],
        "vip-rush" => vec![
            Join { vip: false },
            Join { vip: false },
            Join { vip: true },
            Join { vip: true },
            Serve,
            Join { vip: true },
            Join { vip: false },
            Join { vip: true },
            Serve,
            Serve,
            Serve,
            Serve,
            Serve,
            Serve,
        ],
        "drain" => {
            let mut steps: Vec<Step> = (0..6).map(|i| Join { vip: i % 3 == 2 }).collect();
            steps.extend(std::iter::repeat(Serve).take(7));
            steps
        }
        other => {
            let available: Vec<_> = SCENARIOS.iter().map(|(name, _)| *name).collect();
            return Err(anyhow!(
                "Unknown scenario '{}'. Available: {}",
                other,
                available.join(", ")
            ));
        }
    };

    Ok(steps)
}

fn random_steps(customers: usize, vip_ratio: f64, seed: u64) -> Result<Vec<Step>> {
    if !(0.0..=1.0).contains(&vip_ratio) {
        return Err(anyhow!("VIP ratio must be between 0 and 1, got {}", vip_ratio));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut steps = Vec::with_capacity(customers * 2);
    let mut waiting = 0usize;
    let mut joined = 0usize;

    while joined < customers {
        if waiting > 0 && rng.gen_bool(0.4) {
            steps.push(Step::Serve);
            waiting -= 1;
        } else {
            steps.push(Step::Join {
                vip: rng.gen_bool(vip_ratio),
            });
            waiting += 1;
            joined += 1;
        }
    }
    steps.extend(std::iter::repeat(Step::Serve).take(waiting));

    Ok(steps)
}

fn build_office(profile_seed: u64, messages: bool) -> Result<BoxOffice> {
    let metrics = Arc::new(MetricsCollector::new()?);
    let mut office = BoxOffice::new(QueueSettings::default(), metrics)
        .with_profiles(Arc::new(RandomProfileGenerator::with_seed(profile_seed)));

    if messages {
        let provider = ResilientMessageProvider::fallback_only()
            .with_fallback(FallbackMessageGenerator::with_seed(profile_seed));
        office = office.with_messages(Arc::new(provider));
    }

    Ok(office)
}

fn print_served(outcome: &ServeOutcome) {
    let ticket = &outcome.ticket;
    let clock = ticket
        .served
        .as_ref()
        .map(|s| ticket_clock(&s.served_at))
        .unwrap_or_default();

    println!(
        "🎟️  Serving #{} {} {} ({}) at {}",
        ticket.id,
        ticket.display.avatar,
        ticket.display.name,
        ticket.class(),
        clock
    );
    if let Some(message) = ticket.served.as_ref().and_then(|s| s.message.as_ref()) {
        println!("    💬 {}", message);
    }
    if outcome.celebrate {
        println!("    🎉 {} customers served!", outcome.served_count);
    }
}

async fn print_line(office: &BoxOffice) {
    let view = office.view().await;
    let line: Vec<String> = view
        .waiting
        .iter()
        .map(|t| {
            if t.is_priority {
                format!("{}*", t.id)
            } else {
                t.id.to_string()
            }
        })
        .collect();
    println!("    line: [{}]", line.join(", "));
}

async fn run_steps(office: &BoxOffice, steps: &[Step]) -> Result<()> {
    for step in steps {
        match step {
            Step::Join { vip } => {
                let ticket = office.join(*vip).await;
                println!(
                    "➕ #{} {} {} joins ({})",
                    ticket.id,
                    ticket.display.avatar,
                    ticket.display.name,
                    ticket.class()
                );
            }
            Step::Serve => match office.serve_next().await {
                Ok(outcome) => print_served(&outcome),
                Err(QueueError::EmptyQueue) => println!("🚫 Nobody is waiting"),
                Err(e) => return Err(e.into()),
            },
        }
        print_line(office).await;
    }

    let history = office.history(None).await;
    let stats = office.stats().await;

    println!("\n📜 Recently served:");
    for ticket in &history {
        println!(
            "  #{} {} {} ({})",
            ticket.id,
            ticket.display.avatar,
            ticket.display.name,
            ticket.class()
        );
    }

    println!("\n📊 Session {}:", stats.session_id);
    println!("  Tickets issued: {}", stats.queue.tickets_issued);
    println!("  VIP tickets: {}", stats.queue.vip_tickets_issued);
    println!("  Served: {}", stats.queue.tickets_served);
    println!("  Empty serves: {}", stats.empty_serves);
    println!("  Still waiting: {}", stats.queue.waiting);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let steps = match &cli.command {
        Commands::List => {
            println!("Available scenarios:");
            for (name, description) in SCENARIOS {
                println!("  {:<12} {}", name, description);
            }
            return Ok(());
        }
        Commands::Scenario { name } => {
            println!("🧪 Running scenario: {}", name);
            scenario_steps(&name.to_lowercase())?
        }
        Commands::Random {
            customers,
            vip_ratio,
            seed,
        } => {
            println!(
                "🎲 Random traffic: {} customers, VIP ratio {}, seed {}",
                customers, vip_ratio, seed
            );
            random_steps(*customers, *vip_ratio, *seed)?
        }
    };

    let office = build_office(cli.profile_seed, !cli.no_messages)?;
    run_steps(&office, &steps).await
}
