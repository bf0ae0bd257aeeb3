//! Blockwatch CLI
//!
//! Command-line interface for one-off Blockwatch operations:
//! - Show the tracked counters
//! - Print the most-blocked leaderboard
//! - Watch poll cycles in the terminal
//! - Check a running server
//! - Fake a leaderboard move on a running server
//! - Generate a config file

use blockwatch::api::dto::{HealthResponse, RankedEntry};
use blockwatch::config::Config;
use blockwatch::format::{format_compact, format_number, gap_headline};
use blockwatch::logging::init_tracing;
use blockwatch::metrics::{self, RateOfChange};
use blockwatch::poll::{CycleReport, PollEvent, Poller};
use blockwatch::rank::RankTransition;
use blockwatch::upstream::{ClearskyClient, CounterReading, Fetcher};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "blockwatch-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query Clearsky block counts and watch the race for #1")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Blockwatch server URL, for `status`
    #[arg(long, default_value = "http://localhost:4173", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show both tracked counters and the gap between them
    Counts,

    /// Print the most-blocked accounts
    Leaderboard {
        /// Number of entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Poll continuously and print every cycle
    Watch {
        /// Poll interval in seconds (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show the status of a running server
    Status,

    /// Fake a leaderboard move on a running server (needs `debug_endpoints`)
    Simulate {
        /// rank-up or rank-1
        #[arg(value_parser = ["rank-up", "rank-1"])]
        mode: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    // keep stdout clean for tables; warnings still show
    config.logging.level = "warn".to_string();
    init_tracing(&config.logging);

    match cli.command {
        Commands::Counts => {
            let fetcher = build_fetcher(&config)?;
            let (incumbent, challenger) = fetcher.tracked_counters().await;
            let (incumbent, challenger) = (incumbent?, challenger?);

            if cli.format == "json" {
                let body = serde_json::json!({
                    "incumbent": incumbent,
                    "challenger": challenger,
                    "comparison": metrics::compare(
                        blockwatch::CounterPair::new(incumbent.count, challenger.count),
                        None,
                        config.poll.interval(),
                    ),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let tracking = &config.tracking;
                print_counter(&tracking.incumbent.handle, &incumbent);
                print_counter(&tracking.challenger.handle, &challenger);
                println!();

                let gap = metrics::gap(incumbent.count, challenger.count);
                println!(
                    "{}",
                    gap_headline(gap, &tracking.incumbent.handle, &tracking.challenger.handle)
                );
                println!(
                    "Progress to overtake: {}%",
                    metrics::percent_to_overtake(incumbent.count, challenger.count)
                );
            }
        }

        Commands::Leaderboard { limit } => {
            if limit == Some(0) {
                eprintln!("--limit must be at least 1");
                std::process::exit(1);
            }

            let fetcher = build_fetcher(&config)?;
            let list = fetcher
                .fetch_ranked_list(limit.unwrap_or(fetcher.default_limit()))
                .await;
            let entries = RankedEntry::from_list(&list, &config.tracking);

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_leaderboard(&entries);
            }
        }

        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                config.poll.interval_secs = secs.max(1);
            }

            let fetcher = Arc::new(build_fetcher(&config)?);
            let poller = Arc::new(Poller::new(fetcher, &config.poll));
            let mut events = poller.subscribe();
            let handle = Arc::clone(&poller).start();

            println!(
                "Watching {} vs {} every {}s (Ctrl+C to stop)",
                config.tracking.incumbent.handle,
                config.tracking.challenger.handle,
                config.poll.interval_secs
            );

            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(PollEvent::Committed(report)) => print_cycle(&report, &config),
                        Ok(PollEvent::Failed { message }) => eprintln!("Poll failed: {}", message),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            handle.abort();
        }

        Commands::Status => {
            let client = reqwest::Client::new();
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: HealthResponse = resp.json().await?;

                    println!("Blockwatch v{}", health.version);
                    println!();
                    println!("Status: {}", health.status);
                    println!("Cycles committed: {}", health.cycles);
                    if let Some(last_poll) = health.last_poll {
                        println!("Last poll: {}", last_poll.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                    if let Some(error) = health.last_error {
                        println!("Last error: {}", error);
                    }
                    println!("WebSocket clients: {}", health.ws_connections);
                    println!();
                    println!("Uptime: {}", format_duration(health.uptime_seconds));
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Blockwatch at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin blockwatch");
                    std::process::exit(1);
                }
            }
        }

        Commands::Simulate { mode } => {
            let client = reqwest::Client::new();
            let response = client
                .post(format!("{}/api/v1/debug/simulate", cli.api_url))
                .json(&serde_json::json!({ "mode": mode }))
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                eprintln!("Debug endpoints are disabled on {}", cli.api_url);
                eprintln!("Set `debug_endpoints = true` under [api] and restart the server.");
                std::process::exit(1);
            }

            let body: serde_json::Value = response.json().await?;
            if !status.is_success() {
                eprintln!(
                    "Simulation rejected ({}): {}",
                    status,
                    body["error"]["message"].as_str().unwrap_or("unknown error")
                );
                std::process::exit(1);
            }

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let report = &body["report"];
                let transition = &report["challenger"]["transition"];
                let handle = &config.tracking.challenger.handle;
                match transition["kind"].as_str() {
                    Some("reached_first") => {
                        println!("Cycle {}: {} is now #1 most blocked", report["cycle"], handle)
                    }
                    Some("ranked_up") => println!(
                        "Cycle {}: {} moved up to #{}",
                        report["cycle"], handle, transition["rank"]
                    ),
                    _ => println!("Cycle {}: no rank change", report["cycle"]),
                }
            }
        }

        Commands::Config { output } => {
            let config = blockwatch::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn build_fetcher(config: &Config) -> Result<Fetcher, Box<dyn std::error::Error>> {
    config.validate()?;
    let client = ClearskyClient::new(config.upstream.clone())?;
    Ok(Fetcher::new(
        Arc::new(client),
        config.tracking.clone(),
        &config.upstream,
    ))
}

fn print_counter(handle: &str, reading: &CounterReading) {
    let marker = if reading.is_fallback() { "  (fallback)" } else { "" };
    println!(
        "{:<20} {:>10} blockers{}",
        handle,
        format_number(Some(reading.count)),
        marker
    );
}

fn print_leaderboard(entries: &[RankedEntry]) {
    if entries.is_empty() {
        println!("No data");
        return;
    }

    println!("{:<6} {:<32} {:>10} {:>8}", "Rank", "Handle", "Blocked", "Short");
    println!("{}", "-".repeat(60));

    for entry in entries {
        let marker = if entry.tracked.is_some() { " *" } else { "" };
        println!(
            "{:<6} {:<32} {:>10} {:>8}{}",
            format!("#{}", entry.rank),
            entry.handle,
            format_number(Some(entry.blocker_count)),
            format_compact(entry.blocker_count),
            marker
        );
    }
}

fn print_cycle(report: &CycleReport, config: &Config) {
    let tracking = &config.tracking;
    let time = report.committed_at.format("%H:%M:%S");

    println!(
        "[{}] #{} {} {} | {} {} | {}",
        time,
        report.cycle,
        tracking.incumbent.handle,
        format_number(Some(report.counters.incumbent)),
        tracking.challenger.handle,
        format_number(Some(report.counters.challenger)),
        gap_headline(report.comparison.gap, &tracking.incumbent.handle, &tracking.challenger.handle),
    );

    match report.comparison.rate {
        Some(RateOfChange::Closing {
            blocks_per_hour,
            hours_to_overtake,
        }) => match hours_to_overtake {
            Some(hours) => println!(
                "    closing at {:.0}/h, overtake in ~{}h",
                blocks_per_hour, hours
            ),
            None => println!("    closing at {:.0}/h", blocks_per_hour),
        },
        Some(RateOfChange::PullingAhead { blocks_per_hour }) => {
            println!("    {} pulling ahead at {:.0}/h", tracking.incumbent.handle, blocks_per_hour)
        }
        None => {}
    }

    match report.challenger.transition {
        Some(RankTransition::ReachedFirst) => {
            println!("    *** {} is now #1 most blocked! ***", tracking.challenger.handle)
        }
        Some(RankTransition::RankedUp { rank }) => {
            println!("    {} moved up to #{}", tracking.challenger.handle, rank)
        }
        None => {}
    }

    if report.incumbent_fallback || report.challenger_fallback {
        println!("    (some counters are fallback values)");
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
