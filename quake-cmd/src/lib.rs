//! Command implementations for the quake CLI.
//!
//! Wires the feed client, pipeline cache and [`service::DashboardService`]
//! together and exposes them as subcommands: an HTTP server plus one-shot
//! dashboard, event-list and health reports.

use clap::Subcommand;
use config::FeedArgs;
use std::net::SocketAddr;

pub mod cache;
pub mod config;
pub mod error;
pub mod plan;
pub mod report;
pub mod server;
pub mod service;

#[derive(Subcommand)]
pub enum Command {
    /// Serve the dashboard, raw-event and health endpoints over HTTP
    Serve {
        #[command(flatten)]
        feed: FeedArgs,

        /// Address to listen on
        #[arg(long, env = "QUAKE_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Run the pipeline once and print the dashboard view as JSON
    Dashboard {
        #[command(flatten)]
        feed: FeedArgs,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the de-duplicated event list as JSON, or write it as CSV
    Events {
        #[command(flatten)]
        feed: FeedArgs,

        /// Write the events to this CSV file instead of stdout
        #[arg(short = 'o', long)]
        csv: Option<String>,
    },

    /// Check whether the upstream feed is reachable
    Health {
        #[command(flatten)]
        feed: FeedArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { feed, bind } => report::run_serve(feed.into_config()?, bind).await,
        Command::Dashboard { feed, pretty } => {
            report::run_dashboard(feed.into_config()?, pretty).await
        }
        Command::Events { feed, csv } => {
            report::run_events(feed.into_config()?, csv.as_deref()).await
        }
        Command::Health { feed } => report::run_health(feed.into_config()?).await,
    }
}
