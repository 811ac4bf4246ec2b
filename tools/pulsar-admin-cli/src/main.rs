// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pulsar Administration CLI
//!
//! Command-line tool for managing subscriptions and inspecting backlogs.
//!
//! # Usage
//!
//! ```bash
//! # List subscriptions of a topic
//! pulsar-admin subscriptions list persistent://public/default/orders
//!
//! # Peek the first 10 messages of a backlog
//! pulsar-admin subscriptions peek orders -s audit --count 10
//!
//! # Rewind a subscription to a point in time
//! pulsar-admin subscriptions reset-cursor orders -s audit --time 2024-05-01T10:00:00Z
//!
//! # Against a remote broker
//! pulsar-admin --web-service-url http://broker:8080 subscriptions list orders
//!
//! # Write a starting config file
//! pulsar-admin gen-config > pulsar-admin.toml
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pulsar_admin::{ClientConfig, Message, MessageId, PulsarAdmin, TopicName};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

/// Pulsar Administration CLI
#[derive(Parser, Debug)]
#[command(name = "pulsar-admin")]
#[command(about = "Pulsar subscription administration")]
#[command(version)]
struct Args {
    /// Client configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Broker web service URL (overrides the config file)
    #[arg(long, env = "PULSAR_WEB_SERVICE_URL")]
    web_service_url: Option<String>,

    /// Log level or tracing filter directive
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage subscriptions
    #[command(subcommand)]
    Subscriptions(SubscriptionCommand),

    /// Print the effective client configuration as TOML
    GenConfig,
}

#[derive(Subcommand, Debug)]
enum SubscriptionCommand {
    /// Create a subscription
    Create {
        topic: String,
        #[arg(short, long)]
        subscription: String,
        /// Initial position: "latest", "earliest" or ledger:entry[:partition]
        #[arg(short, long, default_value = "latest")]
        message_id: String,
    },

    /// Delete a subscription
    Delete {
        topic: String,
        #[arg(short, long)]
        subscription: String,
    },

    /// List subscriptions of a topic
    List { topic: String },

    /// Move a subscription cursor
    ResetCursor {
        topic: String,
        #[arg(short, long)]
        subscription: String,
        /// Target message: "earliest", "latest" or ledger:entry[:partition]
        #[arg(short, long, required_unless_present = "time", conflicts_with = "time")]
        message_id: Option<String>,
        /// Target time: RFC 3339 or epoch milliseconds
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Skip every message in the backlog
    ClearBacklog {
        topic: String,
        #[arg(short, long)]
        subscription: String,
    },

    /// Skip messages from the head of the backlog
    Skip {
        topic: String,
        #[arg(short, long)]
        subscription: String,
        #[arg(short = 'n', long)]
        count: u64,
    },

    /// Expire messages older than the given age
    Expire {
        topic: String,
        #[arg(short, long)]
        subscription: String,
        /// Age in seconds
        #[arg(short = 't', long)]
        expire_time: u64,
    },

    /// Expire messages older than the given age on all subscriptions
    ExpireAll {
        topic: String,
        /// Age in seconds
        #[arg(short = 't', long)]
        expire_time: u64,
    },

    /// Show messages without consuming them
    Peek {
        topic: String,
        #[arg(short, long)]
        subscription: String,
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Commands::GenConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Subscriptions(cmd) => {
            tracing::debug!("Using broker {}", config.web_service_url);
            let admin = PulsarAdmin::new(&config).context("invalid client configuration")?;
            cmd_subscriptions(&admin, cmd)
        }
    }
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.web_service_url {
        config.web_service_url = url.clone();
    }
    Ok(config)
}

fn cmd_subscriptions(admin: &PulsarAdmin, cmd: SubscriptionCommand) -> Result<()> {
    let subs = admin.subscriptions();

    match cmd {
        SubscriptionCommand::Create {
            topic,
            subscription,
            message_id,
        } => {
            let topic = TopicName::parse(&topic)?;
            subs.create(&topic, &subscription, parse_position(&message_id)?)?;
            println!(
                "{} subscription {} on {}",
                "Created".green().bold(),
                subscription,
                topic
            );
        }

        SubscriptionCommand::Delete {
            topic,
            subscription,
        } => {
            let topic = TopicName::parse(&topic)?;
            subs.delete(&topic, &subscription)?;
            println!(
                "{} subscription {} on {}",
                "Deleted".green().bold(),
                subscription,
                topic
            );
        }

        SubscriptionCommand::List { topic } => {
            let topic = TopicName::parse(&topic)?;
            let names = subs.list(&topic)?;

            println!("{}", format!("Subscriptions of {}", topic).cyan().bold());
            println!("  Count: {}", names.len());
            if names.is_empty() {
                println!("  {}", "No subscriptions".yellow());
            }
            for name in names {
                println!("  {}", name);
            }
        }

        SubscriptionCommand::ResetCursor {
            topic,
            subscription,
            message_id,
            time,
        } => {
            let topic = TopicName::parse(&topic)?;
            match (message_id, time) {
                (Some(id), _) => {
                    let position = parse_position(&id)?;
                    subs.reset_cursor_to_message_id(&topic, &subscription, position)?;
                    println!(
                        "{} {} to message {}",
                        "Reset".green().bold(),
                        subscription,
                        position
                    );
                }
                (None, Some(time)) => {
                    let millis = parse_timestamp_millis(&time)?;
                    subs.reset_cursor_to_timestamp(&topic, &subscription, millis)?;
                    println!(
                        "{} {} to {}",
                        "Reset".green().bold(),
                        subscription,
                        format_millis(millis)
                    );
                }
                (None, None) => anyhow::bail!("either --message-id or --time is required"),
            }
        }

        SubscriptionCommand::ClearBacklog {
            topic,
            subscription,
        } => {
            let topic = TopicName::parse(&topic)?;
            subs.clear_backlog(&topic, &subscription)?;
            println!("{} backlog of {}", "Cleared".green().bold(), subscription);
        }

        SubscriptionCommand::Skip {
            topic,
            subscription,
            count,
        } => {
            let topic = TopicName::parse(&topic)?;
            subs.skip_messages(&topic, &subscription, count)?;
            println!(
                "{} {} message(s) on {}",
                "Skipped".green().bold(),
                count,
                subscription
            );
        }

        SubscriptionCommand::Expire {
            topic,
            subscription,
            expire_time,
        } => {
            let topic = TopicName::parse(&topic)?;
            subs.expire_messages(&topic, &subscription, expire_time)?;
            println!(
                "{} messages older than {}s on {}",
                "Expired".green().bold(),
                expire_time,
                subscription
            );
        }

        SubscriptionCommand::ExpireAll { topic, expire_time } => {
            let topic = TopicName::parse(&topic)?;
            subs.expire_all_messages(&topic, expire_time)?;
            println!(
                "{} messages older than {}s on all subscriptions of {}",
                "Expired".green().bold(),
                expire_time,
                topic
            );
        }

        SubscriptionCommand::Peek {
            topic,
            subscription,
            count,
        } => {
            let topic = TopicName::parse(&topic)?;
            let messages = subs.peek_messages(&topic, &subscription, count)?;
            print_messages(&topic, &messages);
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "Message ID")]
    id: String,
    #[tabled(rename = "Publish Time")]
    publish_time: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Properties")]
    properties: String,
}

fn print_messages(topic: &TopicName, messages: &[Message]) {
    println!("{}", format!("Messages on {}", topic).cyan().bold());
    println!("  Count: {}", messages.len());
    println!();

    if messages.is_empty() {
        println!("  {}", "No messages".yellow());
        return;
    }

    let rows: Vec<MessageRow> = messages
        .iter()
        .map(|m| MessageRow {
            id: m.message_id.to_string(),
            publish_time: m.property("publish-time").unwrap_or("-").to_string(),
            size: format_bytes(m.payload.len()),
            properties: format_properties(m),
        })
        .collect();
    println!("{}", Table::new(rows));

    println!();
    println!("{}", "Payloads".bold());
    for m in messages {
        println!("  {} {}", m.message_id.to_string().dimmed(), preview(&m.payload));
    }
}

/// Properties other than the ones already shown in their own column.
fn format_properties(message: &Message) -> String {
    let shown: Vec<String> = message
        .properties
        .iter()
        .filter(|(k, _)| k.as_str() != "publish-time")
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    if shown.is_empty() {
        "-".to_string()
    } else {
        shown.join(", ")
    }
}

fn parse_position(s: &str) -> Result<MessageId> {
    match s.to_ascii_lowercase().as_str() {
        "earliest" => Ok(MessageId::EARLIEST),
        "latest" => Ok(MessageId::LATEST),
        _ => Ok(MessageId::parse(s)?),
    }
}

/// RFC 3339 timestamp or epoch milliseconds.
fn parse_timestamp_millis(s: &str) -> Result<i64> {
    if let Ok(millis) = s.parse::<i64>() {
        return Ok(millis);
    }
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid time {:?}: expected RFC 3339 or epoch millis", s))?;
    Ok(parsed.timestamp_millis())
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| format!("{} ms", millis))
}

fn format_bytes(len: usize) -> String {
    if len < 1024 {
        format!("{} B", len)
    } else if len < 1024 * 1024 {
        format!("{:.1} KiB", len as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", len as f64 / (1024.0 * 1024.0))
    }
}

const PREVIEW_CHARS: usize = 64;

fn preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let mut out: String = text
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c.is_control() { '.' } else { c })
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
