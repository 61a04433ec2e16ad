//! CLI module - Command-line interface for Bingarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::constants::limits;

/// Bingarr - Viewing History Ingestion
/// Turns raw streaming exports into a deduplicated catalog with sequel alerts
#[derive(Parser)]
#[command(name = "bingarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a viewing-history export (CSV with Title/Date columns)
    #[command(alias = "i")]
    Import {
        /// Path to the export file
        file: String,

        /// User the history belongs to
        #[arg(long)]
        user: Uuid,

        /// Source tag stamped on every imported row
        #[arg(long)]
        source: Option<String>,
    },

    /// Show a user's catalog, series grouped by base title
    #[command(alias = "c")]
    Catalog {
        /// User to show
        #[arg(long)]
        user: Uuid,
    },

    /// List canonical entities, newest first
    #[command(alias = "ls", alias = "l")]
    Entities {
        /// Number of entities to show
        #[arg(long, default_value_t = limits::DEFAULT_ENTITY_LIMIT)]
        limit: u64,
    },

    /// Show details about one entity
    Info {
        /// Entity ID
        id: i32,
    },

    /// List notifications for a user
    #[command(alias = "n")]
    Notifications {
        /// User to show
        #[arg(long)]
        user: Uuid,

        /// Only show unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Mark notifications as read
    MarkRead {
        /// Notification ID to mark
        id: Option<i32>,

        /// User whose notifications to mark with --all
        #[arg(long)]
        user: Option<Uuid>,

        /// Mark every unread notification for --user
        #[arg(long)]
        all: bool,
    },

    /// Re-run sequel detection over a user's whole history
    #[command(alias = "scan")]
    ScanSequels {
        /// User to scan
        #[arg(long)]
        user: Uuid,
    },

    /// Show recent import jobs
    #[command(alias = "j")]
    Jobs {
        /// Number of jobs to show
        #[arg(long, default_value_t = limits::DEFAULT_JOB_LIMIT)]
        limit: u64,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
