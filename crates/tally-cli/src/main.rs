//! Tally CLI - Transaction categorization and spending analytics
//!
//! Usage:
//!   tally init                          Initialize database and default categories
//!   tally import --file CSV --user 1    Import transactions
//!   tally categorize -d "..." -a -12.5  Categorize a single transaction
//!   tally analyze --user 1              Spending analysis for this month
//!   tally rules add Groceries walmart   Manage categorization rules

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db),
                Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, &name),
            }
        }
        Commands::Import { file, user } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file, user)
        }
        Commands::Categorize {
            description,
            merchant,
            amount,
            location,
            json,
        } => {
            let service = commands::open_service(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_categorize(
                &service,
                &description,
                merchant.as_deref(),
                amount,
                location.as_deref(),
                json,
            )
        }
        Commands::Analyze {
            user,
            period,
            group_by,
            json,
        } => {
            let service = commands::open_service(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_analyze(&service, user, &period, &group_by, json)
        }
        Commands::Insights { user, period, json } => {
            let service = commands::open_service(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_insights(&service, user, &period, json)
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let service = commands::build_service(&db, cli.config.as_deref())?;
            match action {
                None => commands::cmd_rules_list(&service, 0, 50, false),
                Some(RulesAction::List {
                    offset,
                    limit,
                    json,
                }) => commands::cmd_rules_list(&service, offset, limit, json),
                Some(RulesAction::Show { id }) => commands::cmd_rules_show(&service, id),
                Some(RulesAction::Add {
                    category,
                    pattern,
                    pattern_type,
                    priority,
                }) => commands::cmd_rules_add(
                    &db,
                    &service,
                    &category,
                    &pattern,
                    &pattern_type,
                    priority,
                ),
                Some(RulesAction::Update {
                    id,
                    category,
                    pattern,
                    pattern_type,
                    priority,
                    active,
                }) => {
                    let changes = commands::RuleChanges {
                        category,
                        pattern,
                        pattern_type,
                        priority,
                        active,
                    };
                    commands::cmd_rules_update(&db, &service, id, &changes)
                }
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&service, id),
            }
        }
    }
}
