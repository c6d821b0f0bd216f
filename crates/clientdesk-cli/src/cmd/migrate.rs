use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use clientdesk_core::config::Config;
use clientdesk_core::db::Database;
use clientdesk_core::migrations::Migrator;
use std::path::Path;

#[derive(Subcommand)]
pub enum MigrateSubcommand {
    /// Show applied and pending migrations
    Status,

    /// Apply all pending migrations
    Up,

    /// Roll back the most recent migrations
    Down {
        #[arg(long, default_value = "1")]
        steps: usize,
    },
}

pub fn run(root: &Path, subcmd: MigrateSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let path = config.database_path(root);
    let mut db = Database::open(&path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    let mut migrator = Migrator::new(&mut db);

    match subcmd {
        MigrateSubcommand::Status => {
            let status = migrator.status()?;
            if json {
                return print_json(&status);
            }
            let rows = status
                .iter()
                .map(|s| {
                    vec![
                        s.version.to_string(),
                        s.name.clone(),
                        s.applied_at
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "pending".to_string()),
                    ]
                })
                .collect();
            print_table(&["VERSION", "NAME", "APPLIED"], rows);
        }
        MigrateSubcommand::Up => {
            let applied = migrator.migrate_up()?;
            if json {
                return print_json(&serde_json::json!({ "applied": applied }));
            }
            if applied.is_empty() {
                println!("Database is up to date.");
            } else {
                for version in applied {
                    println!("applied: {version}");
                }
            }
        }
        MigrateSubcommand::Down { steps } => {
            let rolled_back = migrator.rollback(steps)?;
            if json {
                return print_json(&serde_json::json!({ "rolled_back": rolled_back }));
            }
            if rolled_back.is_empty() {
                println!("Nothing to roll back.");
            } else {
                for version in rolled_back {
                    println!("rolled back: {version}");
                }
            }
        }
    }
    Ok(())
}
