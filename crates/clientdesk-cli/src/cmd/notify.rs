use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use clientdesk_core::config::Config;
use clientdesk_core::db::{Database, PageRequest};
use clientdesk_core::notification::{self, NewNotification, NotificationKind, STUDIO_INBOX};
use std::path::Path;

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// List notifications for a recipient, newest first
    List {
        #[arg(long, default_value = STUDIO_INBOX)]
        recipient: String,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Post a notification to a recipient's feed
    Add {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// intake, proposal or message
        #[arg(long, default_value = "message")]
        kind: String,
    },

    /// Mark one notification as read
    Read { id: i64 },

    /// Mark every notification for a recipient as read
    ReadAll {
        #[arg(long, default_value = STUDIO_INBOX)]
        recipient: String,
    },
}

pub fn run(root: &Path, subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let db = Database::open_migrated(&config.database_path(root))
        .context("failed to open database")?;

    match subcmd {
        NotifySubcommand::List {
            recipient,
            unread,
            page,
            per_page,
        } => {
            let page = notification::list(
                db.conn(),
                &recipient,
                unread,
                PageRequest::new(page, per_page),
            )?;
            if json {
                return print_json(&page);
            }
            if page.items.is_empty() {
                println!("No notifications for {recipient}.");
                return Ok(());
            }
            let rows = page
                .items
                .iter()
                .map(|n| {
                    vec![
                        n.id.to_string(),
                        n.kind.to_string(),
                        n.title.clone(),
                        n.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        (if n.is_read() { "" } else { "unread" }).to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "KIND", "TITLE", "CREATED", ""], rows);
            println!(
                "\npage {} of {} ({} total)",
                page.page,
                page.total_pages().max(1),
                page.total
            );
        }
        NotifySubcommand::Add {
            recipient,
            title,
            body,
            kind,
        } => {
            let kind: NotificationKind = kind.parse()?;
            let created = notification::create(
                db.conn(),
                &NewNotification::new(recipient, kind, title, body),
            )?;
            if json {
                return print_json(&created);
            }
            println!("Added notification #{} for {}", created.id, created.recipient);
        }
        NotifySubcommand::Read { id } => {
            let updated = notification::mark_read(db.conn(), id)?;
            if json {
                return print_json(&updated);
            }
            println!("Marked #{} as read", updated.id);
        }
        NotifySubcommand::ReadAll { recipient } => {
            let marked = notification::mark_all_read(db.conn(), &recipient)?;
            if json {
                return print_json(&serde_json::json!({ "marked": marked }));
            }
            println!("Marked {marked} notification(s) as read");
        }
    }
    Ok(())
}
