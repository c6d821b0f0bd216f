use anyhow::Context;
use clientdesk_core::{config::Config, db::Database, io, migrations::Migrator, paths};
use std::path::Path;

pub fn run(root: &Path, company: Option<&str>) -> anyhow::Result<()> {
    let company = company
        .map(str::to_string)
        .or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Studio".to_string());

    println!("Initializing clientdesk in: {}", root.display());

    for dir in [paths::CLIENTDESK_DIR, paths::INTAKE_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  .clientdesk/config.yaml");
        Config::load(root).context("failed to load existing config.yaml")?
    } else {
        let cfg = Config::new(&company);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: .clientdesk/config.yaml");
        cfg
    };

    let db_path = config.database_path(root);
    let mut db = Database::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    let applied = Migrator::new(&mut db).migrate_up()?;
    if applied.is_empty() {
        println!("  exists:  {}", db_path.display());
    } else {
        println!(
            "  created: {} (schema version {})",
            db_path.display(),
            applied.last().copied().unwrap_or_default()
        );
    }

    println!("\nNext: `clientdesk intake` to try the questionnaire, `clientdesk serve` for the API.");
    Ok(())
}
