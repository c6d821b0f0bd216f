use crate::output::{print_json, print_table};
use anyhow::{bail, Context};
use clientdesk_core::config::Config;
use clientdesk_core::db::Database;
use clientdesk_core::proposal::{
    display_amount, format_currency, store, CustomItem, Discount, ProposalBuilder, TierLevel,
};
use std::path::Path;

pub struct QuoteArgs {
    pub project_type: String,
    pub tier: String,
    pub addons: Vec<String>,
    pub items: Vec<String>,
    pub discount_percent: Option<f64>,
    pub discount_flat: Option<f64>,
    pub tax_rate: f64,
    pub save_for: Option<String>,
}

/// `DESC:PRICE[:QTY]`, splitting from the right so descriptions may contain colons.
fn parse_item(raw: &str) -> anyhow::Result<CustomItem> {
    let parts: Vec<&str> = raw.rsplitn(3, ':').collect();
    let (description, price, quantity) = match parts.as_slice() {
        [price, description] => (*description, *price, None),
        [last, middle, first] => match middle.trim().parse::<f64>() {
            Ok(_) => (*first, *middle, Some(*last)),
            Err(_) => (raw.rsplit_once(':').map(|(d, _)| d).unwrap_or(raw), *last, None),
        },
        _ => bail!("custom item '{raw}' must look like DESC:PRICE or DESC:PRICE:QTY"),
    };
    let unit_price: f64 = price
        .trim()
        .parse()
        .with_context(|| format!("invalid price '{price}' in '{raw}'"))?;
    let quantity: u32 = match quantity {
        Some(q) => q
            .trim()
            .parse()
            .with_context(|| format!("invalid quantity '{q}' in '{raw}'"))?,
        None => 1,
    };
    Ok(CustomItem::new(description.trim(), unit_price, quantity))
}

fn build(args: &QuoteArgs) -> anyhow::Result<ProposalBuilder> {
    let level: TierLevel = args.tier.parse()?;
    let mut builder = ProposalBuilder::new(args.project_type.trim());
    builder.select_tier(level);
    for addon in &args.addons {
        builder.add_addon(addon)?;
    }
    for raw in &args.items {
        builder.add_custom_item(parse_item(raw)?)?;
    }
    let discount = match (args.discount_percent, args.discount_flat) {
        (Some(p), None) => Some(Discount::Percent(p)),
        (None, Some(a)) => Some(Discount::Flat(a)),
        (None, None) => None,
        (Some(_), Some(_)) => bail!("use either --discount-percent or --discount-flat, not both"),
    };
    builder.set_discount(discount)?;
    builder.set_tax_rate(args.tax_rate)?;
    Ok(builder)
}

pub fn run(root: &Path, args: QuoteArgs, json: bool) -> anyhow::Result<()> {
    let builder = build(&args)?;
    let breakdown = builder.calculate()?;

    let saved = match &args.save_for {
        Some(email) => {
            let config = Config::load(root).context("failed to load config")?;
            let mut db = Database::open_migrated(&config.database_path(root))
                .context("failed to open database")?;
            Some(store::save(&mut db, email, None, &builder)?)
        }
        None => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "breakdown": breakdown,
            "display_total": display_amount(breakdown.total),
            "proposal_id": saved.as_ref().map(|p| p.id),
        }));
    }

    let rows = breakdown
        .lines
        .iter()
        .map(|line| {
            vec![
                line.description.clone(),
                format_currency(line.amount),
                (if line.taxable { "yes" } else { "" }).to_string(),
            ]
        })
        .collect();
    print_table(&["ITEM", "AMOUNT", "TAXABLE"], rows);
    println!();
    println!("Subtotal:  {}", format_currency(breakdown.subtotal));
    if breakdown.discount > 0.0 {
        println!("Discount: -{}", format_currency(breakdown.discount));
    }
    if breakdown.tax > 0.0 {
        println!(
            "Tax:       {} ({}% of {})",
            format_currency(breakdown.tax),
            breakdown.tax_rate * 100.0,
            format_currency(breakdown.taxable_amount)
        );
    }
    println!("Total:     {}", format_currency(breakdown.total));
    if let Some(record) = saved {
        println!("\nSaved as proposal #{} for {}", record.id, record.client_email);
    }
    Ok(())
}
