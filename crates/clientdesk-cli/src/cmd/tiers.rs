use crate::output::{print_json, print_table};
use clientdesk_core::proposal::{format_currency, tiers_for};

pub fn run(project_type: &str, json: bool) -> anyhow::Result<()> {
    let tiers = tiers_for(project_type);
    if json {
        return print_json(&tiers);
    }

    for tier in &tiers {
        println!(
            "{} ({}): {} - {}, quoted at {}",
            tier.name,
            tier.level,
            format_currency(tier.min),
            format_currency(tier.max),
            format_currency(tier.base_price())
        );
        if !tier.included.is_empty() {
            println!("  includes: {}", tier.included.join(", "));
        }
        if !tier.addons.is_empty() {
            let rows = tier
                .addons
                .iter()
                .map(|a| {
                    vec![
                        format!("  {}", a.id),
                        a.name.clone(),
                        format_currency(a.price),
                        (if a.taxable { "yes" } else { "" }).to_string(),
                    ]
                })
                .collect();
            print_table(&["  ADDON", "NAME", "PRICE", "TAXABLE"], rows);
        }
        println!();
    }
    Ok(())
}
