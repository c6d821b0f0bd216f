//! Quote arithmetic.
//!
//! Amounts stay as `f64` through every step and are rounded only by
//! [`display_amount`] when shown to a person.

use super::tiers::{tier_for, Tier, TierLevel};
use crate::error::{ClientdeskError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the subtotal, 0 to 100.
    Percent(f64),
    /// Fixed amount, clamped to the subtotal.
    Flat(f64),
}

impl Discount {
    fn validate(&self) -> Result<()> {
        match *self {
            Discount::Percent(p) if !(0.0..=100.0).contains(&p) => Err(
                ClientdeskError::InvalidPrice(format!("discount percent {p} is outside 0-100")),
            ),
            Discount::Flat(a) if !a.is_finite() || a < 0.0 => Err(ClientdeskError::InvalidPrice(
                format!("flat discount {a} is negative"),
            )),
            _ => Ok(()),
        }
    }

    fn amount(&self, subtotal: f64) -> f64 {
        let raw = match *self {
            Discount::Percent(p) => subtotal * p / 100.0,
            Discount::Flat(a) => a,
        };
        raw.clamp(0.0, subtotal.max(0.0))
    }
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// A hand-written line outside the tier packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomItem {
    pub description: String,
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Optional items are offered to the client and only count once selected.
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "default_true")]
    pub selected: bool,
    #[serde(default)]
    pub taxable: bool,
}

impl CustomItem {
    pub fn new(description: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        Self {
            description: description.into(),
            unit_price,
            quantity,
            optional: false,
            selected: true,
            taxable: false,
        }
    }

    pub fn taxable(mut self) -> Self {
        self.taxable = true;
        self
    }

    pub fn optional(mut self, selected: bool) -> Self {
        self.optional = true;
        self.selected = selected;
        self
    }

    pub fn amount(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    pub fn counts(&self) -> bool {
        !self.optional || self.selected
    }

    fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(ClientdeskError::InvalidPrice(
                "custom item needs a description".to_string(),
            ));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(ClientdeskError::InvalidPrice(format!(
                "'{}' has a negative price",
                self.description
            )));
        }
        if self.quantity == 0 {
            return Err(ClientdeskError::InvalidPrice(format!(
                "'{}' needs a quantity of at least 1",
                self.description
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PriceBreakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Base,
    Addon,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineKind,
    pub description: String,
    pub amount: f64,
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub project_type: String,
    pub tier: TierLevel,
    pub lines: Vec<LineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub taxable_amount: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub total: f64,
}

/// Whole currency units for display.
pub fn display_amount(amount: f64) -> i64 {
    amount.round() as i64
}

/// `$12,345` style rendering of [`display_amount`].
pub fn format_currency(amount: f64) -> String {
    let rounded = display_amount(amount);
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

// ---------------------------------------------------------------------------
// ProposalBuilder
// ---------------------------------------------------------------------------

/// The current selection for one proposal. Serialized as-is when a
/// proposal is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalBuilder {
    pub project_type: String,
    #[serde(default)]
    pub tier: Option<TierLevel>,
    #[serde(default)]
    pub addons: Vec<String>,
    #[serde(default)]
    pub custom_items: Vec<CustomItem>,
    #[serde(default)]
    pub discount: Option<Discount>,
    /// Fraction, e.g. `0.08` for 8%.
    #[serde(default)]
    pub tax_rate: f64,
}

impl ProposalBuilder {
    pub fn new(project_type: impl Into<String>) -> Self {
        Self {
            project_type: project_type.into(),
            tier: None,
            addons: Vec::new(),
            custom_items: Vec::new(),
            discount: None,
            tax_rate: 0.0,
        }
    }

    pub fn selected_tier(&self) -> Option<Tier> {
        self.tier.map(|level| tier_for(&self.project_type, level))
    }

    /// Switching to a different tier drops every added addon.
    pub fn select_tier(&mut self, level: TierLevel) {
        if self.tier != Some(level) {
            self.addons.clear();
        }
        self.tier = Some(level);
    }

    pub fn add_addon(&mut self, id: &str) -> Result<()> {
        let tier = self.selected_tier().ok_or(ClientdeskError::NoTierSelected)?;
        if tier.addon(id).is_none() {
            return Err(ClientdeskError::UnknownAddon {
                addon: id.to_string(),
                tier: tier.level.to_string(),
            });
        }
        if !self.addons.iter().any(|a| a == id) {
            self.addons.push(id.to_string());
        }
        Ok(())
    }

    pub fn remove_addon(&mut self, id: &str) -> bool {
        let before = self.addons.len();
        self.addons.retain(|a| a != id);
        self.addons.len() != before
    }

    /// Add when absent, remove when present. Returns whether it is now selected.
    pub fn toggle_addon(&mut self, id: &str) -> Result<bool> {
        if self.remove_addon(id) {
            Ok(false)
        } else {
            self.add_addon(id)?;
            Ok(true)
        }
    }

    pub fn add_custom_item(&mut self, item: CustomItem) -> Result<()> {
        item.validate()?;
        self.custom_items.push(item);
        Ok(())
    }

    pub fn set_discount(&mut self, discount: Option<Discount>) -> Result<()> {
        if let Some(d) = &discount {
            d.validate()?;
        }
        self.discount = discount;
        Ok(())
    }

    pub fn set_tax_rate(&mut self, rate: f64) -> Result<()> {
        validate_tax_rate(rate)?;
        self.tax_rate = rate;
        Ok(())
    }

    /// Price the current selection. Every field is re-checked so a builder
    /// deserialized from a request body gets the same validation as one
    /// assembled through the setters.
    pub fn calculate(&self) -> Result<PriceBreakdown> {
        let tier = self.selected_tier().ok_or(ClientdeskError::NoTierSelected)?;
        validate_tax_rate(self.tax_rate)?;
        if let Some(d) = &self.discount {
            d.validate()?;
        }

        let mut lines = vec![LineItem {
            kind: LineKind::Base,
            description: format!("{} package ({})", tier.name, tier.level),
            amount: tier.base_price(),
            taxable: tier.base_taxable,
        }];

        for id in &self.addons {
            let addon = tier.addon(id).ok_or_else(|| ClientdeskError::UnknownAddon {
                addon: id.clone(),
                tier: tier.level.to_string(),
            })?;
            lines.push(LineItem {
                kind: LineKind::Addon,
                description: addon.name.clone(),
                amount: addon.price,
                taxable: addon.taxable,
            });
        }

        for item in &self.custom_items {
            item.validate()?;
            if !item.counts() {
                continue;
            }
            let description = if item.quantity > 1 {
                format!("{} x{}", item.description, item.quantity)
            } else {
                item.description.clone()
            };
            lines.push(LineItem {
                kind: LineKind::Custom,
                description,
                amount: item.amount(),
                taxable: item.taxable,
            });
        }

        let subtotal: f64 = lines.iter().map(|l| l.amount).sum();
        let taxable_gross: f64 = lines.iter().filter(|l| l.taxable).map(|l| l.amount).sum();
        let discount = self.discount.map(|d| d.amount(subtotal)).unwrap_or(0.0);

        // The discount reduces taxable and non-taxable amounts by their share
        // of the subtotal.
        let taxable_amount = if subtotal > 0.0 {
            taxable_gross - discount * (taxable_gross / subtotal)
        } else {
            0.0
        };
        let tax = taxable_amount * self.tax_rate;

        Ok(PriceBreakdown {
            project_type: self.project_type.clone(),
            tier: tier.level,
            lines,
            subtotal,
            discount,
            taxable_amount,
            tax_rate: self.tax_rate,
            tax,
            total: subtotal - discount + tax,
        })
    }
}

fn validate_tax_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ClientdeskError::InvalidPrice(format!(
            "tax rate {rate} is negative"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn business(level: TierLevel) -> ProposalBuilder {
        let mut b = ProposalBuilder::new("business");
        b.select_tier(level);
        b
    }

    #[test]
    fn bare_tier_totals_midpoint() {
        for project_type in ["business", "ecommerce", "blog", "webapp", "unknown"] {
            for level in TierLevel::all() {
                let mut b = ProposalBuilder::new(project_type);
                b.select_tier(level);
                let tier = b.selected_tier().unwrap();
                let breakdown = b.calculate().unwrap();
                assert_eq!(
                    display_amount(breakdown.total),
                    ((tier.min + tier.max) / 2.0).round() as i64
                );
                assert_eq!(breakdown.tax, 0.0);
            }
        }
    }

    #[test]
    fn taxable_addon_with_sales_tax() {
        let mut b = business(TierLevel::Better);
        b.add_addon("booking").unwrap();
        b.set_tax_rate(0.08).unwrap();
        let q = b.calculate().unwrap();
        assert!(close(q.subtotal, 2300.0));
        assert!(close(q.tax, 24.0));
        assert!(close(q.total, 2324.0));
        assert_eq!(display_amount(q.total), 2324);
        assert_eq!(q.lines.len(), 2);
    }

    #[test]
    fn switching_tier_resets_addons() {
        let mut b = business(TierLevel::Good);
        b.add_addon("seo").unwrap();
        b.select_tier(TierLevel::Good);
        assert_eq!(b.addons, vec!["seo"]);
        b.select_tier(TierLevel::Best);
        assert!(b.addons.is_empty());
    }

    #[test]
    fn unknown_or_included_addon_rejected() {
        let mut b = business(TierLevel::Better);
        assert!(matches!(
            b.add_addon("seo"),
            Err(ClientdeskError::UnknownAddon { .. })
        ));
        assert!(matches!(
            b.add_addon("teleporter"),
            Err(ClientdeskError::UnknownAddon { .. })
        ));

        let mut untiered = ProposalBuilder::new("business");
        assert!(matches!(
            untiered.add_addon("booking"),
            Err(ClientdeskError::NoTierSelected)
        ));
        assert!(matches!(
            untiered.calculate(),
            Err(ClientdeskError::NoTierSelected)
        ));
    }

    #[test]
    fn toggle_addon() {
        let mut b = business(TierLevel::Good);
        assert!(b.toggle_addon("blog").unwrap());
        assert!(!b.toggle_addon("blog").unwrap());
        assert!(b.addons.is_empty());
    }

    #[test]
    fn custom_items_and_optional_lines() {
        let mut b = business(TierLevel::Good);
        b.add_custom_item(CustomItem::new("Logo refresh", 200.0, 2))
            .unwrap();
        b.add_custom_item(CustomItem::new("Photo shoot", 500.0, 1).optional(false))
            .unwrap();
        let q = b.calculate().unwrap();
        assert!(close(q.subtotal, 1150.0 + 400.0));
        assert_eq!(q.lines.len(), 2);
        assert_eq!(q.lines[1].description, "Logo refresh x2");

        b.custom_items[1].selected = true;
        assert!(close(b.calculate().unwrap().subtotal, 2050.0));
    }

    #[test]
    fn percent_discount_is_apportioned() {
        let mut b = business(TierLevel::Better);
        b.add_addon("booking").unwrap();
        b.set_tax_rate(0.10).unwrap();
        b.set_discount(Some(Discount::Percent(10.0))).unwrap();
        let q = b.calculate().unwrap();
        assert!(close(q.discount, 230.0));
        // 300 of 2300 is taxable, so it carries 300/2300 of the discount.
        assert!(close(q.taxable_amount, 270.0));
        assert!(close(q.tax, 27.0));
        assert!(close(q.total, 2300.0 - 230.0 + 27.0));
    }

    #[test]
    fn flat_discount_is_clamped() {
        let mut b = business(TierLevel::Good);
        b.set_discount(Some(Discount::Flat(10_000.0))).unwrap();
        let q = b.calculate().unwrap();
        assert!(close(q.discount, q.subtotal));
        assert!(close(q.total, 0.0));
    }

    #[test]
    fn rejects_bad_numbers() {
        let mut b = business(TierLevel::Good);
        assert!(b.set_tax_rate(-0.01).is_err());
        assert!(b.set_discount(Some(Discount::Percent(120.0))).is_err());
        assert!(b.set_discount(Some(Discount::Percent(-1.0))).is_err());
        assert!(b.set_discount(Some(Discount::Flat(-5.0))).is_err());
        assert!(b
            .add_custom_item(CustomItem::new("Refund", -50.0, 1))
            .is_err());
        assert!(b.add_custom_item(CustomItem::new("Nothing", 50.0, 0)).is_err());

        b.tax_rate = -1.0;
        assert!(matches!(
            b.calculate(),
            Err(ClientdeskError::InvalidPrice(_))
        ));
    }

    #[test]
    fn builder_json_shape() {
        let json = serde_json::json!({
            "project_type": "business",
            "tier": "better",
            "addons": ["booking"],
            "custom_items": [{"description": "Hosting", "unit_price": 120.0}],
            "discount": {"type": "flat", "value": 20.0},
            "tax_rate": 0.08
        });
        let b: ProposalBuilder = serde_json::from_value(json).unwrap();
        assert_eq!(b.custom_items[0].quantity, 1);
        assert!(b.custom_items[0].selected);
        let q = b.calculate().unwrap();
        assert!(close(q.subtotal, 2420.0));
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(2324.4), "$2,324");
        assert_eq!(format_currency(999.5), "$1,000");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(0.0), "$0");
    }
}
