//! Tiered proposals: package tables, quote arithmetic and saved proposals.

pub mod pricing;
pub mod store;
pub mod tiers;

pub use pricing::{
    display_amount, format_currency, CustomItem, Discount, LineItem, LineKind, PriceBreakdown,
    ProposalBuilder,
};
pub use store::ProposalRecord;
pub use tiers::{tier_for, tiers_for, Addon, Tier, TierLevel};
