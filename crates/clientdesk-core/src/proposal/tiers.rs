//! Good / better / best packages per project type.

use crate::error::{ClientdeskError, Result};
use crate::intake::catalog::FALLBACK_PROJECT_TYPE;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Good,
    Better,
    Best,
}

impl TierLevel {
    pub fn all() -> [TierLevel; 3] {
        [TierLevel::Good, TierLevel::Better, TierLevel::Best]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TierLevel::Good => "good",
            TierLevel::Better => "better",
            TierLevel::Best => "best",
        }
    }
}

impl std::fmt::Display for TierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierLevel {
    type Err = ClientdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(TierLevel::Good),
            "better" => Ok(TierLevel::Better),
            "best" => Ok(TierLevel::Best),
            other => Err(ClientdeskError::UnknownTier(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Licensed products and subscriptions are taxable; labour is not.
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub level: TierLevel,
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub base_taxable: bool,
    pub included: Vec<String>,
    pub addons: Vec<Addon>,
}

impl Tier {
    /// Midpoint of the advertised range.
    pub fn base_price(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn addon(&self, id: &str) -> Option<&Addon> {
        self.addons.iter().find(|a| a.id == id)
    }
}

// ---------------------------------------------------------------------------
// Price tables
// ---------------------------------------------------------------------------

/// (id, name, price, taxable)
type FeatureRow = (&'static str, &'static str, f64, bool);
/// (min, max, included feature ids)
type TierRow = (f64, f64, &'static [&'static str]);

struct Package {
    project_type: &'static str,
    features: &'static [FeatureRow],
    tiers: [TierRow; 3],
}

const PACKAGES: &[Package] = &[
    Package {
        project_type: "business",
        features: &[
            ("contact-form", "Contact form", 150.0, false),
            ("booking", "Online booking integration", 300.0, true),
            ("testimonials", "Testimonials section", 150.0, false),
            ("blog", "Blog / news", 400.0, false),
            ("seo", "SEO setup", 350.0, false),
            ("analytics", "Analytics dashboard", 200.0, false),
            ("newsletter", "Newsletter signup", 250.0, true),
        ],
        tiers: [
            (800.0, 1500.0, &["contact-form"]),
            (1500.0, 2500.0, &["contact-form", "testimonials", "seo"]),
            (3000.0, 5000.0, &["contact-form", "testimonials", "seo", "blog", "analytics"]),
        ],
    },
    Package {
        project_type: "ecommerce",
        features: &[
            ("reviews", "Product reviews", 300.0, false),
            ("inventory", "Inventory management", 600.0, false),
            ("shipping", "Shipping rate integration", 450.0, false),
            ("seo", "SEO setup", 350.0, false),
            ("analytics", "Sales analytics", 200.0, false),
            ("subscriptions", "Subscription products", 900.0, true),
        ],
        tiers: [
            (3000.0, 6000.0, &[]),
            (7000.0, 12000.0, &["reviews", "seo"]),
            (15000.0, 25000.0, &["reviews", "seo", "inventory", "shipping", "analytics"]),
        ],
    },
    Package {
        project_type: "portfolio",
        features: &[
            ("gallery", "Project gallery", 300.0, false),
            ("contact-form", "Contact form", 150.0, false),
            ("testimonials", "Testimonials section", 150.0, false),
            ("blog", "Blog", 400.0, false),
            ("seo", "SEO setup", 350.0, false),
        ],
        tiers: [
            (500.0, 1000.0, &["gallery"]),
            (1000.0, 2000.0, &["gallery", "contact-form"]),
            (2500.0, 4000.0, &["gallery", "contact-form", "testimonials", "blog"]),
        ],
    },
    Package {
        project_type: "blog",
        features: &[
            ("newsletter", "Newsletter", 250.0, true),
            ("comments", "Comments", 200.0, false),
            ("seo", "SEO setup", 350.0, false),
            ("analytics", "Analytics", 200.0, false),
            ("membership", "Paid membership", 800.0, true),
        ],
        tiers: [
            (500.0, 1000.0, &[]),
            (1000.0, 2500.0, &["seo", "comments"]),
            (2500.0, 5000.0, &["seo", "comments", "newsletter", "analytics"]),
        ],
    },
    Package {
        project_type: "webapp",
        features: &[
            ("user-accounts", "User accounts", 2000.0, false),
            ("payments", "Subscriptions & payments", 2500.0, true),
            ("dashboard", "Admin dashboard", 3000.0, false),
            ("api-integrations", "Third-party integrations", 1500.0, false),
            ("notifications", "Email notifications", 800.0, false),
            ("analytics", "Usage analytics", 600.0, false),
        ],
        tiers: [
            (10000.0, 20000.0, &["user-accounts"]),
            (20000.0, 40000.0, &["user-accounts", "dashboard", "notifications"]),
            (
                40000.0,
                80000.0,
                &["user-accounts", "dashboard", "notifications", "api-integrations", "analytics"],
            ),
        ],
    },
    Package {
        project_type: "other",
        features: &[
            ("contact-form", "Contact form", 150.0, false),
            ("blog", "Blog", 400.0, false),
            ("booking", "Online booking integration", 300.0, true),
            ("payments", "Online payments", 500.0, true),
            ("seo", "SEO setup", 350.0, false),
            ("analytics", "Analytics", 200.0, false),
        ],
        tiers: [
            (1000.0, 2000.0, &["contact-form"]),
            (2000.0, 4000.0, &["contact-form", "seo"]),
            (4000.0, 8000.0, &["contact-form", "seo", "blog", "analytics"]),
        ],
    },
];

fn package(project_type: &str) -> &'static Package {
    PACKAGES
        .iter()
        .find(|p| p.project_type == project_type)
        .or_else(|| PACKAGES.iter().find(|p| p.project_type == FALLBACK_PROJECT_TYPE))
        .unwrap_or(&PACKAGES[0])
}

fn tier_name(level: TierLevel) -> &'static str {
    match level {
        TierLevel::Good => "Essentials",
        TierLevel::Better => "Growth",
        TierLevel::Best => "Premium",
    }
}

/// The three tiers for a project type; unknown types use the `other` packages.
/// Features not included in a tier are offered as that tier's addons.
pub fn tiers_for(project_type: &str) -> Vec<Tier> {
    let package = package(project_type);
    TierLevel::all()
        .into_iter()
        .zip(package.tiers.iter())
        .map(|(level, (min, max, included))| Tier {
            level,
            name: tier_name(level).to_string(),
            min: *min,
            max: *max,
            base_taxable: false,
            included: included.iter().map(|s| s.to_string()).collect(),
            addons: package
                .features
                .iter()
                .filter(|(id, ..)| !included.contains(id))
                .map(|(id, name, price, taxable)| Addon {
                    id: id.to_string(),
                    name: name.to_string(),
                    price: *price,
                    taxable: *taxable,
                })
                .collect(),
        })
        .collect()
}

pub fn tier_for(project_type: &str, level: TierLevel) -> Tier {
    let index = TierLevel::all()
        .iter()
        .position(|l| *l == level)
        .unwrap_or_default();
    tiers_for(project_type).swap_remove(index)
}
