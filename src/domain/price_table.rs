//! Credit packages: the fixed table mapping a paid amount to credits.

use serde::Serialize;
use utoipa::ToSchema;

/// A purchasable credit package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CreditPackage {
    /// Package price in cents.
    pub price_cents: i64,
    /// Credits granted for the price.
    pub credits: u64,
}

/// Hand-written price table, kept sorted by ascending price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    packages: Vec<CreditPackage>,
}

impl PriceTable {
    /// Builds a table from arbitrary packages, sorting them by price.
    #[must_use]
    pub fn new(mut packages: Vec<CreditPackage>) -> Self {
        packages.sort_by_key(|p| p.price_cents);
        Self { packages }
    }

    /// Returns the packages in ascending price order.
    #[must_use]
    pub fn packages(&self) -> &[CreditPackage] {
        &self.packages
    }

    /// Classifies a paid amount: the most expensive package whose price
    /// does not exceed `amount_cents`. `None` when the amount is below the
    /// cheapest package.
    #[must_use]
    pub fn classify(&self, amount_cents: i64) -> Option<CreditPackage> {
        self.packages
            .iter()
            .rev()
            .find(|p| p.price_cents <= amount_cents)
            .copied()
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(vec![
            CreditPackage {
                price_cents: 4_990,
                credits: 10,
            },
            CreditPackage {
                price_cents: 9_990,
                credits: 25,
            },
            CreditPackage {
                price_cents: 19_990,
                credits: 60,
            },
            CreditPackage {
                price_cents: 39_990,
                credits: 150,
            },
        ])
    }
}
