//! Batch run over categories
//!
//! One run resolves each distinct category fully before the next. A category
//! that ends up with nothing to deliver is recorded and skipped; it never
//! stops the rest of the run.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::bank::{BankDispenser, Dispensed, GeneratedItem};

/// Delivery collaborator: formats and transmits a category's pack
#[async_trait]
pub trait Delivery {
    async fn deliver(&self, category: &str, items: &[GeneratedItem]) -> Result<()>;
}

/// Per-category results of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Categories delivered, with the number of questions in each pack
    pub delivered: Vec<(String, usize)>,
    /// Categories with no content this run, with the reason
    pub unavailable: Vec<(String, String)>,
    /// Categories that hit a storage or delivery error
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.unavailable.is_empty() && self.failed.is_empty()
    }
}

/// Distinct categories in first-seen order
fn distinct<I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    categories
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

/// Dispense and deliver up to `pack_size` questions for every category
pub async fn run_batch<I, D>(
    dispenser: &BankDispenser<'_>,
    categories: I,
    pack_size: usize,
    delivery: &D,
) -> RunReport
where
    I: IntoIterator<Item = String>,
    D: Delivery + ?Sized,
{
    let mut report = RunReport::default();

    for category in distinct(categories) {
        let mut pack = Vec::with_capacity(pack_size);
        let mut shortfall = None;

        for _ in 0..pack_size {
            match dispenser.dispense(&category).await {
                Ok(Dispensed::Item(entry)) => pack.push(entry.item),
                Ok(Dispensed::Unavailable(reason)) => {
                    shortfall = Some(reason.to_string());
                    break;
                }
                Err(e) => {
                    error!(category = %category, "dispense failed: {:#}", e);
                    shortfall = Some(format!("{:#}", e));
                    break;
                }
            }
        }

        if pack.is_empty() {
            let reason = shortfall.unwrap_or_else(|| "no questions".to_string());
            warn!(category = %category, "skipping category: {}", reason);
            report.unavailable.push((category, reason));
            continue;
        }

        if let Some(reason) = shortfall {
            warn!(
                category = %category,
                got = pack.len(),
                wanted = pack_size,
                "partial pack: {}",
                reason
            );
        }

        match delivery.deliver(&category, &pack).await {
            Ok(()) => {
                info!(category = %category, count = pack.len(), "pack delivered");
                report.delivered.push((category, pack.len()));
            }
            Err(e) => {
                error!(category = %category, "delivery failed: {:#}", e);
                report.failed.push((category, format!("{:#}", e)));
            }
        }
    }

    report
}
