//! # Totals
//!
//! Line totals, document totals and the statement parts/labour breakdown.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_total = unit_price × quantity        (rounded per line)          │
//! │  subtotal   = Σ line_total                                             │
//! │  vat        = subtotal × rate              (rounded once, on subtotal)  │
//! │  total      = subtotal + vat                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! VAT is never summed per line: on a long invoice per-line rounding drifts
//! by pennies from what an accountant recomputes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Quantity, VatRate};
use crate::types::{DocumentLineInput, JobItem, LineKind};

// =============================================================================
// Line Input
// =============================================================================

/// A priced line before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LineInput {
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl LineInput {
    pub fn new(description: impl Into<String>, quantity: Quantity, unit_price: Money) -> Self {
        LineInput {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.times_quantity(self.quantity)
    }
}

impl From<&DocumentLineInput> for LineInput {
    fn from(line: &DocumentLineInput) -> Self {
        LineInput::new(
            line.description.trim(),
            Quantity::from_hundredths(line.quantity_hundredths),
            Money::from_pence(line.unit_price_pence),
        )
    }
}

impl From<&JobItem> for LineInput {
    fn from(item: &JobItem) -> Self {
        LineInput::new(
            item.description.clone(),
            item.quantity(),
            Money::from_pence(item.unit_price_pence),
        )
    }
}

// =============================================================================
// Document Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub vat: Money,
    pub total: Money,
}

impl DocumentTotals {
    /// Totals for a subtotal at a VAT rate.
    pub fn from_subtotal(subtotal: Money, rate: VatRate) -> Self {
        let vat = subtotal.calculate_vat(rate);
        DocumentTotals {
            subtotal,
            vat,
            total: subtotal + vat,
        }
    }

    pub fn from_lines(lines: &[LineInput], rate: VatRate) -> Self {
        let subtotal: Money = lines.iter().map(LineInput::line_total).sum();
        Self::from_subtotal(subtotal, rate)
    }

    /// Totals for stored job items, using their persisted line totals.
    pub fn from_job_items(items: &[JobItem], rate: VatRate) -> Self {
        let subtotal: Money = items.iter().map(JobItem::line_total).sum();
        Self::from_subtotal(subtotal, rate)
    }
}

// =============================================================================
// Statement Breakdown
// =============================================================================

/// Parts, labour and sundries split out of a job's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatementBreakdown {
    pub parts: Money,
    pub labour: Money,
    pub other: Money,
    pub totals: DocumentTotals,
}

impl StatementBreakdown {
    pub fn from_job_items(items: &[JobItem], rate: VatRate) -> Self {
        let mut parts = Money::zero();
        let mut labour = Money::zero();
        let mut other = Money::zero();

        for item in items {
            match item.kind {
                LineKind::Part => parts += item.line_total(),
                LineKind::Labour => labour += item.line_total(),
                LineKind::Other => other += item.line_total(),
            }
        }

        StatementBreakdown {
            parts,
            labour,
            other,
            totals: DocumentTotals::from_subtotal(parts + labour + other, rate),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(kind: LineKind, qty: i64, price: i64) -> JobItem {
        let quantity = Quantity::from_hundredths(qty);
        let unit = Money::from_pence(price);
        JobItem {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: "job-1".to_string(),
            inventory_item_id: None,
            kind,
            description: "line".to_string(),
            quantity_hundredths: qty,
            unit_price_pence: price,
            line_total_pence: unit.times_quantity(quantity).pence(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_vat_on_subtotal_not_per_line() {
        // Three lines of 1.01 at 20%: per-line VAT would be 3 × 20p = 60p,
        // on the subtotal 303p × 0.2 = 60.6p → 61p
        let lines: Vec<LineInput> = (0..3)
            .map(|_| LineInput::new("Filter", Quantity::from_units(1), Money::from_pence(101)))
            .collect();

        let totals = DocumentTotals::from_lines(&lines, VatRate::from_bps(2000));
        assert_eq!(totals.subtotal.pence(), 303);
        assert_eq!(totals.vat.pence(), 61);
        assert_eq!(totals.total.pence(), 364);
    }

    #[test]
    fn test_empty_document() {
        let totals = DocumentTotals::from_lines(&[], VatRate::default());
        assert_eq!(totals, DocumentTotals::default());
    }

    #[test]
    fn test_zero_rated() {
        let lines = vec![LineInput::new("Parts", Quantity::from_units(2), Money::from_pence(999))];
        let totals = DocumentTotals::from_lines(&lines, VatRate::zero());
        assert_eq!(totals.subtotal, totals.total);
        assert!(totals.vat.is_zero());
    }

    #[test]
    fn test_statement_breakdown() {
        let items = vec![
            item(LineKind::Part, 200, 1250),
            item(LineKind::Labour, 150, 4500),
            item(LineKind::Other, 100, 1500),
            item(LineKind::Part, 100, 800),
        ];

        let breakdown = StatementBreakdown::from_job_items(&items, VatRate::from_bps(2000));
        assert_eq!(breakdown.parts.pence(), 3300);
        assert_eq!(breakdown.labour.pence(), 6750);
        assert_eq!(breakdown.other.pence(), 1500);
        assert_eq!(breakdown.totals.subtotal.pence(), 11550);
        assert_eq!(breakdown.totals.vat.pence(), 2310);
        assert_eq!(breakdown.totals.total.pence(), 13860);
    }

    #[test]
    fn test_line_from_document_input_trims() {
        let input = DocumentLineInput {
            description: "  Vacuum pump oil  ".to_string(),
            quantity_hundredths: 300,
            unit_price_pence: 650,
        };
        let line = LineInput::from(&input);
        assert_eq!(line.description, "Vacuum pump oil");
        assert_eq!(line.line_total().pence(), 1950);
    }
}
