//! # Receipt Layout
//!
//! Plain-text layout for 58mm/80mm thermal printers and shelf labels.
//! The printer driver is out of scope; callers get a `String` to send to
//! whatever device or preview they have.
//!
//! ```text
//!               VASTRA STORE
//!              Address Line 1
//! ----------------------------------------
//! Invoice: INV-20260114-3FA2B7C1
//! Date: 14-01-2026 18:32:05
//! Cashier: Admin
//! Customer: Asha
//! ----------------------------------------
//! Item               Qty    Price    Total
//! ----------------------------------------
//! Cotton Kurta - M     2  1180.00  2360.00
//! ----------------------------------------
//! Subtotal:                        2360.00
//! ...
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Customer, Product, Sale, SaleItem, SaleStatus};

/// Width of the quantity, price and total columns plus separators.
const ITEM_NUMERIC_COLUMNS: usize = 22;

/// Width of the amount column in the totals block.
const TOTALS_AMOUNT_WIDTH: usize = 11;

const MIN_WIDTH: usize = 32;

/// Store details and paper width used to render receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLayout {
    /// Characters per line. 40 for 80mm paper at the default font.
    pub width: usize,
    pub store_name: String,
    /// Address, phone and GSTIN lines under the store name.
    pub store_lines: Vec<String>,
    pub cashier: String,
    pub footer_lines: Vec<String>,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        ReceiptLayout {
            width: 40,
            store_name: "VASTRA STORE".to_string(),
            store_lines: Vec::new(),
            cashier: "Admin".to_string(),
            footer_lines: vec![
                "Thank you for shopping with us!".to_string(),
                "Visit us again!".to_string(),
                "Goods once sold cannot be returned".to_string(),
            ],
        }
    }
}

impl ReceiptLayout {
    fn line_width(&self) -> usize {
        self.width.max(MIN_WIDTH)
    }

    fn separator(&self) -> String {
        "-".repeat(self.line_width())
    }

    fn center(&self, text: &str) -> String {
        let width = self.line_width();
        let text = truncate(text, width);
        let pad = (width - text.chars().count()) / 2;
        format!("{}{}", " ".repeat(pad), text)
    }

    fn total_line(&self, label: &str, amount: Money) -> String {
        let label_width = self.line_width() - TOTALS_AMOUNT_WIDTH;
        format!(
            "{:<label_width$}{:>amount_width$}",
            label,
            amount.format_amount(),
            label_width = label_width,
            amount_width = TOTALS_AMOUNT_WIDTH
        )
    }

    /// Renders a sale receipt.
    ///
    /// `customer` is the customer as they stand after the sale, so the
    /// printed balance includes the points just earned.
    pub fn render_receipt(&self, sale: &Sale, items: &[SaleItem], customer: Option<&Customer>) -> String {
        let sep = self.separator();
        let name_width = self.line_width() - ITEM_NUMERIC_COLUMNS;
        let mut lines: Vec<String> = Vec::new();

        lines.push(self.center(&self.store_name.to_uppercase()));
        for line in &self.store_lines {
            lines.push(self.center(line));
        }
        lines.push(sep.clone());

        if sale.status == SaleStatus::Voided {
            lines.push(self.center("*** VOIDED ***"));
        }

        lines.push(format!("Invoice: {}", sale.invoice_number));
        lines.push(format!(
            "Date: {}",
            sale.ts.with_timezone(&Local).format("%d-%m-%Y %H:%M:%S")
        ));
        lines.push(format!("Cashier: {}", self.cashier));

        match customer {
            Some(c) => {
                lines.push(format!("Customer: {}", c.name));
                if !c.phone.is_empty() {
                    lines.push(format!("Phone: {}", c.phone));
                    lines.push(format!("Points: {}", c.points));
                }
            }
            None => lines.push("Customer: Walk-in".to_string()),
        }

        lines.push(sep.clone());
        lines.push(format!(
            "{:<name_width$} {:>3} {:>8} {:>8}",
            "Item",
            "Qty",
            "Price",
            "Total",
            name_width = name_width
        ));
        lines.push(sep.clone());

        for item in items {
            lines.push(format!(
                "{:<name_width$} {:>3} {:>8} {:>8}",
                truncate(&item.display_name(), name_width),
                item.qty,
                item.unit_price().format_amount(),
                item.line_total().format_amount(),
                name_width = name_width
            ));
        }

        lines.push(sep.clone());
        lines.push(self.total_line("Subtotal:", Money::from_cents(sale.subtotal_cents)));
        lines.push(self.total_line("GST (incl.):", Money::from_cents(sale.tax_cents)));
        if sale.discount_cents != 0 {
            lines.push(self.total_line("Discount:", Money::from_cents(sale.discount_cents)));
        }
        lines.push(sep.clone());
        lines.push(self.total_line("TOTAL:", sale.total()));
        lines.push(sep.clone());
        lines.push(format!("Payment Mode: {}", sale.payment_mode));

        if customer.is_some() {
            if sale.points_redeemed > 0 {
                lines.push(format!("Points Redeemed: {}", sale.points_redeemed));
            }
            lines.push(format!("Points Earned: {}", sale.points_earned));
        }

        lines.push(sep);
        for line in &self.footer_lines {
            lines.push(self.center(line));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Renders the text of a shelf label: name, code, price.
    ///
    /// The code is the barcode, falling back to the SKU.
    pub fn render_barcode_label(&self, product: &Product) -> String {
        let code = if product.barcode.is_empty() {
            &product.sku
        } else {
            &product.barcode
        };

        let lines = [
            self.center(&product.display_name()),
            self.center(code),
            self.center(&format!(
                "{} {}",
                crate::money::CURRENCY_SYMBOL,
                product.sell_price().format_amount()
            )),
        ];

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Cuts `text` to `width` characters, ending in `...` when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{now_timestamp, PaymentMode};

    fn sale(discount_cents: i64) -> Sale {
        let now = now_timestamp();
        Sale {
            id: "sale-1".to_string(),
            invoice_number: "INV-20260114-3FA2B7C1".to_string(),
            customer_id: None,
            ts: now,
            subtotal_cents: 236_000,
            tax_cents: 36_000,
            discount_cents,
            total_cents: 236_000 - discount_cents,
            points_earned: (236_000 - discount_cents) / 10_000,
            points_redeemed: 0,
            payment_mode: PaymentMode::Upi,
            status: SaleStatus::Completed,
            created_at: now,
        }
    }

    fn items() -> Vec<SaleItem> {
        vec![SaleItem {
            id: "item-1".to_string(),
            sale_id: "sale-1".to_string(),
            product_id: "p-1".to_string(),
            product_name: "Hand Block Printed Cotton Kurta".to_string(),
            product_variant: "M".to_string(),
            sku: "KRT-M".to_string(),
            qty: 2,
            unit_price_cents: 118_000,
            tax_percent: 18,
            tax_cents: 36_000,
            line_total_cents: 236_000,
        }]
    }

    #[test]
    fn test_walk_in_receipt() {
        let layout = ReceiptLayout::default();
        let text = layout.render_receipt(&sale(0), &items(), None);

        assert!(text.contains("VASTRA STORE"));
        assert!(text.contains("Invoice: INV-20260114-3FA2B7C1"));
        assert!(text.contains("Cashier: Admin"));
        assert!(text.contains("Customer: Walk-in"));
        assert!(text.contains("Payment Mode: UPI"));
        assert!(!text.contains("Discount:"));
        assert!(!text.contains("Points Earned"));
        assert!(text.contains("Goods once sold cannot be returned"));
    }

    #[test]
    fn test_lines_fit_paper_width() {
        let layout = ReceiptLayout::default();
        let text = layout.render_receipt(&sale(10_000), &items(), None);

        for line in text.lines() {
            assert!(line.chars().count() <= 40, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_item_names_are_truncated() {
        let layout = ReceiptLayout::default();
        let text = layout.render_receipt(&sale(0), &items(), None);

        assert!(text.contains("Hand Block Prin..."));
        assert!(text.contains("1180.00"));
        assert!(text.contains("2360.00"));
    }

    #[test]
    fn test_customer_receipt_shows_points_and_discount() {
        let layout = ReceiptLayout::default();
        let mut customer = Customer::new("Asha", "9876543210");
        customer.points = 42;

        let text = layout.render_receipt(&sale(16_000), &items(), Some(&customer));

        assert!(text.contains("Customer: Asha"));
        assert!(text.contains("Phone: 9876543210"));
        assert!(text.contains("Points: 42"));
        assert!(text.contains("Discount:"));
        assert!(text.contains("160.00"));
        assert!(text.contains("Points Earned: 22"));
    }

    #[test]
    fn test_voided_receipt_is_marked() {
        let layout = ReceiptLayout::default();
        let mut s = sale(0);
        s.status = SaleStatus::Voided;
        let text = layout.render_receipt(&s, &items(), None);
        assert!(text.contains("*** VOIDED ***"));
    }

    #[test]
    fn test_barcode_label() {
        let layout = ReceiptLayout::default();
        let mut p = Product::new("Denim Jacket", 249_900);
        p.variant = "L".to_string();
        p.sku = "JKT-DNM-L".to_string();

        let label = layout.render_barcode_label(&p);
        assert!(label.contains("Denim Jacket - L"));
        assert!(label.contains("JKT-DNM-L"));
        assert!(label.contains("₹ 2499.00"));

        p.barcode = "8901234567890".to_string();
        assert!(layout.render_barcode_label(&p).contains("8901234567890"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }
}
