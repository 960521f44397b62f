use colored::Colorize;
use comfy_table::{Cell, Table};

use apportion_core::{Alert, Money};
use apportion_engine::Summary;

use crate::fmt::currency;

fn signed(amount: Money) -> String {
    if amount.is_negative() {
        currency(amount).red().to_string()
    } else {
        currency(amount).green().to_string()
    }
}

/// Render summary statistics as fixed-width tables.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();

    let mut ventures = Table::new();
    ventures.set_header(vec!["Venture", "Total"]);
    for (venture, total) in &summary.by_venture {
        ventures.add_row(vec![Cell::new(venture), Cell::new(signed(*total))]);
    }
    out.push_str(&format!("By Venture\n{ventures}"));

    let mut categories = Table::new();
    categories.set_header(vec!["Category", "Total"]);
    for (category, total) in &summary.by_category {
        categories.add_row(vec![Cell::new(category), Cell::new(signed(*total))]);
    }
    out.push_str(&format!("\n\nBy Category\n{categories}"));

    let mut crossed = Table::new();
    crossed.set_header(vec!["Venture", "Category", "Total"]);
    for (venture, by_category) in &summary.by_venture_category {
        for (category, total) in by_category {
            crossed.add_row(vec![
                Cell::new(venture),
                Cell::new(category),
                Cell::new(signed(*total)),
            ]);
        }
    }
    out.push_str(&format!("\n\nBy Venture and Category\n{crossed}"));

    if !summary.top_uncategorized.is_empty() {
        let mut top = Table::new();
        top.set_header(vec!["Merchant", "Count", "Total"]);
        for tally in &summary.top_uncategorized {
            top.add_row(vec![
                Cell::new(&tally.description),
                Cell::new(tally.count),
                Cell::new(signed(tally.total)),
            ]);
        }
        out.push_str(&format!("\n\nTop Uncategorized Merchants\n{top}"));
    }

    out.push_str(&format!(
        "\n\n{} transactions, {} uncategorized",
        summary.total_transactions, summary.uncategorized_count
    ));
    out
}

/// Render alerts as a fixed-width table.
pub fn render_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No alerts.".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec!["Type", "Transaction", "Rule", "Message"]);
    for alert in alerts {
        let Alert::MissingReceipt {
            txn_id,
            message,
            rule_id,
        } = alert;
        table.add_row(vec![
            Cell::new("missing_receipt"),
            Cell::new(txn_id),
            Cell::new(rule_id),
            Cell::new(message),
        ]);
    }
    format!("Alerts ({})\n{table}", alerts.len())
}
