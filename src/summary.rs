//! Terminal output for finished reports and price tables

use crate::pricing::PriceBook;
use crate::report::KindSummary;
use crate::utils::format_cost;
use comfy_table::{Cell, Table};
use console::style;
use rust_decimal::Decimal;

/// Per-resource totals for one kind, in report order
pub fn kind_table(summary: &KindSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Resource", "Buckets", "Total cost"]);

    for resource in &summary.resources {
        let cost_cell = if resource.total_cost.is_zero() {
            Cell::new(format_cost(resource.total_cost)).fg(comfy_table::Color::DarkGrey)
        } else {
            Cell::new(format_cost(resource.total_cost)).fg(comfy_table::Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&resource.name),
            Cell::new(resource.buckets),
            cost_cell,
        ]);
    }

    table
}

pub fn print_text(summaries: &[KindSummary]) {
    for summary in summaries {
        let total = summary
            .resources
            .iter()
            .map(|r| r.total_cost)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        println!();
        println!(
            "{} {} resource(s), {} row(s)",
            style(summary.kind.to_uppercase()).bold().cyan(),
            summary.resources.len(),
            summary.rows
        );
        if !summary.resources.is_empty() {
            println!("{}", kind_table(summary));
        }
        println!(
            "  {} {}",
            style("Total:").dim(),
            style(format_cost(total)).yellow()
        );
        println!(
            "  {} {}",
            style("Written to:").dim(),
            summary.output.display()
        );
    }
}

pub fn print_json(summaries: &[KindSummary]) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(summaries)?);
    Ok(())
}

/// Price tables, optionally limited to one region
pub fn prices_table(book: &PriceBook, region: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Service", "Region", "Unit", "Price"]);

    let book = book.for_region(region);

    for (r, p) in &book.lambda {
        let prices = [
            ("1M invocations", p.per_million_invocations),
            ("GB-second (x86_64)", p.per_gb_second_x86),
            ("GB-second (arm64)", p.per_gb_second_arm),
        ];
        for (unit, price) in prices {
            table.add_row(vec![
                Cell::new("lambda"),
                Cell::new(r),
                Cell::new(unit),
                Cell::new(price),
            ]);
        }
    }
    for (r, p) in &book.dynamodb {
        let prices = [
            ("1M write units", p.on_demand_write_per_million),
            ("1M read units", p.on_demand_read_per_million),
            ("WCU-hour", p.provisioned_wcu_hour),
            ("RCU-hour", p.provisioned_rcu_hour),
        ];
        for (unit, price) in prices {
            table.add_row(vec![
                Cell::new("dynamodb"),
                Cell::new(r),
                Cell::new(unit),
                Cell::new(price),
            ]);
        }
    }

    table
}
