//! Finance commands - record transactions and show reports.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_models::{time, TransactionType};
use la_services::{EventBus, FinanceService, ReportPeriod};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum FinanceAction {
    /// Record an income or expense.
    Add {
        #[arg(short, long)]
        user: i64,
        amount: f64,
        category: String,
        /// income / expense (also доход / расход).
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Totals for a period (all, day, week, month).
    Report {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long, default_value = "month")]
        period: String,
        /// Also list this many recent entries.
        #[arg(long, default_value = "0")]
        recent: usize,
    },
}

pub async fn run(config: ConfigHandle, action: FinanceAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let svc = FinanceService::new(db, EventBus::default());

    match action {
        FinanceAction::Add { user, amount, category, kind, description } => {
            let kind: TransactionType = kind.parse()?;
            let entry = svc.add_transaction(user, amount, &category, description.as_deref(), kind)?;
            match format {
                OutputFormat::Json => super::print_json(&entry),
                OutputFormat::Text => {
                    let sign = if kind == TransactionType::Income { "+" } else { "-" };
                    println!(
                        "  {} {sign}{:.2} ₽ [{}]",
                        style("OK").green().bold(),
                        entry.amount,
                        entry.category
                    );
                }
            }
        }
        FinanceAction::Report { user, period, recent } => {
            let period: ReportPeriod = period.parse()?;
            let report = svc.report(user, period, time::now())?;
            let entries = if recent > 0 { svc.recent(user, recent)? } else { Vec::new() };

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "report": report,
                    "recent": entries,
                })),
                OutputFormat::Text => {
                    println!("{} ({period})", style("Financial Report").bold().underlined());
                    println!("  Income:   {:>12.2} ₽", report.income);
                    println!("  Expense:  {:>12.2} ₽", report.expense);
                    let balance = format!("{:>12.2} ₽", report.balance);
                    if report.balance < 0.0 {
                        println!("  Balance:  {}", style(balance).red().bold());
                    } else {
                        println!("  Balance:  {}", style(balance).green().bold());
                    }

                    if !report.categories.is_empty() {
                        println!();
                        let mut table = super::new_table(vec!["Category", "Total"]);
                        for (key, total) in &report.categories {
                            table.add_row(vec![key.clone(), format!("{total:.2}")]);
                        }
                        println!("{table}");
                    }

                    if !entries.is_empty() {
                        println!();
                        let mut table = super::new_table(vec!["When", "Type", "Amount", "Category", "Note"]);
                        for e in &entries {
                            table.add_row(vec![
                                super::display_ts(&e.created_at),
                                e.kind.to_string(),
                                format!("{:.2}", e.amount),
                                e.category.clone(),
                                super::truncate(e.description.as_deref().unwrap_or(""), 30),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
    }
    Ok(())
}
