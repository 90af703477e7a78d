//! Payment ledger commands.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_services::{EventBus, PaymentLedgerService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum PaymentsAction {
    /// Record a payment row.
    Record {
        #[arg(short, long)]
        user: i64,
        /// Amount in rubles (defaults to the subscription price).
        #[arg(short, long)]
        amount: Option<f64>,
        /// Provider payment id.
        payment_id: String,
        #[arg(short, long, default_value = "pending")]
        status: String,
    },
    /// List a user's payments.
    List {
        #[arg(short, long)]
        user: i64,
    },
    /// Change the status of a payment (pending, succeeded, canceled).
    SetStatus { payment_id: String, status: String },
}

pub async fn run(config: ConfigHandle, action: PaymentsAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let price = config.read().await.bot.subscription_price;
    let svc = PaymentLedgerService::new(db, EventBus::default());

    match action {
        PaymentsAction::Record { user, amount, payment_id, status } => {
            let payment = svc.record(user, amount.unwrap_or(price), &payment_id, &status)?;
            match format {
                OutputFormat::Json => super::print_json(&payment),
                OutputFormat::Text => println!(
                    "  {} payment {} recorded: {:.2} ₽, {}",
                    style("OK").green().bold(),
                    payment.payment_id,
                    payment.amount,
                    payment.status
                ),
            }
        }
        PaymentsAction::List { user } => {
            let payments = svc.list(user)?;
            match format {
                OutputFormat::Json => super::print_json(&payments),
                OutputFormat::Text => {
                    if payments.is_empty() {
                        println!("No payments.");
                        return Ok(());
                    }
                    let mut table = super::new_table(vec!["Payment", "Amount", "Status", "Created"]);
                    for p in &payments {
                        let status = if p.is_succeeded() {
                            style(p.status.clone()).green().to_string()
                        } else {
                            p.status.clone()
                        };
                        table.add_row(vec![
                            p.payment_id.clone(),
                            format!("{:.2}", p.amount),
                            status,
                            p.created_at.as_ref().map(super::display_ts).unwrap_or_default(),
                        ]);
                    }
                    println!("{table}");
                }
            }
        }
        PaymentsAction::SetStatus { payment_id, status } => {
            let touched = svc.set_status(&payment_id, &status)?;
            println!(
                "  {} payment {payment_id} is now {status} ({touched} row(s))",
                style("OK").green().bold()
            );
        }
    }
    Ok(())
}
