//! Todo commands.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_models::time;
use la_services::{EventBus, TodoService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum TodosAction {
    /// Add a task. Prefix with `!!` or `!!!` for higher priority; a leading
    /// time phrase sets the due date.
    Add {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long, allow_hyphen_values = true)]
        chat: Option<i64>,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// List open (or completed) tasks.
    List {
        #[arg(short, long)]
        user: i64,
        #[arg(long)]
        completed: bool,
    },
    /// Mark a task done.
    Done {
        #[arg(short, long)]
        user: i64,
        id: i64,
    },
    /// Delete a task.
    Delete {
        #[arg(short, long)]
        user: i64,
        id: i64,
    },
}

pub async fn run(config: ConfigHandle, action: TodosAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let svc = TodoService::new(db, EventBus::default());

    match action {
        TodosAction::Add { user, chat, text } => {
            let todo = svc.add(user, chat, &text.join(" "), time::now())?;
            match format {
                OutputFormat::Json => super::print_json(&todo),
                OutputFormat::Text => {
                    let due = todo
                        .due_date
                        .map(|d| format!(" (до {})", super::display_ts(&d)))
                        .unwrap_or_default();
                    println!(
                        "  {} {} #{} {}{due}",
                        style("OK").green().bold(),
                        todo.priority_marker(),
                        todo.id.unwrap_or_default(),
                        todo.task_text
                    );
                }
            }
        }
        TodosAction::List { user, completed } => {
            let todos = svc.list(user, completed)?;
            match format {
                OutputFormat::Json => super::print_json(&todos),
                OutputFormat::Text => {
                    if todos.is_empty() {
                        println!("No tasks.");
                        return Ok(());
                    }
                    let mut table = super::new_table(vec!["", "ID", "Task", "Due", "Completed"]);
                    for t in &todos {
                        table.add_row(vec![
                            t.priority_marker().to_string(),
                            t.id.map(|v| v.to_string()).unwrap_or_default(),
                            super::truncate(&t.task_text, 50),
                            t.due_date.as_ref().map(super::display_ts).unwrap_or_default(),
                            t.completed_at.as_ref().map(super::display_ts).unwrap_or_default(),
                        ]);
                    }
                    println!("{table}");
                    println!("\n{} task(s).", todos.len());
                }
            }
        }
        TodosAction::Done { user, id } => {
            svc.complete(user, id, time::now())?;
            println!("  {} task #{id} completed", style("OK").green().bold());
        }
        TodosAction::Delete { user, id } => {
            svc.delete(user, id)?;
            println!("  {} task #{id} deleted", style("OK").green().bold());
        }
    }
    Ok(())
}
