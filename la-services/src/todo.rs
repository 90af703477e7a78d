//! Todo list with priorities and optional due dates.

use chrono::NaiveDateTime;
use tracing::info;

use la_core::error::{LaError, LaResult};
use la_models::models::todo::priority;
use la_models::{Database, Todo};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};
use crate::time_parse;

/// Strip a leading `!!!` / `!!` marker and return the matching priority.
pub fn parse_priority(text: &str) -> (i64, &str) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("!!!") {
        (priority::URGENT, rest.trim_start())
    } else if let Some(rest) = trimmed.strip_prefix("!!") {
        (priority::HIGH, rest.trim_start())
    } else {
        (priority::NORMAL, trimmed)
    }
}

/// Service for the per-user todo list.
pub struct TodoService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl TodoService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Add a task written as `[!!|!!!] [time phrase] text`.
    ///
    /// A leading time phrase becomes the due date; otherwise the task has
    /// none and the whole text is kept.
    pub fn add(&self, user_id: i64, chat_id: Option<i64>, input: &str, now: NaiveDateTime) -> LaResult<Todo> {
        let (prio, rest) = parse_priority(input);
        let words: Vec<&str> = rest.split_whitespace().collect();

        let (due, text) = match time_parse::split_time_and_text(&words, now) {
            Some((due, text)) if !text.is_empty() => (Some(due), text),
            _ => (None, words.join(" ")),
        };
        if text.is_empty() {
            return Err(LaError::Validation("task text is empty".into()));
        }

        let mut todo = Todo::new(user_id, chat_id, text);
        todo.priority = prio;
        todo.due_date = due;

        let conn = self.database.conn()?;
        let id = todo.insert(&conn)?;

        info!("todo {id} added for user {user_id} (priority {prio})");
        self.event_bus.emit(AppEvent::TodoAdded {
            todo_id: id,
            user_id,
            priority: prio,
        });
        Ok(todo)
    }

    /// Open tasks, or finished ones when `completed` is set.
    pub fn list(&self, user_id: i64, completed: bool) -> LaResult<Vec<Todo>> {
        let conn = self.database.conn()?;
        Todo::list_for_user(&conn, user_id, completed)
    }

    pub fn complete(&self, user_id: i64, todo_id: i64, now: NaiveDateTime) -> LaResult<()> {
        let conn = self.database.conn()?;
        if !Todo::complete(&conn, todo_id, user_id, &now)? {
            return Err(LaError::NotFound(format!("open todo {todo_id}")));
        }
        self.event_bus.emit(AppEvent::TodoCompleted { todo_id, user_id });
        Ok(())
    }

    pub fn delete(&self, user_id: i64, todo_id: i64) -> LaResult<()> {
        let conn = self.database.conn()?;
        if !Todo::delete(&conn, todo_id, user_id)? {
            return Err(LaError::NotFound(format!("todo {todo_id}")));
        }
        self.event_bus.emit(AppEvent::TodoDeleted { todo_id, user_id });
        Ok(())
    }
}

impl Service for TodoService {
    fn name(&self) -> &str {
        "todos"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LaResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }

    fn shutdown(&mut self) -> LaResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
