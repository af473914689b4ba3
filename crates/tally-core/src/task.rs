use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{validate_non_empty, validate_points};

/// A user-created unit of work carrying a point value.
///
/// Completing a task awards its `points` to the assigned user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// Free-form body text.
    pub text: String,
    pub points: i32,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// An open task past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Request to create a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub text: String,
    pub points: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: String::new(),
            points: 0,
            due_date: None,
            tags: Vec::new(),
            assigned_to: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn assigned_to(mut self, user_id: Uuid) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty("title", &self.title)?;
        validate_points(self.points)?;
        Ok(())
    }
}

/// Partial update for a task. `None` fields are left untouched.
///
/// `due_date` and `assigned_to` use a double `Option` so a caller can
/// distinguish "leave as is" from "clear the field".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub text: Option<String>,
    pub points: Option<i32>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<Option<Uuid>>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_non_empty("title", title)?;
        }
        if let Some(points) = self.points {
            validate_points(points)?;
        }
        Ok(())
    }
}

/// Filter for task listings.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub assigned_to: Option<Uuid>,
    pub completed: Option<bool>,
    pub tag: Option<String>,
    pub limit: usize,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            assigned_to: None,
            completed: None,
            tag: None,
            limit: 50,
        }
    }
}

/// A child item of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for inserting a new subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubtask {
    pub task_id: Uuid,
    pub text: String,
}

impl NewSubtask {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty("text", &self.text)
    }
}

/// Partial update for a subtask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtaskUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// A named, ordered grouping of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub id: Uuid,
    pub name: String,
    pub task_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for inserting a new list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewList {
    pub name: String,
    pub task_ids: Vec<Uuid>,
}

impl NewList {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty("name", &self.name)
    }
}

/// Partial update for a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub task_ids: Option<Vec<Uuid>>,
}
