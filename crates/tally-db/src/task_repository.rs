use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use tally_core::error::AppError;
use tally_core::task::{NewSubtask, NewTask, Subtask, SubtaskUpdate, Task, TaskFilter, TaskUpdate};

use crate::database::db_err;

/// Repository for tasks and their subtasks.
#[derive(Clone)]
pub struct TaskRepository {
    pool: Pool<Postgres>,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, AppError> {
        if let Some(user_id) = task.assigned_to {
            self.ensure_user_exists(user_id).await?;
        }

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (title, text, points, due_date, tags, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&task.title)
        .bind(&task.text)
        .bind(task.points)
        .bind(task.due_date)
        .bind(&task.tags)
        .bind(task.assigned_to)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(r#"SELECT * FROM tasks WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// List tasks, newest first. All filter fields are optional and
    /// combine with AND.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT * FROM tasks
            WHERE ($1::uuid IS NULL OR assigned_to = $1)
              AND ($2::boolean IS NULL OR completed = $2)
              AND ($3::text IS NULL OR $3 = ANY(tags))
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(filter.assigned_to)
        .bind(filter.completed)
        .bind(&filter.tag)
        .bind(filter.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update. Returns `None` when the task does not exist.
    ///
    /// `points` and `assigned_to` are frozen while a task is completed:
    /// [`reopen`](Self::reopen) deducts the task's points from its assignee,
    /// so editing either in between would claw back an amount that was never
    /// awarded. Reopen first, then edit.
    pub async fn update(&self, id: Uuid, update: &TaskUpdate) -> Result<Option<Task>, AppError> {
        if let Some(Some(user_id)) = update.assigned_to {
            self.ensure_user_exists(user_id).await?;
        }

        if update.points.is_some() || update.assigned_to.is_some() {
            let completed: Option<(bool,)> =
                sqlx::query_as(r#"SELECT completed FROM tasks WHERE id = $1"#)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
            match completed {
                Some((true,)) => {
                    return Err(AppError::Conflict(format!(
                        "Task {id} is completed; reopen it before changing points or assignee"
                    )));
                }
                Some((false,)) => {}
                None => return Ok(None),
            }
        }

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                text = COALESCE($3, text),
                points = COALESCE($4, points),
                tags = COALESCE($5, tags),
                due_date = CASE WHEN $6 THEN $7 ELSE due_date END,
                assigned_to = CASE WHEN $8 THEN $9 ELSE assigned_to END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.text)
        .bind(update.points)
        .bind(&update.tags)
        .bind(update.due_date.is_some())
        .bind(update.due_date.flatten())
        .bind(update.assigned_to.is_some())
        .bind(update.assigned_to.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Delete a task. Subtasks cascade; list membership is scrubbed in the
    /// same transaction so `task_ids` never dangles.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            UPDATE lists
            SET task_ids = array_remove(task_ids, $1), updated_at = NOW()
            WHERE $1 = ANY(task_ids)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let result = sqlx::query(r#"DELETE FROM tasks WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a task completed and award its points to the assigned user.
    ///
    /// The conditional UPDATE guarantees the award happens at most once,
    /// even under concurrent requests. Completing an already-completed
    /// task is a conflict.
    pub async fn complete(&self, id: Uuid) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET completed = TRUE, updated_at = NOW()
            WHERE id = $1 AND completed = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let task: Task = match row {
            Some(row) => row.into(),
            None => {
                // Distinguish "missing" from "already completed".
                let exists: Option<(Uuid,)> =
                    sqlx::query_as(r#"SELECT id FROM tasks WHERE id = $1"#)
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(db_err)?;

                return match exists {
                    Some(_) => Err(AppError::Conflict(format!("Task {id} is already completed"))),
                    None => Err(AppError::not_found("task", id)),
                };
            }
        };

        if let Some(user_id) = task.assigned_to
            && task.points > 0
        {
            sqlx::query(
                r#"
                UPDATE users
                SET points = points + $2, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(task.points)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            tracing::debug!(task_id = %id, user_id = %user_id, points = task.points, "Awarded points");
        }

        tx.commit().await.map_err(db_err)?;

        Ok(task)
    }

    /// Reopen a completed task, clawing back the awarded points. The
    /// balance is clamped at zero in case the points were already spent.
    pub async fn reopen(&self, id: Uuid) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET completed = FALSE, updated_at = NOW()
            WHERE id = $1 AND completed = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let task: Task = match row {
            Some(row) => row.into(),
            None => {
                let exists: Option<(Uuid,)> =
                    sqlx::query_as(r#"SELECT id FROM tasks WHERE id = $1"#)
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(db_err)?;

                return match exists {
                    Some(_) => Err(AppError::Conflict(format!("Task {id} is not completed"))),
                    None => Err(AppError::not_found("task", id)),
                };
            }
        };

        if let Some(user_id) = task.assigned_to
            && task.points > 0
        {
            sqlx::query(
                r#"
                UPDATE users
                SET points = GREATEST(points - $2, 0), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(task.points)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(task)
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    pub async fn create_subtask(&self, subtask: &NewSubtask) -> Result<Subtask, AppError> {
        let parent: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM tasks WHERE id = $1"#)
            .bind(subtask.task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        if parent.is_none() {
            return Err(AppError::not_found("task", subtask.task_id));
        }

        let row = sqlx::query_as::<_, SubtaskRow>(
            r#"
            INSERT INTO subtasks (task_id, text)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(subtask.task_id)
        .bind(&subtask.text)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    pub async fn get_subtask(&self, id: Uuid) -> Result<Option<Subtask>, AppError> {
        let row = sqlx::query_as::<_, SubtaskRow>(r#"SELECT * FROM subtasks WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Subtasks of a task, oldest first (creation order).
    pub async fn list_subtasks(&self, task_id: Uuid) -> Result<Vec<Subtask>, AppError> {
        let rows = sqlx::query_as::<_, SubtaskRow>(
            r#"
            SELECT * FROM subtasks
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_subtask(
        &self,
        id: Uuid,
        update: &SubtaskUpdate,
    ) -> Result<Option<Subtask>, AppError> {
        let row = sqlx::query_as::<_, SubtaskRow>(
            r#"
            UPDATE subtasks
            SET text = COALESCE($2, text),
                completed = COALESCE($3, completed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.text)
        .bind(update.completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    pub async fn delete_subtask(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM subtasks WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> Result<(), AppError> {
        let exists: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match exists {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("user", user_id)),
        }
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    text: String,
    points: i32,
    completed: bool,
    due_date: Option<DateTime<Utc>>,
    tags: Vec<String>,
    assigned_to: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            text: row.text,
            points: row.points,
            completed: row.completed,
            due_date: row.due_date,
            tags: row.tags,
            assigned_to: row.assigned_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubtaskRow {
    id: Uuid,
    task_id: Uuid,
    text: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubtaskRow> for Subtask {
    fn from(row: SubtaskRow) -> Self {
        Subtask {
            id: row.id,
            task_id: row.task_id,
            text: row.text,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
