use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use tally_core::error::AppError;
use tally_core::task::{ListUpdate, NewList, TaskList};

use crate::database::db_err;

/// Repository for named task groupings.
#[derive(Clone)]
pub struct ListRepository {
    pool: Pool<Postgres>,
}

impl ListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, list: &NewList) -> Result<TaskList, AppError> {
        self.ensure_tasks_exist(&list.task_ids).await?;

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            INSERT INTO lists (name, task_ids)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&list.name)
        .bind(&list.task_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<TaskList>, AppError> {
        let row = sqlx::query_as::<_, ListRow>(r#"SELECT * FROM lists WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<TaskList>, AppError> {
        let rows = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT * FROM lists
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update. Returns `None` when the list does not exist.
    /// A `task_ids` replacement must reference only existing tasks, so the
    /// delete-time scrub stays the sole source of membership removal.
    pub async fn update(&self, id: Uuid, update: &ListUpdate) -> Result<Option<TaskList>, AppError> {
        if let Some(task_ids) = &update.task_ids {
            self.ensure_tasks_exist(task_ids).await?;
        }

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            UPDATE lists
            SET name = COALESCE($2, name),
                task_ids = COALESCE($3, task_ids),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.task_ids)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM lists WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    /// Append a task to the list. Idempotent: adding a task that is already
    /// a member leaves the list unchanged. Returns `None` for an unknown
    /// list; an unknown task is a NotFound error.
    pub async fn add_task(&self, id: Uuid, task_id: Uuid) -> Result<Option<TaskList>, AppError> {
        let exists: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM tasks WHERE id = $1"#)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        if exists.is_none() {
            return Err(AppError::not_found("task", task_id));
        }

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            UPDATE lists
            SET task_ids = CASE
                    WHEN $2 = ANY(task_ids) THEN task_ids
                    ELSE array_append(task_ids, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn ensure_tasks_exist(&self, task_ids: &[Uuid]) -> Result<(), AppError> {
        if task_ids.is_empty() {
            return Ok(());
        }

        let missing: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::uuid[]) AS wanted(id)
            LEFT JOIN tasks ON tasks.id = wanted.id
            WHERE tasks.id IS NULL
            LIMIT 1
            "#,
        )
        .bind(task_ids)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match missing {
            Some((id,)) => Err(AppError::not_found("task", id)),
            None => Ok(()),
        }
    }

    /// Remove a task from the list. Removing a non-member is a no-op.
    pub async fn remove_task(&self, id: Uuid, task_id: Uuid) -> Result<Option<TaskList>, AppError> {
        let row = sqlx::query_as::<_, ListRow>(
            r#"
            UPDATE lists
            SET task_ids = array_remove(task_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    name: String,
    task_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for TaskList {
    fn from(row: ListRow) -> Self {
        TaskList {
            id: row.id,
            name: row.name,
            task_ids: row.task_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
