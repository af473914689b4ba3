use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use tally_core::error::AppError;
use tally_core::models::{NewReward, Prize, Reward, RewardUpdate, User};

use crate::database::db_err;

/// Filter for prize listings.
#[derive(Debug, Clone)]
pub struct PrizeFilter {
    pub owner_id: Option<Uuid>,
    pub shared_with: Option<Uuid>,
    pub include_completed: bool,
    pub limit: usize,
}

impl Default for PrizeFilter {
    fn default() -> Self {
        Self {
            owner_id: None,
            shared_with: None,
            include_completed: false,
            limit: 50,
        }
    }
}

/// Repository for the reward catalog and redeemed prizes.
#[derive(Clone)]
pub struct PrizeRepository {
    pool: Pool<Postgres>,
}

impl PrizeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Rewards (catalog)
    // -----------------------------------------------------------------------

    pub async fn create_reward(&self, reward: &NewReward) -> Result<Reward, AppError> {
        if let Some(owner_id) = reward.owner_id {
            self.ensure_user_exists(owner_id).await?;
        }

        let row = sqlx::query_as::<_, RewardRow>(
            r#"
            INSERT INTO rewards (title, description, points, image_url, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&reward.title)
        .bind(&reward.description)
        .bind(reward.points)
        .bind(&reward.image_url)
        .bind(reward.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    pub async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>, AppError> {
        let row = sqlx::query_as::<_, RewardRow>(r#"SELECT * FROM rewards WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    pub async fn list_rewards(&self, limit: usize) -> Result<Vec<Reward>, AppError> {
        let rows = sqlx::query_as::<_, RewardRow>(
            r#"
            SELECT * FROM rewards
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_reward(
        &self,
        id: Uuid,
        update: &RewardUpdate,
    ) -> Result<Option<Reward>, AppError> {
        let row = sqlx::query_as::<_, RewardRow>(
            r#"
            UPDATE rewards
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                points = COALESCE($4, points),
                image_url = CASE WHEN $5 THEN $6 ELSE image_url END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.points)
        .bind(update.image_url.is_some())
        .bind(update.image_url.clone().flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    pub async fn delete_reward(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM rewards WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    /// Redeem a reward for a user: deduct the cost from their balance and
    /// place a snapshot of the reward in their inventory.
    ///
    /// The user row is locked for the duration of the transaction so two
    /// concurrent redemptions cannot both pass the balance check.
    pub async fn redeem(&self, reward_id: Uuid, user_id: Uuid) -> Result<Prize, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let reward: Reward = sqlx::query_as::<_, RewardRow>(
            r#"SELECT * FROM rewards WHERE id = $1"#,
        )
        .bind(reward_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::not_found("reward", reward_id))?
        .into();

        let user: User = sqlx::query_as::<_, UserBalanceRow>(
            r#"SELECT * FROM users WHERE id = $1 FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::not_found("user", user_id))?
        .into();

        user.can_afford(reward.points)?;

        sqlx::query(
            r#"
            UPDATE users
            SET points = points - $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(reward.points)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let prize: Prize = sqlx::query_as::<_, PrizeRow>(
            r#"
            INSERT INTO prizes (reward_id, title, description, points, image_url, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(reward.id)
        .bind(&reward.title)
        .bind(&reward.description)
        .bind(reward.points)
        .bind(&reward.image_url)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?
        .into();

        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            reward_id = %reward_id,
            user_id = %user_id,
            points = reward.points,
            prize_id = %prize.id,
            "Reward redeemed"
        );

        Ok(prize)
    }

    // -----------------------------------------------------------------------
    // Prizes (inventory)
    // -----------------------------------------------------------------------

    /// List prizes, newest first. Filters combine with AND; by default
    /// consumed prizes are hidden.
    pub async fn list_prizes(&self, filter: &PrizeFilter) -> Result<Vec<Prize>, AppError> {
        let rows = sqlx::query_as::<_, PrizeRow>(
            r#"
            SELECT * FROM prizes
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR $2 = ANY(shared_with))
              AND ($3 OR completed = FALSE)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(filter.owner_id)
        .bind(filter.shared_with)
        .bind(filter.include_completed)
        .bind(filter.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Everything a user can see: prizes they own plus prizes shared with
    /// them, including consumed ones.
    pub async fn inventory(&self, user_id: Uuid) -> Result<Vec<Prize>, AppError> {
        let rows = sqlx::query_as::<_, PrizeRow>(
            r#"
            SELECT * FROM prizes
            WHERE owner_id = $1 OR $1 = ANY(shared_with)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_prize(&self, id: Uuid) -> Result<Option<Prize>, AppError> {
        let row = sqlx::query_as::<_, PrizeRow>(r#"SELECT * FROM prizes WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Share a prize with another user. Idempotent.
    pub async fn share(&self, id: Uuid, user_id: Uuid) -> Result<Option<Prize>, AppError> {
        self.ensure_user_exists(user_id).await?;

        let row = sqlx::query_as::<_, PrizeRow>(
            r#"
            UPDATE prizes
            SET shared_with = CASE
                    WHEN $2 = ANY(shared_with) THEN shared_with
                    ELSE array_append(shared_with, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Revoke a share. Revoking from a user who was never shared with is a
    /// no-op.
    pub async fn unshare(&self, id: Uuid, user_id: Uuid) -> Result<Option<Prize>, AppError> {
        let row = sqlx::query_as::<_, PrizeRow>(
            r#"
            UPDATE prizes
            SET shared_with = array_remove(shared_with, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Mark a prize consumed. Consuming twice is a conflict.
    pub async fn complete_prize(&self, id: Uuid) -> Result<Prize, AppError> {
        let row = sqlx::query_as::<_, PrizeRow>(
            r#"
            UPDATE prizes
            SET completed = TRUE, updated_at = NOW()
            WHERE id = $1 AND completed = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(row.into()),
            None => match self.get_prize(id).await? {
                Some(_) => Err(AppError::Conflict(format!("Prize {id} is already completed"))),
                None => Err(AppError::not_found("prize", id)),
            },
        }
    }

    pub async fn delete_prize(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM prizes WHERE id = $1"#)
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
struct RewardRow {
    id: Uuid,
    title: String,
    description: String,
    points: i32,
    image_url: Option<String>,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RewardRow> for Reward {
    fn from(row: RewardRow) -> Self {
        Reward {
            id: row.id,
            title: row.title,
            description: row.description,
            points: row.points,
            image_url: row.image_url,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserBalanceRow {
    id: Uuid,
    name: String,
    email: String,
    points: i32,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserBalanceRow> for User {
    fn from(row: UserBalanceRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            points: row.points,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PrizeRow {
    id: Uuid,
    reward_id: Option<Uuid>,
    title: String,
    description: String,
    points: i32,
    image_url: Option<String>,
    owner_id: Uuid,
    shared_with: Vec<Uuid>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PrizeRow> for Prize {
    fn from(row: PrizeRow) -> Self {
        Prize {
            id: row.id,
            reward_id: row.reward_id,
            title: row.title,
            description: row.description,
            points: row.points,
            image_url: row.image_url,
            owner_id: row.owner_id,
            shared_with: row.shared_with,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
