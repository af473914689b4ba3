use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A registered user with a point balance and an avatar selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Current spendable balance. Never negative.
    pub points: i32,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check whether this user can pay `cost` points.
    pub fn can_afford(&self, cost: i32) -> Result<(), AppError> {
        if cost > self.points {
            return Err(AppError::InsufficientPoints {
                required: cost,
                available: self.points,
            });
        }
        Ok(())
    }
}

/// DTO for inserting a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty("name", &self.name)?;
        validate_email(&self.email)?;
        Ok(())
    }
}

/// Partial update for a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the avatar, `None` leaves it untouched.
    pub avatar: Option<Option<String>>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_non_empty("name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// A redeemable catalog item costing points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Point cost to redeem.
    pub points: i32,
    pub image_url: Option<String>,
    /// Creator of the catalog entry. `None` means a shared/global reward.
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for inserting a new reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReward {
    pub title: String,
    pub description: String,
    pub points: i32,
    pub image_url: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl NewReward {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_non_empty("title", &self.title)?;
        validate_points(self.points)?;
        validate_image_url(self.image_url.as_deref())?;
        Ok(())
    }
}

/// Partial update for a reward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points: Option<i32>,
    /// `Some(None)` clears the image, `None` leaves it untouched.
    pub image_url: Option<Option<String>>,
}

impl RewardUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_non_empty("title", title)?;
        }
        if let Some(points) = self.points {
            validate_points(points)?;
        }
        validate_image_url(self.image_url.as_ref().and_then(|inner| inner.as_deref()))?;
        Ok(())
    }
}

/// A redeemed reward held in a user's inventory.
///
/// Fields are snapshotted from the reward at redemption time; `reward_id`
/// is kept only as a back-reference and may dangle after catalog cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prize {
    pub id: Uuid,
    pub reward_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    /// Points paid at redemption.
    pub points: i32,
    pub image_url: Option<String>,
    pub owner_id: Uuid,
    /// Users this prize has been shared with, in addition to the owner.
    pub shared_with: Vec<Uuid>,
    /// True once the prize has been consumed.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prize {
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.shared_with.contains(&user_id)
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

pub fn validate_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("invalid email: {email}")));
    }
    Ok(())
}

pub fn validate_points(points: i32) -> Result<(), AppError> {
    if points < 0 {
        return Err(AppError::Validation(format!(
            "points must not be negative (got {points})"
        )));
    }
    Ok(())
}

pub fn validate_image_url(image_url: Option<&str>) -> Result<(), AppError> {
    if let Some(raw) = image_url {
        url::Url::parse(raw)
            .map_err(|e| AppError::Validation(format!("invalid image_url '{raw}': {e}")))?;
    }
    Ok(())
}
