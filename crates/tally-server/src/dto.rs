use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use tally_core::models::{NewReward, NewUser, Prize, Reward, RewardUpdate, User, UserUpdate};
use tally_core::task::{
    ListUpdate, NewList, NewSubtask, NewTask, Subtask, SubtaskUpdate, Task, TaskList, TaskUpdate,
};

/// Deserialize a double `Option` so PATCH-style bodies can distinguish an
/// absent field (outer `None`) from an explicit `null` (inner `None`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    /// Selected avatar image URL.
    pub avatar: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            avatar: req.avatar,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Send `null` to clear the avatar; omit the field to leave it as is.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub avatar: Option<Option<String>>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        UserUpdate {
            name: req.name,
            email: req.email,
            avatar: req.avatar,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub points: i32,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            points: user.points,
            avatar: user.avatar,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListUsersQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub points: i32,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            text: req.text,
            points: req.points,
            due_date: req.due_date,
            tags: req.tags,
            assigned_to: req.assigned_to,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub points: Option<i32>,
    /// Send `null` to clear the due date, omit to leave it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Vec<String>>,
    /// Send `null` to unassign, omit to leave it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskUpdate {
            title: req.title,
            text: req.text,
            points: req.points,
            due_date: req.due_date,
            tags: req.tags,
            assigned_to: req.assigned_to,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub points: i32,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            text: task.text,
            points: task.points,
            completed: task.completed,
            due_date: task.due_date,
            tags: task.tags,
            assigned_to: task.assigned_to,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListTasksQuery {
    pub assigned_to: Option<Uuid>,
    pub completed: Option<bool>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateSubtaskRequest {
    pub task_id: Uuid,
    pub text: String,
}

impl From<CreateSubtaskRequest> for NewSubtask {
    fn from(req: CreateSubtaskRequest) -> Self {
        NewSubtask {
            task_id: req.task_id,
            text: req.text,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSubtaskRequest {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl From<UpdateSubtaskRequest> for SubtaskUpdate {
    fn from(req: UpdateSubtaskRequest) -> Self {
        SubtaskUpdate {
            text: req.text,
            completed: req.completed,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubtaskResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subtask> for SubtaskResponse {
    fn from(subtask: Subtask) -> Self {
        Self {
            id: subtask.id,
            task_id: subtask.task_id,
            text: subtask.text,
            completed: subtask.completed,
            created_at: subtask.created_at,
            updated_at: subtask.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubtaskListResponse {
    pub subtasks: Vec<SubtaskResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListSubtasksQuery {
    pub task_id: Uuid,
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub task_ids: Vec<Uuid>,
}

impl From<CreateListRequest> for NewList {
    fn from(req: CreateListRequest) -> Self {
        NewList {
            name: req.name,
            task_ids: req.task_ids,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub task_ids: Option<Vec<Uuid>>,
}

impl From<UpdateListRequest> for ListUpdate {
    fn from(req: UpdateListRequest) -> Self {
        ListUpdate {
            name: req.name,
            task_ids: req.task_ids,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddListTaskRequest {
    pub task_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListResponse {
    pub id: Uuid,
    pub name: String,
    pub task_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskList> for ListResponse {
    fn from(list: TaskList) -> Self {
        Self {
            id: list.id,
            name: list.name,
            task_ids: list.task_ids,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListsResponse {
    pub lists: Vec<ListResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListListsQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRewardRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub points: i32,
    pub image_url: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl From<CreateRewardRequest> for NewReward {
    fn from(req: CreateRewardRequest) -> Self {
        NewReward {
            title: req.title,
            description: req.description,
            points: req.points,
            image_url: req.image_url,
            owner_id: req.owner_id,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRewardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points: Option<i32>,
    /// Send `null` to clear the image; omit the field to leave it as is.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

impl From<UpdateRewardRequest> for RewardUpdate {
    fn from(req: UpdateRewardRequest) -> Self {
        RewardUpdate {
            title: req.title,
            description: req.description,
            points: req.points,
            image_url: req.image_url,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RewardResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub points: i32,
    pub image_url: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reward> for RewardResponse {
    fn from(reward: Reward) -> Self {
        Self {
            id: reward.id,
            title: reward.title,
            description: reward.description,
            points: reward.points,
            image_url: reward.image_url,
            owner_id: reward.owner_id,
            created_at: reward.created_at,
            updated_at: reward.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RewardListResponse {
    pub rewards: Vec<RewardResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListRewardsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RedeemRequest {
    pub user_id: Uuid,
}

// ---------------------------------------------------------------------------
// Prizes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PrizeResponse {
    pub id: Uuid,
    pub reward_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub points: i32,
    pub image_url: Option<String>,
    pub owner_id: Uuid,
    pub shared_with: Vec<Uuid>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prize> for PrizeResponse {
    fn from(prize: Prize) -> Self {
        Self {
            id: prize.id,
            reward_id: prize.reward_id,
            title: prize.title,
            description: prize.description,
            points: prize.points,
            image_url: prize.image_url,
            owner_id: prize.owner_id,
            shared_with: prize.shared_with,
            completed: prize.completed,
            created_at: prize.created_at,
            updated_at: prize.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PrizeListResponse {
    pub prizes: Vec<PrizeResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListPrizesQuery {
    pub owner_id: Option<Uuid>,
    pub shared_with: Option<Uuid>,
    pub include_completed: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SharePrizeRequest {
    pub user_id: Uuid,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MediaDeleteRequest {
    /// Cloudinary public id of the uploaded image.
    pub public_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MediaDeleteResponse {
    /// Cloudinary's result string ("ok" or "not found").
    pub result: String,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
