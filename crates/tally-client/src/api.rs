use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use tally_core::error::AppError;
use tally_core::models::{NewReward, NewUser, Prize, Reward, User};
use tally_core::task::{NewTask, Task, TaskFilter};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the Tally REST API.
///
/// Used by the CLI; authenticates with the server's bearer API key.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        // Fail fast on a malformed base URL instead of on the first call.
        url::Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        self.send(self.request(Method::POST, "/v1/users").json(user))
            .await
    }

    pub async fn list_users(&self, limit: usize) -> Result<Vec<User>, AppError> {
        let wrapper: UserListWrapper = self
            .send(
                self.request(Method::GET, "/v1/users")
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(wrapper.users)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.send(self.request(Method::GET, &format!("/v1/users/{id}")))
            .await
    }

    pub async fn inventory(&self, user_id: Uuid) -> Result<Vec<Prize>, AppError> {
        let wrapper: PrizeListWrapper = self
            .send(self.request(Method::GET, &format!("/v1/users/{user_id}/inventory")))
            .await?;
        Ok(wrapper.prizes)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, AppError> {
        self.send(self.request(Method::POST, "/v1/tasks").json(task))
            .await
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut query: Vec<(&str, String)> = vec![("limit", filter.limit.to_string())];
        if let Some(assigned_to) = filter.assigned_to {
            query.push(("assigned_to", assigned_to.to_string()));
        }
        if let Some(completed) = filter.completed {
            query.push(("completed", completed.to_string()));
        }
        if let Some(tag) = &filter.tag {
            query.push(("tag", tag.clone()));
        }

        let wrapper: TaskListWrapper = self
            .send(self.request(Method::GET, "/v1/tasks").query(&query))
            .await?;
        Ok(wrapper.tasks)
    }

    pub async fn complete_task(&self, id: Uuid) -> Result<Task, AppError> {
        self.send(self.request(Method::POST, &format!("/v1/tasks/{id}/complete")))
            .await
    }

    // -----------------------------------------------------------------------
    // Rewards & prizes
    // -----------------------------------------------------------------------

    pub async fn create_reward(&self, reward: &NewReward) -> Result<Reward, AppError> {
        self.send(self.request(Method::POST, "/v1/rewards").json(reward))
            .await
    }

    pub async fn list_rewards(&self, limit: usize) -> Result<Vec<Reward>, AppError> {
        let wrapper: RewardListWrapper = self
            .send(
                self.request(Method::GET, "/v1/rewards")
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(wrapper.rewards)
    }

    pub async fn redeem(&self, reward_id: Uuid, user_id: Uuid) -> Result<Prize, AppError> {
        self.send(
            self.request(Method::POST, &format!("/v1/rewards/{reward_id}/redeem"))
                .json(&serde_json::json!({ "user_id": user_id })),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::Upstream(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse response: {e}")))
    }
}

/// Translate the server's `{ error, message }` body back into the error
/// taxonomy so CLI output reads the same as server logs.
fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| format!("HTTP {status}: {body}"));

    match status {
        // The server renders NotFound as "{resource} not found: {id}",
        // which lets us rebuild the structured variant here.
        StatusCode::NOT_FOUND => match message.split_once(" not found: ") {
            Some((resource, id)) => AppError::not_found(resource, id),
            None => AppError::not_found("resource", message),
        },
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::BAD_REQUEST => AppError::Validation(message),
        _ => AppError::Upstream(message),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    message: String,
}

#[derive(Deserialize)]
struct UserListWrapper {
    users: Vec<User>,
}

#[derive(Deserialize)]
struct TaskListWrapper {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct RewardListWrapper {
    rewards: Vec<Reward>,
}

#[derive(Deserialize)]
struct PrizeListWrapper {
    prizes: Vec<Prize>,
}
