use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tally API",
        version = "0.2.0",
        description = "Task and rewards backend: earn points by completing tasks, redeem them for prizes."
    ),
    paths(
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::users::inventory,
        crate::routes::tasks::create_task,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
        crate::routes::tasks::complete_task,
        crate::routes::tasks::reopen_task,
        crate::routes::tasks::task_subtasks,
        crate::routes::subtasks::create_subtask,
        crate::routes::subtasks::list_subtasks,
        crate::routes::subtasks::get_subtask,
        crate::routes::subtasks::update_subtask,
        crate::routes::subtasks::delete_subtask,
        crate::routes::lists::create_list,
        crate::routes::lists::list_lists,
        crate::routes::lists::get_list,
        crate::routes::lists::update_list,
        crate::routes::lists::delete_list,
        crate::routes::lists::add_task,
        crate::routes::lists::remove_task,
        crate::routes::rewards::create_reward,
        crate::routes::rewards::list_rewards,
        crate::routes::rewards::get_reward,
        crate::routes::rewards::update_reward,
        crate::routes::rewards::delete_reward,
        crate::routes::rewards::redeem,
        crate::routes::prizes::list_prizes,
        crate::routes::prizes::get_prize,
        crate::routes::prizes::share_prize,
        crate::routes::prizes::unshare_prize,
        crate::routes::prizes::complete_prize,
        crate::routes::prizes::delete_prize,
        crate::routes::media::delete_media,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CreateUserRequest,
        crate::dto::UpdateUserRequest,
        crate::dto::UserResponse,
        crate::dto::UserListResponse,
        crate::dto::CreateTaskRequest,
        crate::dto::UpdateTaskRequest,
        crate::dto::TaskResponse,
        crate::dto::TaskListResponse,
        crate::dto::CreateSubtaskRequest,
        crate::dto::UpdateSubtaskRequest,
        crate::dto::SubtaskResponse,
        crate::dto::SubtaskListResponse,
        crate::dto::CreateListRequest,
        crate::dto::UpdateListRequest,
        crate::dto::AddListTaskRequest,
        crate::dto::ListResponse,
        crate::dto::ListsResponse,
        crate::dto::CreateRewardRequest,
        crate::dto::UpdateRewardRequest,
        crate::dto::RewardResponse,
        crate::dto::RewardListResponse,
        crate::dto::RedeemRequest,
        crate::dto::PrizeResponse,
        crate::dto::PrizeListResponse,
        crate::dto::SharePrizeRequest,
        crate::dto::MediaDeleteRequest,
        crate::dto::MediaDeleteResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "users", description = "User accounts and point balances"),
        (name = "tasks", description = "Tasks and point awards"),
        (name = "subtasks", description = "Child items of tasks"),
        (name = "lists", description = "Named task groupings"),
        (name = "rewards", description = "Redeemable reward catalog"),
        (name = "prizes", description = "Redeemed prizes and sharing"),
        (name = "media", description = "Cloudinary deletion proxy"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Server API key. Set via TALLY_SERVER_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
