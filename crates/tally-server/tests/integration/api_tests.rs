use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::common::{TEST_API_KEY, setup_test_app};

async fn send(
    router: Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("authorization", format!("Bearer {TEST_API_KEY}"));

    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_user(router: &Router, email: &str) -> Value {
    let (status, user) = send(
        router.clone(),
        "POST",
        "/v1/users",
        Some(json!({"name": "Test User", "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/v1/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::get("/v1/users")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_crud_round_trip() {
    let app = setup_test_app().await;

    let user = create_user(&app.router, "ada@example.com").await;
    assert_eq!(user["points"], 0);
    let id = user["id"].as_str().unwrap();

    let (status, fetched) = send(app.router.clone(), "GET", &format!("/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["email"], "ada@example.com");

    let (status, updated) = send(
        app.router.clone(),
        "PUT",
        &format!("/v1/users/{id}"),
        Some(json!({"name": "Ada Lovelace"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada Lovelace");
    assert_eq!(updated["email"], "ada@example.com");

    let (status, listed) = send(app.router.clone(), "GET", "/v1/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);

    let (status, _) = send(app.router.clone(), "DELETE", &format!("/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app.router.clone(), "GET", &format!("/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_email_returns_400() {
    let app = setup_test_app().await;

    let (status, body) = send(
        app.router.clone(),
        "POST",
        "/v1/users",
        Some(json!({"name": "Bad", "email": "not-an-email"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn duplicate_email_returns_409() {
    let app = setup_test_app().await;
    create_user(&app.router, "ada@example.com").await;

    let (status, body) = send(
        app.router.clone(),
        "POST",
        "/v1/users",
        Some(json!({"name": "Clone", "email": "ada@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn completing_task_awards_points_to_assignee() {
    let app = setup_test_app().await;
    let user = create_user(&app.router, "ada@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    let (status, task) = send(
        app.router.clone(),
        "POST",
        "/v1/tasks",
        Some(json!({
            "title": "Do the dishes",
            "points": 10,
            "tags": ["chores"],
            "assigned_to": user_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_str().unwrap();

    let (status, completed) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/tasks/{task_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["completed"], true);

    let (_, user) = send(app.router.clone(), "GET", &format!("/v1/users/{user_id}"), None).await;
    assert_eq!(user["points"], 10);

    // Second completion is rejected and does not award again
    let (status, body) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/tasks/{task_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Award-bearing fields cannot change while the task is completed
    let (status, body) = send(
        app.router.clone(),
        "PUT",
        &format!("/v1/tasks/{task_id}"),
        Some(json!({"points": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Reopen claws the points back
    let (status, reopened) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/tasks/{task_id}/reopen"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["completed"], false);

    let (_, user) = send(app.router.clone(), "GET", &format!("/v1/users/{user_id}"), None).await;
    assert_eq!(user["points"], 0);
}

#[tokio::test]
async fn task_list_filters_by_tag() {
    let app = setup_test_app().await;

    for (title, tag) in [("Dishes", "chores"), ("Homework", "school")] {
        let (status, _) = send(
            app.router.clone(),
            "POST",
            "/v1/tasks",
            Some(json!({"title": title, "tags": [tag]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(app.router.clone(), "GET", "/v1/tasks?tag=chores", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["tasks"][0]["title"], "Dishes");
}

#[tokio::test]
async fn subtasks_follow_their_task() {
    let app = setup_test_app().await;

    let (_, task) = send(
        app.router.clone(),
        "POST",
        "/v1/tasks",
        Some(json!({"title": "Parent"})),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let (status, subtask) = send(
        app.router.clone(),
        "POST",
        "/v1/subtasks",
        Some(json!({"task_id": task_id, "text": "rinse"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let subtask_id = subtask["id"].as_str().unwrap();

    let (status, body) = send(
        app.router.clone(),
        "GET",
        &format!("/v1/tasks/{task_id}/subtasks"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, updated) = send(
        app.router.clone(),
        "PUT",
        &format!("/v1/subtasks/{subtask_id}"),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);

    // Deleting the task cascades
    let (status, _) = send(app.router.clone(), "DELETE", &format!("/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        app.router.clone(),
        "GET",
        &format!("/v1/subtasks/{subtask_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_membership_is_idempotent() {
    let app = setup_test_app().await;

    let (_, task) = send(
        app.router.clone(),
        "POST",
        "/v1/tasks",
        Some(json!({"title": "Mow the lawn"})),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let (status, list) = send(
        app.router.clone(),
        "POST",
        "/v1/lists",
        Some(json!({"name": "Garden"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let list_id = list["id"].as_str().unwrap();

    for _ in 0..2 {
        let (status, list) = send(
            app.router.clone(),
            "POST",
            &format!("/v1/lists/{list_id}/tasks"),
            Some(json!({"task_id": task_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["task_ids"].as_array().unwrap().len(), 1);
    }

    let (status, list) = send(
        app.router.clone(),
        "DELETE",
        &format!("/v1/lists/{list_id}/tasks/{task_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list["task_ids"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn redeem_flow_deducts_points_and_fills_inventory() {
    let app = setup_test_app().await;
    let user = create_user(&app.router, "ada@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    // Earn 50 points
    let (_, task) = send(
        app.router.clone(),
        "POST",
        "/v1/tasks",
        Some(json!({"title": "Big chore", "points": 50, "assigned_to": user_id})),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();
    send(
        app.router.clone(),
        "POST",
        &format!("/v1/tasks/{task_id}/complete"),
        None,
    )
    .await;

    let (status, reward) = send(
        app.router.clone(),
        "POST",
        "/v1/rewards",
        Some(json!({"title": "Movie night", "points": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reward_id = reward["id"].as_str().unwrap();

    let (status, prize) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/rewards/{reward_id}/redeem"),
        Some(json!({"user_id": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(prize["title"], "Movie night");
    assert_eq!(prize["owner_id"], user_id);

    let (_, user) = send(app.router.clone(), "GET", &format!("/v1/users/{user_id}"), None).await;
    assert_eq!(user["points"], 20);

    let (status, inventory) = send(
        app.router.clone(),
        "GET",
        &format!("/v1/users/{user_id}/inventory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory["total"], 1);

    // A second redemption exceeds the remaining balance
    let (status, body) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/rewards/{reward_id}/redeem"),
        Some(json!({"user_id": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_points");
}

#[tokio::test]
async fn shared_prize_appears_in_friend_inventory() {
    let app = setup_test_app().await;
    let owner = create_user(&app.router, "owner@example.com").await;
    let friend = create_user(&app.router, "friend@example.com").await;
    let owner_id = owner["id"].as_str().unwrap();
    let friend_id = friend["id"].as_str().unwrap();

    let (_, task) = send(
        app.router.clone(),
        "POST",
        "/v1/tasks",
        Some(json!({"title": "Earn", "points": 30, "assigned_to": owner_id})),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();
    send(
        app.router.clone(),
        "POST",
        &format!("/v1/tasks/{task_id}/complete"),
        None,
    )
    .await;

    let (_, reward) = send(
        app.router.clone(),
        "POST",
        "/v1/rewards",
        Some(json!({"title": "Movie night", "points": 30})),
    )
    .await;
    let reward_id = reward["id"].as_str().unwrap();

    let (_, prize) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/rewards/{reward_id}/redeem"),
        Some(json!({"user_id": owner_id})),
    )
    .await;
    let prize_id = prize["id"].as_str().unwrap();

    let (status, shared) = send(
        app.router.clone(),
        "POST",
        &format!("/v1/prizes/{prize_id}/share"),
        Some(json!({"user_id": friend_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["shared_with"][0], friend_id);

    let (_, inventory) = send(
        app.router.clone(),
        "GET",
        &format!("/v1/users/{friend_id}/inventory"),
        None,
    )
    .await;
    assert_eq!(inventory["total"], 1);

    let (status, unshared) = send(
        app.router.clone(),
        "DELETE",
        &format!("/v1/prizes/{prize_id}/share/{friend_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unshared["shared_with"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn media_delete_without_credentials_returns_500() {
    let app = setup_test_app().await;

    let (status, body) = send(
        app.router.clone(),
        "POST",
        "/v1/media/delete",
        Some(json!({"public_id": "avatars/abc123"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "config_error");

    let (status, body) = send(
        app.router.clone(),
        "POST",
        "/v1/media/delete",
        Some(json!({"public_id": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn unknown_resource_returns_404() {
    let app = setup_test_app().await;
    let missing = uuid::Uuid::new_v4();

    for path in [
        format!("/v1/tasks/{missing}"),
        format!("/v1/lists/{missing}"),
        format!("/v1/rewards/{missing}"),
        format!("/v1/prizes/{missing}"),
    ] {
        let (status, body) = send(app.router.clone(), "GET", &path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "for {path}");
        assert_eq!(body["error"], "not_found");
    }
}
