use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use tally_db::Database;
use tally_server::routes;
use tally_server::state::AppState;

pub const TEST_API_KEY: &str = "test-secret-key";

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        email VARCHAR NOT NULL UNIQUE,
        points INTEGER NOT NULL DEFAULT 0,
        avatar VARCHAR,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT chk_users_points CHECK (points >= 0)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"#,
    r#"CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title VARCHAR NOT NULL,
        text TEXT NOT NULL DEFAULT '',
        points INTEGER NOT NULL DEFAULT 0,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        due_date TIMESTAMPTZ,
        tags TEXT[] NOT NULL DEFAULT '{}',
        assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT chk_tasks_points CHECK (points >= 0)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assigned_to, created_at DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_open ON tasks(due_date) WHERE completed = FALSE"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_tags ON tasks USING GIN(tags)"#,
    r#"CREATE TABLE IF NOT EXISTS subtasks (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_subtasks_task ON subtasks(task_id, created_at ASC)"#,
    r#"CREATE TABLE IF NOT EXISTS lists (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        task_ids UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS rewards (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title VARCHAR NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        points INTEGER NOT NULL,
        image_url VARCHAR,
        owner_id UUID REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT chk_rewards_points CHECK (points >= 0)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_rewards_owner ON rewards(owner_id, created_at DESC)"#,
    r#"CREATE TABLE IF NOT EXISTS prizes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        reward_id UUID REFERENCES rewards(id) ON DELETE SET NULL,
        title VARCHAR NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        points INTEGER NOT NULL,
        image_url VARCHAR,
        owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        shared_with UUID[] NOT NULL DEFAULT '{}',
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_prizes_owner ON prizes(owner_id, created_at DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_prizes_shared ON prizes USING GIN(shared_with)"#,
];

pub struct TestApp {
    pub router: Router,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up a PostgreSQL container and build the app router against it.
///
/// The container lives as long as the returned `TestApp`.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "tally_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/tally_test");
    let pool = retry_connect(&url).await;

    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    let db = Database::from_pool(pool);
    let state = Arc::new(AppState {
        db,
        api_key: TEST_API_KEY.to_string(),
        cloudinary: None,
    });

    TestApp {
        router: routes::router(state),
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}
