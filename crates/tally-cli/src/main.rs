use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tally_client::ApiClient;
use tally_core::models::{NewReward, NewUser};
use tally_core::task::{NewTask, Task, TaskFilter};

#[derive(Parser)]
#[command(name = "tally", version, about = "Admin CLI for the Tally task/rewards backend")]
struct Cli {
    /// Base URL of the Tally server
    #[arg(
        long,
        env = "TALLY_API_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    base_url: String,

    /// API key for the server (reads from TALLY_API_KEY env var if not provided)
    #[arg(long, env = "TALLY_API_KEY", global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    AddUser {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Avatar identifier (free-form, interpreted by clients)
        #[arg(long)]
        avatar: Option<String>,
    },

    /// List users with their point balances
    Users {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Create a task
    AddTask {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        text: String,

        /// Points awarded on completion
        #[arg(short, long, default_value_t = 0)]
        points: i32,

        /// Due date (RFC 3339, e.g. 2026-09-01T18:00:00Z)
        #[arg(short, long)]
        due: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Assignee user id
        #[arg(short, long)]
        assign: Option<Uuid>,
    },

    /// List tasks
    Tasks {
        /// Only tasks assigned to this user
        #[arg(short, long)]
        assigned_to: Option<Uuid>,

        /// Only open tasks
        #[arg(long, conflicts_with = "completed")]
        open: bool,

        /// Only completed tasks
        #[arg(long)]
        completed: bool,

        /// Only tasks carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Mark a task completed, awarding its points to the assignee
    Complete {
        /// Task id
        id: Uuid,
    },

    /// Add a reward to the catalog
    AddReward {
        /// Reward title
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Point cost to redeem
        #[arg(short, long)]
        points: i32,

        /// Image URL shown for the reward
        #[arg(long)]
        image_url: Option<String>,

        /// Owning user id (omit for a global reward)
        #[arg(short, long)]
        owner: Option<Uuid>,
    },

    /// List the reward catalog
    Rewards {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Redeem a reward for a user, deducting its cost
    Redeem {
        /// Reward id
        reward: Uuid,

        /// Redeeming user id
        #[arg(short, long)]
        user: Uuid,
    },

    /// Show a user's prize inventory
    Inventory {
        /// User id
        user: Uuid,
    },

    /// Export tasks as CSV to stdout
    ExportTasks {
        /// Only tasks assigned to this user
        #[arg(short, long)]
        assigned_to: Option<Uuid>,

        #[arg(short, long, default_value_t = 1000)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so CSV/JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tally=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .context("TALLY_API_KEY not set. Pass --api-key or set the env var.")?;
    let client = ApiClient::new(&cli.base_url, &api_key).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::AddUser {
            name,
            email,
            avatar,
        } => cmd_add_user(&client, name, email, avatar).await?,
        Commands::Users { limit } => cmd_users(&client, limit).await?,
        Commands::AddTask {
            title,
            text,
            points,
            due,
            tags,
            assign,
        } => cmd_add_task(&client, title, text, points, due, tags, assign).await?,
        Commands::Tasks {
            assigned_to,
            open,
            completed,
            tag,
            limit,
        } => {
            let filter = TaskFilter {
                assigned_to,
                completed: completed_flag(open, completed),
                tag,
                limit,
            };
            cmd_tasks(&client, &filter).await?;
        }
        Commands::Complete { id } => cmd_complete(&client, id).await?,
        Commands::AddReward {
            title,
            description,
            points,
            image_url,
            owner,
        } => cmd_add_reward(&client, title, description, points, image_url, owner).await?,
        Commands::Rewards { limit } => cmd_rewards(&client, limit).await?,
        Commands::Redeem { reward, user } => cmd_redeem(&client, reward, user).await?,
        Commands::Inventory { user } => cmd_inventory(&client, user).await?,
        Commands::ExportTasks { assigned_to, limit } => {
            let filter = TaskFilter {
                assigned_to,
                completed: None,
                tag: None,
                limit,
            };
            cmd_export_tasks(&client, &filter).await?;
        }
    }

    Ok(())
}

fn completed_flag(open: bool, completed: bool) -> Option<bool> {
    match (open, completed) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    }
}

async fn cmd_add_user(
    client: &ApiClient,
    name: String,
    email: String,
    avatar: Option<String>,
) -> Result<()> {
    let user = client
        .create_user(&NewUser {
            name,
            email,
            avatar,
        })
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(id = %user.id, "User created");
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

async fn cmd_users(client: &ApiClient, limit: usize) -> Result<()> {
    let users = client.list_users(limit).await.map_err(|e| anyhow::anyhow!(e))?;

    if users.is_empty() {
        println!("No users found");
        return Ok(());
    }

    for user in &users {
        println!(
            "  {} — {} <{}> ({} points)",
            user.id, user.name, user.email, user.points
        );
    }
    println!("\nTotal: {} users", users.len());
    Ok(())
}

async fn cmd_add_task(
    client: &ApiClient,
    title: String,
    text: String,
    points: i32,
    due: Option<String>,
    tags: Option<String>,
    assign: Option<Uuid>,
) -> Result<()> {
    let mut task = NewTask::new(title).with_text(text).with_points(points);

    if let Some(due) = due {
        let due = DateTime::parse_from_rfc3339(&due)
            .with_context(|| format!("Invalid due date '{due}', expected RFC 3339"))?
            .with_timezone(&Utc);
        task = task.with_due_date(due);
    }
    if let Some(tags) = tags {
        task = task.with_tags(tags.split(',').map(|t| t.trim().to_string()).collect());
    }
    if let Some(user_id) = assign {
        task = task.assigned_to(user_id);
    }

    let task = client.create_task(&task).await.map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(id = %task.id, "Task created");
    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}

async fn cmd_tasks(client: &ApiClient, filter: &TaskFilter) -> Result<()> {
    let tasks = client.list_tasks(filter).await.map_err(|e| anyhow::anyhow!(e))?;

    if tasks.is_empty() {
        println!("No tasks found");
        return Ok(());
    }

    for task in &tasks {
        let status = if task.completed { "done" } else { "open" };
        let due = task
            .due_date
            .map(|d| d.format(" due %Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "  [{status}] {} — {} ({} pts{due})",
            task.id, task.title, task.points
        );
    }
    println!("\nTotal: {} tasks", tasks.len());
    Ok(())
}

async fn cmd_complete(client: &ApiClient, id: Uuid) -> Result<()> {
    let task = client.complete_task(id).await.map_err(|e| anyhow::anyhow!(e))?;

    match task.assigned_to {
        Some(user_id) => tracing::info!(%user_id, points = task.points, "Task completed, points awarded"),
        None => tracing::info!("Task completed (unassigned, no points awarded)"),
    }
    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}

async fn cmd_add_reward(
    client: &ApiClient,
    title: String,
    description: String,
    points: i32,
    image_url: Option<String>,
    owner: Option<Uuid>,
) -> Result<()> {
    let reward = client
        .create_reward(&NewReward {
            title,
            description,
            points,
            image_url,
            owner_id: owner,
        })
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(id = %reward.id, "Reward created");
    println!("{}", serde_json::to_string_pretty(&reward)?);
    Ok(())
}

async fn cmd_rewards(client: &ApiClient, limit: usize) -> Result<()> {
    let rewards = client.list_rewards(limit).await.map_err(|e| anyhow::anyhow!(e))?;

    if rewards.is_empty() {
        println!("No rewards found");
        return Ok(());
    }

    for reward in &rewards {
        println!("  {} — {} ({} pts)", reward.id, reward.title, reward.points);
    }
    println!("\nTotal: {} rewards", rewards.len());
    Ok(())
}

async fn cmd_redeem(client: &ApiClient, reward_id: Uuid, user_id: Uuid) -> Result<()> {
    let prize = client
        .redeem(reward_id, user_id)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(id = %prize.id, points = prize.points, "Reward redeemed");
    println!("{}", serde_json::to_string_pretty(&prize)?);
    Ok(())
}

async fn cmd_inventory(client: &ApiClient, user_id: Uuid) -> Result<()> {
    let prizes = client.inventory(user_id).await.map_err(|e| anyhow::anyhow!(e))?;

    if prizes.is_empty() {
        println!("No prizes found for user {user_id}");
        return Ok(());
    }

    for prize in &prizes {
        let status = if prize.completed { "used" } else { "held" };
        let shared = if prize.owner_id == user_id {
            String::new()
        } else {
            format!(" (shared by {})", prize.owner_id)
        };
        println!(
            "  [{status}] {} — {} ({} pts){shared}",
            prize.id, prize.title, prize.points
        );
    }
    println!("\nTotal: {} prizes", prizes.len());
    Ok(())
}

async fn cmd_export_tasks(client: &ApiClient, filter: &TaskFilter) -> Result<()> {
    let tasks = client.list_tasks(filter).await.map_err(|e| anyhow::anyhow!(e))?;

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record([
        "id",
        "title",
        "text",
        "points",
        "completed",
        "due_date",
        "tags",
        "assigned_to",
        "created_at",
    ])?;

    for task in &tasks {
        writer.write_record(csv_record(task))?;
    }
    writer.flush()?;

    tracing::info!(count = tasks.len(), "Exported tasks");
    Ok(())
}

fn csv_record(task: &Task) -> [String; 9] {
    [
        task.id.to_string(),
        task.title.clone(),
        task.text.clone(),
        task.points.to_string(),
        task.completed.to_string(),
        task.due_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        task.tags.join(","),
        task.assigned_to.map(|u| u.to_string()).unwrap_or_default(),
        task.created_at.to_rfc3339(),
    ]
}
