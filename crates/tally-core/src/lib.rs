pub mod error;
pub mod models;
pub mod task;

pub use error::AppError;
pub use models::{NewReward, NewUser, Prize, Reward, User};
pub use task::{NewTask, Subtask, Task, TaskFilter, TaskList};
