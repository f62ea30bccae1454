pub mod task;

pub use task::{Task, TaskId, TaskKind, TaskStatus};
