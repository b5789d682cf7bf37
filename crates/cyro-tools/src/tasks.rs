//! In-memory task tracking
//!
//! A [`TaskBoard`] is shared by the `todo_write` and `query_tasks` tools of
//! one bundle, so an agent can plan work in one call and read it back later.
//! Nothing is persisted.

use crate::{Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_QUERY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A tracked unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub parent_task_id: Option<String>,
    pub tags: Vec<String>,
    /// Estimate in minutes
    pub estimated_duration: Option<u32>,
}

/// Incoming create/update payload for a single todo
#[derive(Debug, Clone, Deserialize)]
pub struct TodoInput {
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assigned_to: Option<String>,
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub estimated_duration: Option<u32>,
}

/// Filters for [`TaskBoard::query`]. Empty filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    /// Matches tasks carrying at least one of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    pub limit: Option<usize>,
}

/// Counts reported by [`TaskBoard::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub created: usize,
    pub updated: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: RwLock<Vec<TodoItem>>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create todos, or update the existing entry when an id is already known.
    pub fn write(&self, inputs: Vec<TodoInput>) -> WriteSummary {
        let mut tasks = self.tasks.write();
        let mut created = 0;
        let mut updated = 0;
        let now = Utc::now();

        for input in inputs {
            let existing = input
                .id
                .as_deref()
                .and_then(|id| tasks.iter_mut().find(|t| t.id == id));

            match existing {
                Some(task) => {
                    task.content = input.content;
                    task.status = input.status;
                    task.priority = input.priority;
                    task.assigned_to = input.assigned_to;
                    task.tags = input.tags;
                    task.estimated_duration = input.estimated_duration;
                    task.updated_at = now;
                    updated += 1;
                }
                None => {
                    let id = input.id.unwrap_or_else(short_id);
                    tasks.push(TodoItem {
                        id,
                        content: input.content,
                        status: input.status,
                        priority: input.priority,
                        created_at: now,
                        updated_at: now,
                        assigned_to: input.assigned_to,
                        parent_task_id: input.parent_task_id,
                        tags: input.tags,
                        estimated_duration: input.estimated_duration,
                    });
                    created += 1;
                }
            }
        }

        WriteSummary {
            created,
            updated,
            total: tasks.len(),
        }
    }

    /// Matching tasks, most urgent first and newest first within a priority.
    ///
    /// Returns the page and the number of matches before the limit.
    pub fn query(&self, query: &TaskQuery) -> (Vec<TodoItem>, usize) {
        let tasks = self.tasks.read();
        let mut matching: Vec<TodoItem> = tasks
            .iter()
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| {
                query
                    .assigned_to
                    .as_deref()
                    .map_or(true, |a| t.assigned_to.as_deref() == Some(a))
            })
            .filter(|t| query.tags.is_empty() || query.tags.iter().any(|tag| t.tags.contains(tag)))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = matching.len();
        matching.truncate(query.limit.unwrap_or(DEFAULT_QUERY_LIMIT));
        (matching, total)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Build the `task_management` category around a fresh board
pub fn toolset(_ctx: &ToolContext) -> ToolBundle {
    toolset_with_board(Arc::new(TaskBoard::new()))
}

/// Build the `task_management` category around an existing board
pub fn toolset_with_board(board: Arc<TaskBoard>) -> ToolBundle {
    ToolBundle::new()
        .with(Arc::new(TodoWriteTool {
            board: Arc::clone(&board),
        }))
        .with(Arc::new(QueryTasksTool { board }))
}

pub struct TodoWriteTool {
    board: Arc<TaskBoard>,
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn name(&self) -> &str {
        "todo_write"
    }

    fn description(&self) -> &str {
        "Create or update todo items. Items with an id that already exists are updated in place."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "content": {"type": "string"},
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed", "blocked", "cancelled"]
                            },
                            "priority": {
                                "type": "string",
                                "enum": ["low", "medium", "high", "urgent"]
                            },
                            "assigned_to": {"type": "string"},
                            "parent_task_id": {"type": "string"},
                            "tags": {"type": "array", "items": {"type": "string"}},
                            "estimated_duration": {
                                "type": "integer",
                                "description": "Estimate in minutes"
                            }
                        },
                        "required": ["content"]
                    }
                }
            },
            "required": ["todos"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let todos = args
            .get("todos")
            .cloned()
            .ok_or_else(|| ToolError::InvalidArguments("todos is required".into()))?;
        let inputs: Vec<TodoInput> = serde_json::from_value(todos)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid todos: {}", e)))?;

        let summary = self.board.write(inputs);
        Ok(json!({
            "success": true,
            "todos_created": summary.created,
            "todos_updated": summary.updated,
            "total_todos": summary.total
        }))
    }
}

pub struct QueryTasksTool {
    board: Arc<TaskBoard>,
}

#[async_trait]
impl Tool for QueryTasksTool {
    fn name(&self) -> &str {
        "query_tasks"
    }

    fn description(&self) -> &str {
        "List tracked tasks filtered by status, priority, assignee or tags, most urgent first."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["pending", "in_progress", "completed", "blocked", "cancelled"]
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high", "urgent"]
                },
                "assigned_to": {"type": "string"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Match tasks carrying any of these tags"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of tasks (default: 50)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query: TaskQuery = if args.is_null() {
            TaskQuery::default()
        } else {
            serde_json::from_value(args)
                .map_err(|e| ToolError::InvalidArguments(format!("Invalid query: {}", e)))?
        };

        let (tasks, total) = self.board.query(&query);
        Ok(json!({
            "tasks": tasks,
            "total_count": total,
            "filtered_count": tasks.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(content: &str, priority: TaskPriority, tags: &[&str]) -> TodoInput {
        TodoInput {
            id: None,
            content: content.to_string(),
            status: TaskStatus::Pending,
            priority,
            assigned_to: None,
            parent_task_id: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            estimated_duration: None,
        }
    }

    #[test]
    fn test_write_creates_then_updates_by_id() {
        let board = TaskBoard::new();
        let mut first = input("write parser", TaskPriority::Medium, &[]);
        first.id = Some("t1".to_string());
        assert_eq!(
            board.write(vec![first.clone()]),
            WriteSummary { created: 1, updated: 0, total: 1 }
        );

        first.status = TaskStatus::Completed;
        assert_eq!(
            board.write(vec![first]),
            WriteSummary { created: 0, updated: 1, total: 1 }
        );

        let (tasks, _) = board.query(&TaskQuery::default());
        assert_eq!(tasks[0].status, TaskStatus::Completed);
    }

    #[test]
    fn test_query_orders_by_priority_and_filters() {
        let board = TaskBoard::new();
        board.write(vec![
            input("low", TaskPriority::Low, &["docs"]),
            input("urgent", TaskPriority::Urgent, &["bug"]),
            input("high", TaskPriority::High, &["bug", "parser"]),
        ]);

        let (tasks, total) = board.query(&TaskQuery::default());
        assert_eq!(total, 3);
        let order: Vec<_> = tasks.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(order, vec!["urgent", "high", "low"]);

        let (bugs, _) = board.query(&TaskQuery {
            tags: vec!["bug".to_string()],
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].content, "urgent");
    }

    #[tokio::test]
    async fn test_tools_share_board() {
        let bundle = toolset(&ToolContext::new("."));
        bundle
            .execute(
                "todo_write",
                json!({"todos": [{"content": "ship it", "priority": "high"}]}),
            )
            .await
            .unwrap();

        let out = bundle
            .execute("query_tasks", json!({"priority": "high"}))
            .await
            .unwrap();
        assert_eq!(out["total_count"], 1);
        assert_eq!(out["tasks"][0]["content"], "ship it");
    }
}
