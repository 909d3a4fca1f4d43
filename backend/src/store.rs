use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shared::{Task, TaskId};
use std::path::Path;

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    description TEXT,
    completed INTEGER NOT NULL DEFAULT 0
);";
const SELECT_TASKS: &str = "SELECT id, title, description, completed FROM tasks";
const INSERT_TASK: &str = "INSERT INTO tasks (title, description, completed) VALUES (?1, ?2, ?3)";
const UPSERT_TASK: &str = "INSERT INTO tasks (id, title, description, completed) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(id) DO UPDATE SET title = excluded.title, description = excluded.description, completed = excluded.completed";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Persistence contract for task records.
pub trait TaskStore: Send + Sync {
    fn find_all(&self) -> Result<Vec<Task>, StoreError>;

    fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    fn find_by_id_greater_than(&self, id: TaskId) -> Result<Vec<Task>, StoreError>;

    fn find_by_id_and_title(&self, id: TaskId, title: &str) -> Result<Vec<Task>, StoreError>;

    /// Inserts when `task.id` is `None`, otherwise overwrites the row with that id.
    /// Returns the stored record, with its assigned id on insert.
    fn save(&self, task: Task) -> Result<Task, StoreError>;

    /// Deleting an id that does not exist is not an error.
    fn delete_by_id(&self, id: TaskId) -> Result<(), StoreError>;
}

pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Opens a file path, or an in-memory database for `:memory:`.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        if url == ":memory:" {
            Self::in_memory()
        } else {
            Self::open(url)
        }
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA_TASKS, [])?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, task_from_row)?;
        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
    })
}

impl TaskStore for SqliteTaskStore {
    fn find_all(&self) -> Result<Vec<Task>, StoreError> {
        self.query(&format!("{SELECT_TASKS} ORDER BY id"), [])
    }

    fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.lock();
        let task = conn
            .query_row(&format!("{SELECT_TASKS} WHERE id = ?1"), params![id], task_from_row)
            .optional()?;
        Ok(task)
    }

    fn find_by_id_greater_than(&self, id: TaskId) -> Result<Vec<Task>, StoreError> {
        self.query(&format!("{SELECT_TASKS} WHERE id > ?1 ORDER BY id"), params![id])
    }

    fn find_by_id_and_title(&self, id: TaskId, title: &str) -> Result<Vec<Task>, StoreError> {
        self.query(&format!("{SELECT_TASKS} WHERE id = ?1 AND title = ?2"), params![id, title])
    }

    fn save(&self, task: Task) -> Result<Task, StoreError> {
        let conn = self.conn.lock();
        match task.id {
            Some(id) => {
                conn.execute(UPSERT_TASK, params![id, task.title, task.description, task.completed])?;
                Ok(task)
            }
            None => {
                conn.execute(INSERT_TASK, params![task.title, task.description, task.completed])?;
                Ok(Task {
                    id: Some(conn.last_insert_rowid()),
                    ..task
                })
            }
        }
    }

    fn delete_by_id(&self, id: TaskId) -> Result<(), StoreError> {
        let deleted = self.conn.lock().execute(DELETE_TASK, params![id])?;
        tracing::debug!(id, deleted, "delete_by_id");
        Ok(())
    }
}
