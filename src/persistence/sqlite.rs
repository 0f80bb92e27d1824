use super::{PersistenceResult, TaskStore, validate_task};
use crate::task::{Task, TaskId};
use rusqlite::{Connection, OptionalExtension, params};

/// Task store backed by SQLite, one JSON document per task.
pub struct SqliteTaskStore {
    connection: Connection,
}

impl SqliteTaskStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self { connection })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS tasks (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Replaces the whole catalogue in one transaction.
    pub fn save_tasks(&mut self, tasks: &[Task]) -> PersistenceResult<()> {
        super::validate_tasks(tasks)?;
        let tx = self.connection.transaction()?;
        tx.execute("DELETE FROM tasks", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO tasks (id, task_json) VALUES (?1, ?2)")?;
            for task in tasks {
                let json = serde_json::to_string(task)?;
                stmt.execute(params![task.id.as_str(), json])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn find_task(&self, id: &TaskId) -> PersistenceResult<Option<Task>> {
        let mut stmt = self
            .connection
            .prepare("SELECT task_json FROM tasks WHERE id = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![id.as_str()], |row| row.get(0))
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list_tasks(&self) -> PersistenceResult<Vec<Task>> {
        let mut stmt = self
            .connection
            .prepare("SELECT task_json FROM tasks ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tasks = Vec::new();
        for json in rows {
            let json = json?;
            let task: Task = serde_json::from_str(&json)?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn upsert_task(&mut self, task: Task) -> PersistenceResult<bool> {
        validate_task(&task)?;
        let json = serde_json::to_string(&task)?;
        let updated = self.connection.execute(
            "UPDATE tasks SET task_json = ?2 WHERE id = ?1",
            params![task.id.as_str(), json],
        )?;
        if updated > 0 {
            return Ok(true);
        }
        self.connection.execute(
            "INSERT INTO tasks (id, task_json) VALUES (?1, ?2)",
            params![task.id.as_str(), json],
        )?;
        Ok(false)
    }

    fn delete_task(&mut self, id: &TaskId) -> PersistenceResult<bool> {
        let removed = self
            .connection
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
        Ok(removed > 0)
    }
}
