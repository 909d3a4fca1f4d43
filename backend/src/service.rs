use crate::store::{StoreError, TaskStore};
use shared::{Task, TaskId};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Task not found with id {0}")]
    NotFound(TaskId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates store calls; mutation paths require the task to exist.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.store.find_all()
    }

    pub fn get_task_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.store.find_by_id(id)
    }

    pub fn create_task(&self, task: Task) -> Result<Task, StoreError> {
        self.store.save(task)
    }

    pub fn update_task(&self, id: TaskId, completed: bool) -> Result<Task, ServiceError> {
        self.modify(id, |task| task.completed = completed)
    }

    pub fn update_description(&self, id: TaskId, desc: String) -> Result<Task, ServiceError> {
        self.modify(id, |task| task.description = Some(desc))
    }

    pub fn delete_task_by_id(&self, id: TaskId) -> Result<(), StoreError> {
        self.store.delete_by_id(id)
    }

    pub fn find_by_id_and_title(&self, id: TaskId, title: &str) -> Result<Vec<Task>, StoreError> {
        self.store.find_by_id_and_title(id, title)
    }

    // Load, mutate, save. Not atomic against concurrent writers.
    fn modify(&self, id: TaskId, apply: impl FnOnce(&mut Task)) -> Result<Task, ServiceError> {
        let mut task = self.store.find_by_id(id)?.ok_or(ServiceError::NotFound(id))?;
        apply(&mut task);
        Ok(self.store.save(task)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteTaskStore;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> TaskService {
        TaskService::new(Arc::new(SqliteTaskStore::in_memory().unwrap()))
    }

    struct BrokenStore;

    impl TaskStore for BrokenStore {
        fn find_all(&self) -> Result<Vec<Task>, StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
        fn find_by_id(&self, _: TaskId) -> Result<Option<Task>, StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
        fn find_by_id_greater_than(&self, _: TaskId) -> Result<Vec<Task>, StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
        fn find_by_id_and_title(&self, _: TaskId, _: &str) -> Result<Vec<Task>, StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
        fn save(&self, _: Task) -> Result<Task, StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
        fn delete_by_id(&self, _: TaskId) -> Result<(), StoreError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
    }

    #[rstest]
    fn create_then_fetch(service: TaskService) {
        let created = service.create_task(Task::new("t", "d")).unwrap();
        let id = created.id.unwrap();

        let fetched = service.get_task_by_id(id).unwrap().unwrap();
        assert_eq!(fetched, Task { id: Some(id), ..Task::new("t", "d") });
    }

    #[rstest]
    fn list_returns_every_created_task(service: TaskService) {
        for i in 0..5 {
            service.create_task(Task::new(format!("task {i}"), "d")).unwrap();
        }
        let tasks = service.get_all_tasks().unwrap();
        assert_eq!(tasks.len(), 5);
        for task in tasks {
            assert_eq!(service.get_task_by_id(task.id.unwrap()).unwrap(), Some(task));
        }
    }

    #[rstest]
    fn update_task_only_touches_completed(service: TaskService) {
        let created = service.create_task(Task::new("t", "d")).unwrap();
        let updated = service.update_task(created.id.unwrap(), true).unwrap();

        assert!(updated.completed);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.description, created.description);
        assert_eq!(service.get_task_by_id(created.id.unwrap()).unwrap(), Some(updated));
    }

    #[rstest]
    fn update_description_persists(service: TaskService) {
        let created = service.create_task(Task::new("t", "d")).unwrap();
        let updated = service.update_description(created.id.unwrap(), "new".to_string()).unwrap();

        assert_eq!(updated.description.as_deref(), Some("new"));
        assert!(!updated.completed);
    }

    #[rstest]
    fn missing_ids(service: TaskService) {
        assert_eq!(service.get_task_by_id(999).unwrap(), None);

        let err = service.update_task(999, true).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(999)));
        assert_eq!(err.to_string(), "Task not found with id 999");

        let err = service.update_description(999, "x".to_string()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(999)));
    }

    #[rstest]
    fn delete_is_idempotent(service: TaskService) {
        let id = service.create_task(Task::new("t", "d")).unwrap().id.unwrap();
        service.delete_task_by_id(id).unwrap();
        service.delete_task_by_id(id).unwrap();
        assert_eq!(service.get_task_by_id(id).unwrap(), None);
    }

    #[rstest]
    fn find_by_id_and_title_passes_through(service: TaskService) {
        let id = service.create_task(Task::new("t", "d")).unwrap().id.unwrap();
        assert_eq!(service.find_by_id_and_title(id, "t").unwrap().len(), 1);
        assert!(service.find_by_id_and_title(id, "other").unwrap().is_empty());
    }

    #[test]
    fn store_faults_propagate() {
        let service = TaskService::new(Arc::new(BrokenStore));
        assert!(service.get_all_tasks().is_err());
        assert!(matches!(service.update_task(1, true), Err(ServiceError::Store(_))));
    }
}
