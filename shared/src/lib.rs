use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub type TaskId = i64;

/// Field name -> violation message, in field order.
pub type FieldErrors = BTreeMap<String, String>;

pub const TITLE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Assigned by the store on creation.
    #[serde(default)]
    #[schema(example = 1)]
    pub id: Option<TaskId>,
    #[serde(default)]
    #[schema(example = "Write report", max_length = 255)]
    pub title: Option<String>,
    #[serde(default)]
    #[schema(example = "Quarterly numbers", max_length = 1000)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            description: Some(description.into()),
            completed: false,
        }
    }

    /// Checks the constraints a task payload must meet before it is stored.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.insert("title".to_string(), "must not be blank".to_string());
            } else if title.chars().count() > TITLE_MAX_LEN {
                errors.insert(
                    "title".to_string(),
                    format!("size must be at most {TITLE_MAX_LEN} characters"),
                );
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                errors.insert(
                    "description".to_string(),
                    format!("size must be at most {DESCRIPTION_MAX_LEN} characters"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
