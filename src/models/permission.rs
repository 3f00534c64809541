//! Permission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission entity describing one guarded route of the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    /// Unique identifier
    pub id: Uuid,
    /// Module the permission belongs to (e.g. "posts")
    pub module: String,
    /// Permission name (e.g. "posts:create")
    pub name: String,
    /// Action within the module (e.g. "create")
    pub action: String,
    /// Route pattern the permission guards
    pub route: Option<String>,
    /// HTTP method (GET, POST, PUT, DELETE, PATCH)
    pub method: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Create a new Permission
    pub fn new(id: Uuid, module: String, name: String, action: String, method: String) -> Self {
        Self {
            id,
            module,
            name,
            action,
            route: None,
            method,
            created_at: Utc::now(),
        }
    }

    /// Duplicate this permission under a fresh id.
    ///
    /// The copy gets a " - copy" suffix on its name so the unique
    /// constraint is not violated.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            module: self.module.clone(),
            name: format!("{} - copy", self.name),
            action: self.action.clone(),
            route: self.route.clone(),
            method: self.method.clone(),
            created_at: Utc::now(),
        }
    }
}
