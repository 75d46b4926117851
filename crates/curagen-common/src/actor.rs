//! Actor context supplied by the caller for every validate / transition call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Viewer,
    Curator,
    Reviewer,
    Admin,
    ScopeAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Viewer => "viewer",
            UserRole::Curator => "curator",
            UserRole::Reviewer => "reviewer",
            UserRole::Admin => "admin",
            UserRole::ScopeAdmin => "scope_admin",
        }
    }

    /// Global admins bypass scope membership checks.
    pub fn is_global_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn can_edit_evidence(&self) -> bool {
        matches!(self, UserRole::Curator | UserRole::Admin | UserRole::ScopeAdmin)
    }

    pub fn can_assign_reviewers(&self) -> bool {
        matches!(self, UserRole::Curator | UserRole::Admin | UserRole::ScopeAdmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewer" => Ok(UserRole::Viewer),
            "curator" => Ok(UserRole::Curator),
            "reviewer" => Ok(UserRole::Reviewer),
            "admin" => Ok(UserRole::Admin),
            "scope_admin" => Ok(UserRole::ScopeAdmin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: UserRole,
    #[serde(default)]
    pub assigned_scope_ids: Vec<Uuid>,
}

impl ActorContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role, assigned_scope_ids: Vec::new() }
    }

    pub fn with_scope(mut self, scope_id: Uuid) -> Self {
        if !self.assigned_scope_ids.contains(&scope_id) {
            self.assigned_scope_ids.push(scope_id);
        }
        self
    }

    pub fn has_scope(&self, scope_id: Uuid) -> bool {
        self.role.is_global_admin() || self.assigned_scope_ids.contains(&scope_id)
    }
}
