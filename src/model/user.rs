//! Users and roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::UserId;

/// Site-wide role held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    EditorInChief,
    Editor,
    Artist,
    TestsolveCoordinator,
    Staff,
}

/// Roles attached to a user, resolved once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: Role) -> Self {
        self.0.insert(role);
        self
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-puzzle role, distinct from site roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleRole {
    Author,
    Editor,
    Postprodder,
    Factchecker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    /// May be empty; users without an email never receive mail.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: RoleSet,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: String::new(),
            email: String::new(),
            roles: RoleSet::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles = self.roles.with(role);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_eic(&self) -> bool {
        self.has_role(Role::EditorInChief)
    }

    pub fn is_editor(&self) -> bool {
        self.has_role(Role::Editor)
    }

    pub fn is_testsolve_coordinator(&self) -> bool {
        self.has_role(Role::TestsolveCoordinator)
    }

    /// Email address, if non-empty.
    pub fn email(&self) -> Option<&str> {
        Some(self.email.trim()).filter(|e| !e.is_empty())
    }

    /// Name shown in the UI.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    /// Hat glyph shown next to the name.
    pub fn hat(&self) -> &'static str {
        if self.is_eic() {
            "🎩"
        } else if self.is_editor() {
            "👒"
        } else if self.has_role(Role::Staff) {
            "🧢"
        } else {
            ""
        }
    }
}
