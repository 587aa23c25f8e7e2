//! # Caller Context
//!
//! Every mutating store operation receives the identity of whoever asked for
//! it. There are no request-scoped globals: web layers build a
//! `CallerContext` from their session, background jobs use
//! `CallerContext::agent()`.

use serde::{Deserialize, Serialize};

use crate::term::Iri;

/// Roles that grant blanket edit rights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Editor,
    Publisher,
    /// Any other role; carries no edit rights.
    Member,
}

impl Role {
    /// Returns true if this role may retire or revise anyone's work.
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::Editor | Role::Publisher)
    }
}

/// Who is calling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
    /// Autonomous processes (inferencers, importers, the scheduler).
    Agent,
    /// No authenticated identity.
    Anonymous,
    /// An authenticated user.
    User { identifier: Iri, roles: Vec<Role> },
}

/// Identity passed explicitly into manager operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub caller: Caller,
}

impl CallerContext {
    /// Context for autonomous processes.
    pub fn agent() -> Self {
        Self {
            caller: Caller::Agent,
        }
    }

    /// Context for unauthenticated callers.
    pub fn anonymous() -> Self {
        Self {
            caller: Caller::Anonymous,
        }
    }

    /// Context for an authenticated user.
    pub fn user(identifier: impl Into<Iri>, roles: Vec<Role>) -> Self {
        Self {
            caller: Caller::User {
                identifier: identifier.into(),
                roles,
            },
        }
    }

    /// The user identifier, if any.
    pub fn identifier(&self) -> Option<&Iri> {
        match &self.caller {
            Caller::User { identifier, .. } => Some(identifier),
            _ => None,
        }
    }

    /// Decide whether this caller may edit a unit whose pubinfo lists the
    /// given contributors.
    pub fn can_edit(&self, contributors: &[Iri]) -> bool {
        match &self.caller {
            Caller::Agent => true,
            Caller::Anonymous => false,
            Caller::User { identifier, roles } => {
                roles.iter().any(Role::can_edit) || contributors.contains(identifier)
            }
        }
    }
}

impl Default for CallerContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_edits_anything() {
        assert!(CallerContext::agent().can_edit(&[]));
    }

    #[test]
    fn test_anonymous_edits_nothing() {
        let someone = Iri::new("http://ex.org/user/1");
        assert!(!CallerContext::anonymous().can_edit(&[someone]));
    }

    #[test]
    fn test_user_edits_own_contributions() {
        let me = Iri::new("http://ex.org/user/me");
        let ctx = CallerContext::user(me.clone(), vec![Role::Member]);
        assert!(ctx.can_edit(&[me]));
        assert!(!ctx.can_edit(&[Iri::new("http://ex.org/user/other")]));
    }

    #[test]
    fn test_editor_role_edits_anything() {
        let ctx = CallerContext::user("http://ex.org/user/ed", vec![Role::Editor]);
        assert!(ctx.can_edit(&[]));
    }
}
