//! Callers of the engine and the roles they hold.

use super::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an actor holds for the operation it proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Portal visitor or requester without staff privileges.
    Public,
    /// Support staff member.
    Staff,
    /// Administrator.
    Admin,
    /// The engine itself, acting for the recurrence scheduler.
    System,
}

impl ActorRole {
    /// Returns whether the role may drive transitions and create tasks.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Staff | Self::Admin | Self::System)
    }

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated (or anonymous) caller of an engine operation.
///
/// Built only through the role constructors; the system actor is reserved
/// for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Actor {
    id: Option<ActorId>,
    role: ActorRole,
}

impl Actor {
    /// An unauthenticated portal visitor.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            id: None,
            role: ActorRole::Public,
        }
    }

    /// An authenticated requester without staff privileges.
    #[must_use]
    pub const fn requester(id: ActorId) -> Self {
        Self {
            id: Some(id),
            role: ActorRole::Public,
        }
    }

    /// A support staff member.
    #[must_use]
    pub const fn staff(id: ActorId) -> Self {
        Self {
            id: Some(id),
            role: ActorRole::Staff,
        }
    }

    /// An administrator.
    #[must_use]
    pub const fn admin(id: ActorId) -> Self {
        Self {
            id: Some(id),
            role: ActorRole::Admin,
        }
    }

    /// The engine acting on its own behalf; history rows record no actor.
    #[must_use]
    pub(crate) const fn system() -> Self {
        Self {
            id: None,
            role: ActorRole::System,
        }
    }

    /// Returns the actor identity, if known.
    #[must_use]
    pub const fn id(&self) -> Option<ActorId> {
        self.id
    }

    /// Returns the actor role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }
}
