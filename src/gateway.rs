//! Capabilities the bot needs from Discord, bound to a single guild.

use std::cmp::Ordering;

use serenity::async_trait;

/// Role data consumed by the join policy and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: u64,
    pub name: String,
    pub position: u16,
}

impl RoleInfo {
    /// Orders roles the way Discord ranks them: higher position first, then the
    /// older (smaller) id wins a tie.
    pub fn rank_cmp(&self, other: &RoleInfo) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// The member who just joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub id: u64,
    /// Display identifier used in logs.
    pub tag: String,
    /// Mention handle, e.g. `<@123>`.
    pub mention: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityInfo {
    pub id: u64,
    pub name: String,
}

/// Bot's top role compared against a target role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy {
    Higher,
    Equal,
    Lower,
}

impl From<Ordering> for Hierarchy {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Self::Higher,
            Ordering::Equal => Self::Equal,
            Ordering::Less => Self::Lower,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("missing permissions to assign the role")]
    Forbidden,
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DmError {
    #[error("direct messages are closed")]
    DmsClosed,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Role, permission and messaging operations for one guild.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuildGateway: Send + Sync {
    /// Exact, case-sensitive role lookup.
    fn find_role_by_name(&self, name: &str) -> Option<RoleInfo>;

    /// Whether the bot holds `MANAGE_ROLES` in the guild.
    fn has_manage_roles_permission(&self) -> bool;

    /// Compares the bot's highest role with `target`.
    fn compare_hierarchy(&self, target: &RoleInfo) -> Hierarchy;

    async fn assign_role(
        &self,
        member: &MemberInfo,
        role: &RoleInfo,
        reason: &str,
    ) -> Result<(), AssignError>;

    async fn send_direct_message(&self, member: &MemberInfo, text: &str) -> Result<(), DmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, position: u16) -> RoleInfo {
        RoleInfo {
            id,
            name: format!("role{id}"),
            position,
        }
    }

    #[test]
    fn test_rank_by_position() {
        assert_eq!(Hierarchy::from(role(1, 5).rank_cmp(&role(2, 3))), Hierarchy::Higher);
        assert_eq!(Hierarchy::from(role(1, 3).rank_cmp(&role(2, 5))), Hierarchy::Lower);
    }

    #[test]
    fn test_rank_tie_broken_by_older_id() {
        assert_eq!(Hierarchy::from(role(1, 4).rank_cmp(&role(2, 4))), Hierarchy::Higher);
        assert_eq!(Hierarchy::from(role(2, 4).rank_cmp(&role(1, 4))), Hierarchy::Lower);
    }

    #[test]
    fn test_same_role_is_equal() {
        assert_eq!(Hierarchy::from(role(7, 4).rank_cmp(&role(7, 4))), Hierarchy::Equal);
    }
}
