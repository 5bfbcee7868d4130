//! Decides whether a new member gets the configured role and a welcome DM.

use tracing::{error, info, warn};

use crate::config::{Config, ASSIGN_ROLE_REASON};
use crate::gateway::{AssignError, CommunityInfo, DmError, GuildGateway, Hierarchy, MemberInfo};

/// Why the welcome DM was not delivered after a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeSkip {
    /// The member does not accept direct messages.
    NoDm,
    SendFailed(String),
}

/// Result of evaluating one join event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    RoleMissing,
    PermissionDenied,
    HierarchyInsufficient,
    AssignmentForbidden,
    AssignmentFailed(String),
    AssignedWithWelcome,
    AssignedNoWelcomeRequested,
    AssignedWelcomeSkipped(WelcomeSkip),
}

impl JoinOutcome {
    /// True when the role ended up on the member, whatever happened to the DM.
    pub fn is_assigned(&self) -> bool {
        matches!(
            self,
            Self::AssignedWithWelcome
                | Self::AssignedNoWelcomeRequested
                | Self::AssignedWelcomeSkipped(_)
        )
    }
}

/// Fills `{member}`, `{guild}` and `{role}` in a welcome template.
///
/// The template is scanned once: inserted values are never rescanned, and any
/// other text (unknown placeholders included) is copied unchanged.
pub fn render_welcome(template: &str, member_mention: &str, guild_name: &str, role_name: &str) -> String {
    let placeholders = [
        ("{member}", member_mention),
        ("{guild}", guild_name),
        ("{role}", role_name),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match placeholders
            .iter()
            .find(|(placeholder, _)| candidate.starts_with(placeholder))
        {
            Some((placeholder, value)) => {
                rendered.push_str(value);
                rest = &candidate[placeholder.len()..];
            }
            None => {
                rendered.push('{');
                rest = &candidate[1..];
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

/// Runs the guard chain for a member who just joined `community`.
///
/// Guards short-circuit in a fixed order: role existence, permission,
/// hierarchy, assignment, welcome. Nothing is retried.
pub async fn on_member_join<G>(
    member: &MemberInfo,
    community: &CommunityInfo,
    config: &Config,
    gateway: &G,
) -> JoinOutcome
where
    G: GuildGateway + ?Sized,
{
    let role_name = config.role_name.as_str();

    info!(
        member = %member.tag,
        member_id = member.id,
        guild = %community.name,
        "New member joined"
    );

    let Some(role) = gateway.find_role_by_name(role_name) else {
        error!(
            role = role_name,
            guild = %community.name,
            "Role not found in guild. Please create this role or update the configuration."
        );
        return JoinOutcome::RoleMissing;
    };

    if !gateway.has_manage_roles_permission() {
        error!(guild = %community.name, "Bot lacks \"Manage Roles\" permission");
        return JoinOutcome::PermissionDenied;
    }

    // Equal rank is not enough: Discord only lets us manage roles strictly below ours.
    if gateway.compare_hierarchy(&role) != Hierarchy::Higher {
        error!(
            role = role_name,
            guild = %community.name,
            "Bot's highest role is not above the target role. Cannot assign role."
        );
        return JoinOutcome::HierarchyInsufficient;
    }

    match gateway.assign_role(member, &role, ASSIGN_ROLE_REASON).await {
        Ok(()) => {}
        Err(AssignError::Forbidden) => {
            error!(
                member = %member.tag,
                guild = %community.name,
                "Bot lacks permission to assign roles to member"
            );
            return JoinOutcome::AssignmentForbidden;
        }
        Err(AssignError::Transport(detail)) => {
            error!(
                member = %member.tag,
                error = %detail,
                "HTTP error occurred while assigning role"
            );
            return JoinOutcome::AssignmentFailed(detail);
        }
    }

    info!(
        role = role_name,
        member = %member.tag,
        guild = %community.name,
        "Successfully assigned role"
    );

    if !config.send_welcome_message {
        return JoinOutcome::AssignedNoWelcomeRequested;
    }

    let welcome = render_welcome(&config.welcome_message, &member.mention, &community.name, role_name);

    match gateway.send_direct_message(member, &welcome).await {
        Ok(()) => {
            info!(member = %member.tag, "Sent welcome message");
            JoinOutcome::AssignedWithWelcome
        }
        Err(DmError::DmsClosed) => {
            warn!(member = %member.tag, "Could not send welcome message - DMs disabled");
            JoinOutcome::AssignedWelcomeSkipped(WelcomeSkip::NoDm)
        }
        Err(DmError::Transport(detail)) => {
            error!(member = %member.tag, error = %detail, "Error sending welcome message");
            JoinOutcome::AssignedWelcomeSkipped(WelcomeSkip::SendFailed(detail))
        }
    }
}
