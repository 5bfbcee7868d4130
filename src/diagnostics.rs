//! Admin-only `check_permissions` report.

use std::future::Future;

use crate::config::Config;
use crate::gateway::{GuildGateway, Hierarchy};

pub const REPORT_TITLE: &str = "Bot Permission Check";
pub const DENIED_MESSAGE: &str = "❌ You need Administrator permissions to use this command.";
pub const FAILURE_MESSAGE: &str = "❌ An error occurred while checking permissions.";
pub const GUILD_ONLY_MESSAGE: &str = "This command can only be used in a server.";

/// Whether the invoker may run admin commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Administrator,
    Missing,
}

/// Findings of a permission check. `hierarchy_ok` is `None` when the role is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    pub role_name: String,
    pub role_exists: bool,
    pub manage_roles: bool,
    pub hierarchy_ok: Option<bool>,
}

impl PermissionReport {
    /// Labeled fields in display order.
    pub fn fields(&self) -> Vec<(String, String)> {
        let role = if self.role_exists {
            "✅ Exists"
        } else {
            "❌ Not Found"
        };
        let manage_roles = if self.manage_roles { "✅ Yes" } else { "❌ No" };
        let hierarchy = match self.hierarchy_ok {
            Some(true) => "✅ Bot role is higher",
            Some(false) => "❌ Bot role is not higher",
            None => "❓ Cannot check (role missing)",
        };

        vec![
            (format!("Role \"{}\"", self.role_name), role.to_string()),
            ("Manage Roles Permission".to_string(), manage_roles.to_string()),
            ("Role Hierarchy".to_string(), hierarchy.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Denied(&'static str),
    Report(PermissionReport),
}

/// Computes the three findings independently. Nothing is mutated.
pub fn check_permissions<G>(gateway: &G, config: &Config) -> PermissionReport
where
    G: GuildGateway + ?Sized,
{
    let role = gateway.find_role_by_name(&config.role_name);
    let manage_roles = gateway.has_manage_roles_permission();
    let hierarchy_ok = role
        .as_ref()
        .map(|role| gateway.compare_hierarchy(role) == Hierarchy::Higher);

    PermissionReport {
        role_name: config.role_name.clone(),
        role_exists: role.is_some(),
        manage_roles,
        hierarchy_ok,
    }
}

/// Runs the check for administrators only; anyone else gets the denial text.
///
/// The gateway is only loaded once the invoker has been authorized.
pub async fn run_check_permissions<G, E, F, Fut>(
    authorization: Authorization,
    config: &Config,
    load_gateway: F,
) -> Result<CommandReply, E>
where
    G: GuildGateway,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<G, E>>,
{
    if authorization == Authorization::Missing {
        return Ok(CommandReply::Denied(DENIED_MESSAGE));
    }

    let gateway = load_gateway().await?;
    Ok(CommandReply::Report(check_permissions(&gateway, config)))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::Config;
    use crate::gateway::{MockGuildGateway, RoleInfo};
    use crate::handlers::HandlerError;

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn member_role() -> RoleInfo {
        RoleInfo {
            id: 100,
            name: "member".to_string(),
            position: 1,
        }
    }

    #[tokio::test]
    async fn test_non_admin_is_denied_without_loading_gateway() {
        let loaded = Cell::new(false);

        let reply = run_check_permissions(Authorization::Missing, &config(), || {
            loaded.set(true);
            async { Ok::<_, HandlerError>(MockGuildGateway::new()) }
        })
        .await
        .unwrap();

        assert_eq!(reply, CommandReply::Denied(DENIED_MESSAGE));
        assert!(!loaded.get());
    }

    #[tokio::test]
    async fn test_non_admin_is_denied_even_if_loading_would_fail() {
        let reply = run_check_permissions(Authorization::Missing, &config(), || async {
            Err::<MockGuildGateway, _>(HandlerError::GuildNotCached(1))
        })
        .await
        .unwrap();

        assert_eq!(reply, CommandReply::Denied(DENIED_MESSAGE));
    }

    #[tokio::test]
    async fn test_admin_load_failure_is_returned() {
        let reply = run_check_permissions(Authorization::Administrator, &config(), || async {
            Err::<MockGuildGateway, _>(HandlerError::GuildNotCached(1))
        })
        .await;

        assert!(matches!(reply, Err(HandlerError::GuildNotCached(1))));
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let mut gateway = MockGuildGateway::new();
        gateway
            .expect_find_role_by_name()
            .return_const(Some(member_role()));
        gateway.expect_has_manage_roles_permission().return_const(true);
        gateway.expect_compare_hierarchy().return_const(Hierarchy::Higher);

        let reply = run_check_permissions(Authorization::Administrator, &config(), move || async move {
            Ok::<_, HandlerError>(gateway)
        })
        .await
        .unwrap();

        let CommandReply::Report(report) = reply else {
            panic!("Expected report");
        };
        assert_eq!(
            report.fields(),
            vec![
                ("Role \"member\"".to_string(), "✅ Exists".to_string()),
                ("Manage Roles Permission".to_string(), "✅ Yes".to_string()),
                ("Role Hierarchy".to_string(), "✅ Bot role is higher".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_role_makes_hierarchy_indeterminate() {
        let mut gateway = MockGuildGateway::new();
        gateway.expect_find_role_by_name().return_const(None::<RoleInfo>);
        gateway.expect_has_manage_roles_permission().return_const(false);
        gateway.expect_compare_hierarchy().never();

        let report = check_permissions(&gateway, &config());

        assert_eq!(
            report,
            PermissionReport {
                role_name: "member".to_string(),
                role_exists: false,
                manage_roles: false,
                hierarchy_ok: None,
            }
        );
        assert_eq!(report.fields()[0].1, "❌ Not Found");
        assert_eq!(report.fields()[1].1, "❌ No");
        assert_eq!(report.fields()[2].1, "❓ Cannot check (role missing)");
    }

    #[test]
    fn test_equal_rank_reported_as_not_higher() {
        let mut gateway = MockGuildGateway::new();
        gateway
            .expect_find_role_by_name()
            .return_const(Some(member_role()));
        gateway.expect_has_manage_roles_permission().return_const(true);
        gateway.expect_compare_hierarchy().return_const(Hierarchy::Equal);

        let report = check_permissions(&gateway, &config());

        assert_eq!(report.hierarchy_ok, Some(false));
        assert_eq!(report.fields()[2].1, "❌ Bot role is not higher");
    }
}
