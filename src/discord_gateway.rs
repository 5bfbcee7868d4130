//! `GuildGateway` backed by the serenity cache and HTTP client.

use std::sync::Arc;

use serenity::all::{Context, Guild, GuildId, Http, Permissions, RoleId, UserId};
use serenity::async_trait;

use crate::gateway::{
    AssignError, CommunityInfo, DmError, GuildGateway, Hierarchy, MemberInfo, RoleInfo,
};
use crate::handlers::HandlerError;
use crate::messages;

const HTTP_FORBIDDEN: u16 = 403;

/// Guild data copied out of the cache so no cache lock is held across awaits.
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    pub community: CommunityInfo,
    pub owner_id: u64,
    /// Every role in the guild, `@everyone` included, with its permissions.
    pub roles: Vec<(RoleInfo, Permissions)>,
}

impl GuildSnapshot {
    pub fn from_guild(guild: &Guild) -> Self {
        let roles = guild
            .roles
            .values()
            .map(|role| {
                (
                    RoleInfo {
                        id: role.id.get(),
                        name: role.name.clone(),
                        position: role.position,
                    },
                    role.permissions,
                )
            })
            .collect();

        Self {
            community: CommunityInfo {
                id: guild.id.get(),
                name: guild.name.clone(),
            },
            owner_id: guild.owner_id.get(),
            roles,
        }
    }

    /// Reads the guild from the cache.
    pub fn from_cache(ctx: &Context, guild_id: GuildId) -> Result<Self, HandlerError> {
        ctx.cache
            .guild(guild_id)
            .map(|guild| Self::from_guild(&guild))
            .ok_or(HandlerError::GuildNotCached(guild_id.get()))
    }

    /// Exact, case-sensitive lookup.
    pub fn find_role_by_name(&self, name: &str) -> Option<&RoleInfo> {
        self.roles
            .iter()
            .map(|(role, _)| role)
            .find(|role| role.name == name)
    }

    /// The `@everyone` role shares the guild's id.
    fn everyone_role(&self) -> RoleInfo {
        self.roles
            .iter()
            .map(|(role, _)| role)
            .find(|role| role.id == self.community.id)
            .cloned()
            .unwrap_or_else(|| RoleInfo {
                id: self.community.id,
                name: "@everyone".to_string(),
                position: 0,
            })
    }

    /// Guild-level permissions of a user holding `role_ids`.
    pub fn permissions_for(&self, user_id: u64, role_ids: &[u64]) -> Permissions {
        if user_id == self.owner_id {
            return Permissions::all();
        }

        let permissions = self
            .roles
            .iter()
            .filter(|(role, _)| role.id == self.community.id || role_ids.contains(&role.id))
            .fold(Permissions::empty(), |acc, (_, permissions)| acc | *permissions);

        if permissions.contains(Permissions::ADMINISTRATOR) {
            Permissions::all()
        } else {
            permissions
        }
    }

    /// Highest-ranked role among `role_ids`, or `@everyone` if none of them is known.
    pub fn top_role(&self, role_ids: &[u64]) -> RoleInfo {
        self.roles
            .iter()
            .map(|(role, _)| role)
            .filter(|role| role_ids.contains(&role.id))
            .max_by(|a, b| a.rank_cmp(b))
            .cloned()
            .unwrap_or_else(|| self.everyone_role())
    }
}

/// Gateway for one guild, seen from the bot's own membership.
pub struct DiscordGateway {
    http: Arc<Http>,
    snapshot: GuildSnapshot,
    bot_permissions: Permissions,
    bot_top_role: RoleInfo,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, snapshot: GuildSnapshot, bot_id: u64, bot_role_ids: &[u64]) -> Self {
        let bot_permissions = snapshot.permissions_for(bot_id, bot_role_ids);
        let bot_top_role = snapshot.top_role(bot_role_ids);
        Self {
            http,
            snapshot,
            bot_permissions,
            bot_top_role,
        }
    }

    /// Builds the gateway for `guild_id`, fetching the bot's member record if it is not cached.
    pub async fn load(ctx: &Context, guild_id: GuildId) -> Result<Self, HandlerError> {
        let bot_id = ctx.cache.current_user().id;
        let snapshot = GuildSnapshot::from_cache(ctx, guild_id)?;

        let cached_roles = ctx.cache.guild(guild_id).and_then(|guild| {
            guild
                .members
                .get(&bot_id)
                .map(|member| member.roles.iter().map(|id| id.get()).collect::<Vec<_>>())
        });

        let bot_role_ids = match cached_roles {
            Some(roles) => roles,
            None => guild_id
                .member(&ctx.http, bot_id)
                .await?
                .roles
                .iter()
                .map(|id| id.get())
                .collect(),
        };

        Ok(Self::new(
            Arc::clone(&ctx.http),
            snapshot,
            bot_id.get(),
            &bot_role_ids,
        ))
    }

    pub fn community(&self) -> &CommunityInfo {
        &self.snapshot.community
    }
}

/// True when serenity reports an HTTP 403 from Discord.
fn is_forbidden(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(http_error) => http_error
            .status_code()
            .is_some_and(|status| status.as_u16() == HTTP_FORBIDDEN),
        _ => false,
    }
}

#[async_trait]
impl GuildGateway for DiscordGateway {
    fn find_role_by_name(&self, name: &str) -> Option<RoleInfo> {
        self.snapshot.find_role_by_name(name).cloned()
    }

    fn has_manage_roles_permission(&self) -> bool {
        self.bot_permissions.contains(Permissions::MANAGE_ROLES)
    }

    fn compare_hierarchy(&self, target: &RoleInfo) -> Hierarchy {
        self.bot_top_role.rank_cmp(target).into()
    }

    async fn assign_role(
        &self,
        member: &MemberInfo,
        role: &RoleInfo,
        reason: &str,
    ) -> Result<(), AssignError> {
        self.http
            .add_member_role(
                GuildId::new(self.snapshot.community.id),
                UserId::new(member.id),
                RoleId::new(role.id),
                Some(reason),
            )
            .await
            .map_err(|err| {
                if is_forbidden(&err) {
                    AssignError::Forbidden
                } else {
                    AssignError::Transport(err.to_string())
                }
            })
    }

    async fn send_direct_message(&self, member: &MemberInfo, text: &str) -> Result<(), DmError> {
        UserId::new(member.id)
            .direct_message(&self.http, messages::create_text_message(text))
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_forbidden(&err) {
                    DmError::DmsClosed
                } else {
                    DmError::Transport(err.to_string())
                }
            })
    }
}
