//! Gateway event handlers.

use serenity::all::{Context, Guild, GuildId, Mentionable, Member, Message, Permissions, Ready};
use tracing::{debug, error, info, warn};

use crate::commands::{self, Command};
use crate::config::Config;
use crate::diagnostics::{self, Authorization, CommandReply};
use crate::discord_gateway::{DiscordGateway, GuildSnapshot};
use crate::gateway::MemberInfo;
use crate::join_policy;
use crate::messages;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("guild {0} is not in the cache")]
    GuildNotCached(u64),
    #[error("discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Logs a failed event at the outermost boundary of its handler.
pub fn report_event_error(event: &str, err: &HandlerError) {
    error!(event, error = %err, "An error occurred in event");
}

/// Logs the bot user and the guilds it serves.
pub fn handle_ready(ctx: &Context, ready: &Ready) {
    info!("{} has connected to Discord!", ready.user.name);
    info!("Bot is ready and serving {} guild(s)", ready.guilds.len());

    for unavailable in &ready.guilds {
        let name = ctx.cache.guild(unavailable.id).map(|guild| guild.name.clone());
        match name {
            Some(name) => info!(guild_id = unavailable.id.get(), "Connected to guild: {name}"),
            None => info!(guild_id = unavailable.id.get(), "Connected to guild"),
        }
    }
}

/// Runs the join policy for a member who just joined.
pub async fn handle_member_join(
    ctx: &Context,
    config: &Config,
    new_member: &Member,
) -> Result<(), HandlerError> {
    let gateway = DiscordGateway::load(ctx, new_member.guild_id).await?;

    let member = MemberInfo {
        id: new_member.user.id.get(),
        tag: new_member.user.tag(),
        mention: new_member.mention().to_string(),
    };

    let outcome = join_policy::on_member_join(&member, gateway.community(), config, &gateway).await;
    debug!(?outcome, assigned = outcome.is_assigned(), member = %member.tag, "Join event evaluated");

    Ok(())
}

/// Logs a guild the bot was just added to and whether the configured role exists there.
pub fn handle_guild_join(config: &Config, guild: &Guild) {
    info!(guild_id = guild.id.get(), "Bot joined new guild: {}", guild.name);

    let snapshot = GuildSnapshot::from_guild(guild);
    if snapshot.find_role_by_name(&config.role_name).is_some() {
        info!(role = %config.role_name, guild = %guild.name, "Role found in guild");
    } else {
        warn!(
            role = %config.role_name,
            guild = %guild.name,
            "Role not found in new guild. Please create this role."
        );
    }
}

/// Dispatches prefix commands.
pub async fn handle_message(
    ctx: &Context,
    config: &Config,
    msg: &Message,
) -> Result<(), HandlerError> {
    if msg.author.bot {
        return Ok(());
    }

    let Some(command) = commands::parse(&msg.content, &config.command_prefix) else {
        return Ok(());
    };

    match command {
        Command::CheckPermissions => handle_check_permissions(ctx, config, msg).await,
    }
}

async fn handle_check_permissions(
    ctx: &Context,
    config: &Config,
    msg: &Message,
) -> Result<(), HandlerError> {
    let Some(guild_id) = msg.guild_id else {
        msg.channel_id
            .say(&ctx.http, diagnostics::GUILD_ONLY_MESSAGE)
            .await?;
        return Ok(());
    };

    let reply = match run_check_permissions(ctx, config, msg, guild_id).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %err, "Error in check_permissions command");
            msg.channel_id
                .say(&ctx.http, diagnostics::FAILURE_MESSAGE)
                .await?;
            return Ok(());
        }
    };

    match reply {
        CommandReply::Denied(text) => {
            info!(user = %msg.author.tag(), "Denied check_permissions to non-administrator");
            msg.channel_id.say(&ctx.http, text).await?;
        }
        CommandReply::Report(report) => {
            msg.channel_id
                .send_message(&ctx.http, messages::create_permission_report_message(&report))
                .await?;
        }
    }

    Ok(())
}

async fn run_check_permissions(
    ctx: &Context,
    config: &Config,
    msg: &Message,
    guild_id: GuildId,
) -> Result<CommandReply, HandlerError> {
    let snapshot = GuildSnapshot::from_cache(ctx, guild_id)?;
    let invoker_roles: Vec<u64> = match &msg.member {
        Some(member) => member.roles.iter().map(|id| id.get()).collect(),
        None => guild_id
            .member(&ctx.http, msg.author.id)
            .await?
            .roles
            .iter()
            .map(|id| id.get())
            .collect(),
    };

    let authorization = if snapshot
        .permissions_for(msg.author.id.get(), &invoker_roles)
        .contains(Permissions::ADMINISTRATOR)
    {
        Authorization::Administrator
    } else {
        Authorization::Missing
    };

    diagnostics::run_check_permissions(authorization, config, || {
        DiscordGateway::load(ctx, guild_id)
    })
    .await
}
