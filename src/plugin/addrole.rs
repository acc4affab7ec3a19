use crate::{
    error::{user_input, StoreError},
    event::*,
    guild::GuildSnapshot,
    helper::MessageHelper,
    log_internal,
    logging::PrintColor,
    plugin::*,
    reconcile::{discord::RoleStore, EntityStore},
};
use anyhow::Result;

/// Gives a single member a single role
pub struct AddRole;

#[serenity::async_trait]
impl Plugin for AddRole {
    fn name(&self) -> &'static str {
        "addrole"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(usage_line(ctx, self.name(), "<role> <member>", "add a role to a member").await)
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let guild_id = msg.require_moderator(ctx).await?;

        let [role_name, member_name] = args.as_slice() else {
            return user_input("Usage: addrole <role> <member>.  Quote names with spaces.");
        };

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;
        let Some(role) = snapshot.role_named(role_name) else {
            return user_input(format!("Role '{}' not found.", role_name));
        };
        let Some(member) = snapshot.member_named(member_name) else {
            return user_input(format!("Member '{}' not found.", member_name));
        };

        let store = RoleStore {
            http: ctx.http.clone(),
            guild_id,
        };
        let reply = match store.add_member(role.id, member.user.id).await {
            Ok(()) => {
                log_internal!("Gave {} to {}", role_name.color(), member.user.color());
                format!("Role '{}' added to member '{}'.", role_name, member_name)
            }
            Err(StoreError::PermissionDenied(_)) => {
                "Bot lacks the required permissions to add roles.".to_owned()
            }
            Err(err) => format!("An error occurred: {}", err),
        };

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
