use crate::{
    event::*,
    guild::GuildSnapshot,
    helper::MessageHelper,
    parse,
    plugin::*,
    reconcile::{
        apply_operations,
        discord::{ChannelStore, RoleStore},
        plan_renames, Operation,
    },
};
use anyhow::Result;

/// Renames channels and roles from `old,new` lines
pub struct Rename;

#[serenity::async_trait]
impl Plugin for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "[message-id]",
                "rename channels and roles listed as `old,new` per line",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let guild_id = msg.require_moderator(ctx).await?;
        let list = msg.referenced(ctx, args.first().map(String::as_str)).await?;
        let pairs = parse::rename_pairs(&list.content)?;

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;
        let channel_ops = plan_renames(&pairs, &snapshot.live_all_channels());
        let role_ops = plan_renames(&pairs, &snapshot.live_roles());
        let unreachable: Vec<&str> = pairs
            .iter()
            .filter(|(old, _)| {
                snapshot.role_above_ceiling(old).is_some()
                    && !role_ops.iter().any(|op| matches!(op, Operation::Rename { from, .. } if from.trim() == old.as_str()))
            })
            .map(|(old, _)| old.as_str())
            .collect();

        if channel_ops.is_empty() && role_ops.is_empty() && unreachable.is_empty() {
            msg.reply(
                ctx.cache_http,
                "No matching channels or roles found to rename.",
            )
            .await?;
            return Ok(EventHandled::Yes);
        }

        let mut reply = String::from("Renamed the following items:\n");
        if !channel_ops.is_empty() {
            let store = ChannelStore {
                http: ctx.http.clone(),
                guild_id,
                category: None,
            };
            let report = apply_operations(channel_ops, &store).await;
            reply.push_str(&format!("Channels:\n{}\n", report.summary()));
        }
        if !role_ops.is_empty() || !unreachable.is_empty() {
            let store = RoleStore {
                http: ctx.http.clone(),
                guild_id,
            };
            let mut report = apply_operations(role_ops, &store).await;
            for old in unreachable {
                report.warn(format!(
                    "role `{}` is at or above my highest role; not renamed",
                    old
                ));
            }
            reply.push_str(&format!("Roles:\n{}\n", report.summary()));
        }

        msg.reply_chunked(ctx, &reply).await?;
        Ok(EventHandled::Yes)
    }
}
