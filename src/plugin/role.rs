use crate::{
    error::user_input,
    event::*,
    guild::GuildSnapshot,
    helper::MessageHelper,
    log_internal,
    logging::AsyncPrintColor,
    parse,
    plugin::*,
    reconcile::{apply_operations, discord::RoleStore, plan_order, verify_order, DesiredEntry},
};
use anyhow::Result;

/// Orders the roles below the bot to match a list, creating the missing ones
pub struct Role;

#[serenity::async_trait]
impl Plugin for Role {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "[message-id]",
                "order roles (lowest first) as listed one per line, creating missing ones",
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
        let listed = parse::ordered_names(&list.content)?;

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;

        // A name that belongs to a role above the bot is neither moved nor duplicated.
        let mut warnings = Vec::new();
        let desired: Vec<DesiredEntry> = listed
            .into_iter()
            .filter(|entry| {
                let out_of_reach = snapshot.role_above_ceiling(&entry.name).is_some()
                    && !snapshot
                        .roles_below_ceiling()
                        .any(|r| r.name == entry.name);
                if out_of_reach {
                    warnings.push(format!(
                        "`{}` is at or above my highest role; skipped",
                        entry.name
                    ));
                }
                !out_of_reach
            })
            .collect();
        if desired.is_empty() {
            return user_input("None of the listed roles are below my highest role.");
        }

        log_internal!(
            "Ordering {} role(s) in {}",
            desired.len(),
            msg.guild_id.color(ctx.http).await
        );

        let store = RoleStore {
            http: ctx.http.clone(),
            guild_id,
        };
        let ops = plan_order(&desired, &snapshot.live_roles());
        let mut report = apply_operations(ops, &store).await;
        for warning in warnings {
            report.warn(warning);
        }

        match GuildSnapshot::fetch(ctx, guild_id).await {
            Ok(after) => {
                for mismatch in verify_order(&desired, &after.live_roles()) {
                    report.warn(format!("after the update, {}", mismatch));
                }
            }
            Err(e) => report.warn(format!("could not re-check the result: {}", e)),
        }

        msg.reply_chunked(ctx, &format!("Role order updated.\n{}", report.summary()))
            .await?;
        Ok(EventHandled::Yes)
    }
}
