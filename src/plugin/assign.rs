use crate::{
    event::*,
    guild::GuildSnapshot,
    helper::MessageHelper,
    log_internal,
    logging::PrintColor,
    parse,
    plugin::*,
    reconcile::{
        apply_operations, discord::RoleStore, plan_membership, LiveEntity, Operation, Outcome,
        Report,
    },
};
use anyhow::Result;
use serenity::all::RoleId;
use std::collections::{HashMap, HashSet};

/// Makes role membership match `role, member, member, ...` rows
pub struct Assign;

#[serenity::async_trait]
impl Plugin for Assign {
    fn name(&self) -> &'static str {
        "assign"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "[message-id]",
                "set role members from `role, member, ...` rows (mentions or user names)",
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
        let rows = parse::assignment_rows(&list.content)?;

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;
        let directory = snapshot.directory();
        let mut roles: HashMap<String, LiveEntity<RoleId>> = snapshot
            .live_roles()
            .into_iter()
            .map(|role| (role.name.clone(), role))
            .collect();

        let store = RoleStore {
            http: ctx.http.clone(),
            guild_id,
        };
        let mut report = Report::new();

        for row in rows {
            if !roles.contains_key(&row.name) {
                if snapshot.role_above_ceiling(&row.name).is_some() {
                    report.warn(format!(
                        "`{}` is at or above my highest role; skipped",
                        row.name
                    ));
                    continue;
                }
                let created = apply_operations(
                    vec![Operation::Create {
                        name: row.name.clone(),
                        position: None,
                    }],
                    &store,
                )
                .await;
                let id = match created.entries.first() {
                    Some((_, Outcome::Created(id))) => Some(*id),
                    _ => None,
                };
                report.extend(created);
                let Some(id) = id else {
                    continue;
                };
                roles.insert(
                    row.name.clone(),
                    LiveEntity {
                        id,
                        name: row.name.clone(),
                        position: 0,
                        members: HashSet::new(),
                    },
                );
            }
            let Some(role) = roles.get_mut(&row.name) else {
                continue;
            };

            let plan = plan_membership(&row, role, &directory);
            for token in &plan.unresolved {
                report.warn(format!(
                    "`{}` in the `{}` row matched no member",
                    token, row.name
                ));
            }
            log_internal!(
                "Assigning {}: +{} -{}",
                row.name.color(),
                plan.to_add.len(),
                plan.to_remove.len()
            );

            let applied = apply_operations(plan.operations(role.id, &role.name), &store).await;
            // Later rows for the same role diff against what this row achieved.
            for (op, outcome) in &applied.entries {
                match (op, outcome.is_success()) {
                    (Operation::AddMember { member, .. }, true) => {
                        role.members.insert(*member);
                    }
                    (Operation::RemoveMember { member, .. }, true) => {
                        role.members.remove(member);
                    }
                    _ => {}
                }
            }
            report.extend(applied);
        }

        msg.reply_chunked(
            ctx,
            &format!("Roles have been updated.\n{}", report.summary()),
        )
        .await?;
        Ok(EventHandled::Yes)
    }
}
