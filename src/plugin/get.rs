use crate::{
    error::user_input, event::*, guild::GuildSnapshot, helper::MessageHelper, plugin::*,
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelType, Member, Message};

const ROLES_FILE_NAME: &str = "roles_below_bot.csv";

/// Read-only listings of channels, roles and members
pub struct Get;

#[serenity::async_trait]
impl Plugin for Get {
    fn name(&self) -> &'static str {
        "get"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "<channel|role|members> <category|contains|all|role> [value]",
                "list channels, roles below the bot (as CSV) or members",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let guild_id = msg.require_moderator(ctx).await?;

        let item = args.first().map(String::as_str).unwrap_or_default();
        let filter = args.get(1).map(String::as_str).unwrap_or_default();
        let value = args.get(2..).unwrap_or_default().join(" ");

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;
        match item {
            "channel" => get_channels(ctx, msg, &snapshot, filter, &value).await?,
            "role" => get_roles(ctx, msg, &snapshot, filter, &value).await?,
            "members" => get_members(ctx, msg, &snapshot, filter, &value).await?,
            _ => return user_input("Invalid item type. Use 'channel', 'role' or 'members'."),
        }
        Ok(EventHandled::Yes)
    }
}

fn require_value<'a>(filter: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return user_input(format!("The `{}` filter needs a value.", filter));
    }
    Ok(value)
}

async fn get_channels(
    ctx: &Context<'_>,
    msg: &Message,
    snapshot: &GuildSnapshot,
    filter: &str,
    value: &str,
) -> Result<()> {
    let reply = match filter {
        "category" => {
            let name = require_value(filter, value)?;
            let category = snapshot.category_named(name)?;
            let lines: Vec<String> = snapshot
                .channels_in(category.id)
                .map(|c| format!("#{}", c.name))
                .collect();
            format!(
                "Channels in category {}:\n```\n{}\n```",
                category.name,
                lines.join("\n")
            )
        }
        "contains" | "all" => {
            let needle = if filter == "all" {
                ""
            } else {
                require_value(filter, value)?
            };
            let channels = snapshot
                .channels
                .iter()
                .filter(|c| c.kind != ChannelType::Category && c.name.contains(needle))
                .map(|c| {
                    (
                        snapshot.category_name(c).unwrap_or("No Category"),
                        c.name.as_str(),
                    )
                });
            let grouped = group_by_category(channels);
            if grouped.is_empty() {
                format!("No channels found containing '{}'.", needle)
            } else {
                grouped
            }
        }
        _ => return user_input("Invalid filter type. Use 'category', 'contains' or 'all'."),
    };

    msg.reply_chunked(ctx, &reply).await
}

async fn get_roles(
    ctx: &Context<'_>,
    msg: &Message,
    snapshot: &GuildSnapshot,
    filter: &str,
    value: &str,
) -> Result<()> {
    let needle = match filter {
        "all" => "",
        "contains" => require_value(filter, value)?,
        _ => return user_input("Invalid filter type. Use 'contains' or 'all'."),
    };

    let rows: Vec<Vec<String>> = snapshot
        .roles_below_ceiling()
        .filter(|role| role.name.contains(needle))
        .map(|role| {
            let mut row = vec![role.name.clone()];
            row.extend(
                snapshot
                    .members
                    .iter()
                    .filter(|m| m.roles.contains(&role.id))
                    .map(|m| m.user.name.clone()),
            );
            row
        })
        .collect();

    if rows.is_empty() {
        msg.reply(
            ctx.cache_http,
            "No roles found below the bot's role with the specified filter.",
        )
        .await?;
        return Ok(());
    }

    msg.reply_with_file(
        ctx,
        "Here are the roles below the bot:",
        ROLES_FILE_NAME,
        roles_csv(&rows)?,
    )
    .await
}

async fn get_members(
    ctx: &Context<'_>,
    msg: &Message,
    snapshot: &GuildSnapshot,
    filter: &str,
    value: &str,
) -> Result<()> {
    let reply = match filter {
        "role" => {
            let name = require_value(filter, value)?;
            let Some(role) = snapshot.role_named(name) else {
                return user_input(format!("Role '{}' not found.", name));
            };
            let holders: Vec<&Member> = snapshot
                .members
                .iter()
                .filter(|m| m.roles.contains(&role.id))
                .collect();
            if holders.is_empty() {
                format!("Nobody has the role '{}'.", name)
            } else {
                member_lines(&holders)
            }
        }
        "contains" => {
            let needle = require_value(filter, value)?;
            let found: Vec<&Member> = snapshot
                .members
                .iter()
                .filter(|m| m.user.name.contains(needle))
                .collect();
            if found.is_empty() {
                format!("No members found with name containing '{}'.", needle)
            } else {
                member_lines(&found)
            }
        }
        "all" => member_lines(&snapshot.members.iter().collect::<Vec<_>>()),
        _ => return user_input("Invalid filter type. Use 'role', 'contains' or 'all'."),
    };

    msg.reply_chunked(ctx, &reply).await
}

/// `name id` per member.
fn member_lines(members: &[&Member]) -> String {
    members
        .iter()
        .map(|m| format!("{} {}", m.user.name, m.user.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(category, channel)` pairs in position order, to one fenced block per category.
fn group_by_category<'a>(channels: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for (category, channel) in channels {
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, names)) => names.push(channel),
            None => groups.push((category, vec![channel])),
        }
    }

    groups
        .iter()
        .map(|(category, names)| format!("{}\n```\n{}\n```", category, names.join("\n")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn roles_csv(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Could not write role listing: {}", e))
}
