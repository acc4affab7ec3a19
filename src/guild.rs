//! A point-in-time view of one guild's roles, channels and members.
//!
//! The view goes stale as soon as it is fetched.  Commands fetch a fresh one per invocation and
//! accept that someone may change the guild underneath them.

use crate::{context::Context, error::user_input, reconcile::LiveEntity};
use anyhow::Result;
use serenity::all::{ChannelId, ChannelType, GuildChannel, GuildId, Member, Role, RoleId, UserId};
use std::collections::{HashMap, HashSet};

/// Discord caps member pages at this size.
const MEMBER_PAGE_SIZE: u64 = 1000;

pub struct GuildSnapshot {
    pub guild_id: GuildId,
    /// Sorted by position, lowest first.  Includes `@everyone`.
    pub roles: Vec<Role>,
    /// Sorted by position, lowest first.
    pub channels: Vec<GuildChannel>,
    pub members: Vec<Member>,
    /// Position of the bot's highest role.  Only roles strictly below it can be managed.
    pub ceiling: u16,
}

impl GuildSnapshot {
    pub async fn fetch(ctx: &Context<'_>, guild_id: GuildId) -> Result<Self> {
        let mut roles: Vec<Role> = guild_id.roles(ctx.http).await?.into_values().collect();
        roles.sort_by_key(|r| (r.position, r.id));

        let mut channels: Vec<GuildChannel> =
            guild_id.channels(ctx.http).await?.into_values().collect();
        channels.sort_by_key(|c| (c.position, c.id));

        let mut members = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = guild_id
                .members(ctx.http, Some(MEMBER_PAGE_SIZE), after)
                .await?;
            let full = page.len() as u64 == MEMBER_PAGE_SIZE;
            after = page.last().map(|m| m.user.id);
            members.extend(page);
            if !full {
                break;
            }
        }

        let bot_id = ctx.cache.current_user().id;
        let ceiling = members
            .iter()
            .find(|m| m.user.id == bot_id)
            .map(|bot| highest_position(&roles, &bot.roles))
            .unwrap_or(0);

        Ok(Self {
            guild_id,
            roles,
            channels,
            members,
            ceiling,
        })
    }

    /// Whether the bot may touch this role at all.
    pub fn is_manageable(&self, role: &Role) -> bool {
        role.position < self.ceiling && role.id.get() != self.guild_id.get()
    }

    /// Roles strictly below the bot's highest role, `@everyone` excluded.
    pub fn roles_below_ceiling(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|r| self.is_manageable(r))
    }

    /// A role with this exact name that exists but is out of the bot's reach.
    pub fn role_above_ceiling(&self, name: &str) -> Option<&Role> {
        self.roles
            .iter()
            .find(|r| r.name == name && !self.is_manageable(r))
    }

    pub fn role_named(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn holders(&self, role_id: RoleId) -> HashSet<UserId> {
        self.members
            .iter()
            .filter(|m| m.roles.contains(&role_id))
            .map(|m| m.user.id)
            .collect()
    }

    pub fn member_named(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user.name == name)
    }

    /// User name to id, for resolving names typed in a list.
    pub fn directory(&self) -> HashMap<String, UserId> {
        self.members
            .iter()
            .map(|m| (m.user.name.clone(), m.user.id))
            .collect()
    }

    /// Manageable roles as reconciler entities.  Position 0 is the lowest role above `@everyone`.
    pub fn live_roles(&self) -> Vec<LiveEntity<RoleId>> {
        self.roles_below_ceiling()
            .map(|role| LiveEntity {
                id: role.id,
                name: role.name.clone(),
                position: usize::from(role.position.saturating_sub(1)),
                members: self.holders(role.id),
            })
            .collect()
    }

    pub fn category_named(&self, name: &str) -> Result<&GuildChannel> {
        match self
            .channels
            .iter()
            .find(|c| c.kind == ChannelType::Category && c.name == name)
        {
            Some(category) => Ok(category),
            None => user_input(format!("Category '{}' not found.", name)),
        }
    }

    pub fn channels_in(&self, category: ChannelId) -> impl Iterator<Item = &GuildChannel> {
        self.channels
            .iter()
            .filter(move |c| c.parent_id == Some(category))
    }

    pub fn live_channels(&self, category: ChannelId) -> Vec<LiveEntity<ChannelId>> {
        self.channels_in(category).map(live_channel).collect()
    }

    /// Every non-category channel.  Renames are not limited to one category.
    pub fn live_all_channels(&self) -> Vec<LiveEntity<ChannelId>> {
        self.channels
            .iter()
            .filter(|c| c.kind != ChannelType::Category)
            .map(live_channel)
            .collect()
    }

    pub fn category_name(&self, channel: &GuildChannel) -> Option<&str> {
        let parent = channel.parent_id?;
        self.channels
            .iter()
            .find(|c| c.id == parent)
            .map(|c| c.name.as_str())
    }
}

fn live_channel(channel: &GuildChannel) -> LiveEntity<ChannelId> {
    LiveEntity {
        id: channel.id,
        name: channel.name.clone(),
        position: usize::from(channel.position),
        members: HashSet::new(),
    }
}

fn highest_position(roles: &[Role], held: &[RoleId]) -> u16 {
    roles
        .iter()
        .filter(|r| held.contains(&r.id))
        .map(|r| r.position)
        .max()
        .unwrap_or(0)
}
