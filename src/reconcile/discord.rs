//! Stores backed by the Discord API.

use super::EntityStore;
use crate::error::StoreError;
use serenity::all::{
    ChannelId, ChannelType, CreateChannel, EditChannel, EditRole, GuildId, Http, RoleId, UserId,
};
use std::sync::Arc;

const AUDIT_LOG_REASON: &str = "rosterbot reconciliation";

/// Discord positions are u16.  Anything past that cannot be expressed anyway.
fn discord_position(position: usize) -> u16 {
    u16::try_from(position).unwrap_or(u16::MAX)
}

/// Roles of one guild.
///
/// Reconciler position `n` is Discord position `n + 1`, since `@everyone` permanently holds 0.
pub struct RoleStore {
    pub http: Arc<Http>,
    pub guild_id: GuildId,
}

#[serenity::async_trait]
impl EntityStore for RoleStore {
    type Id = RoleId;

    fn kind(&self) -> &'static str {
        "role"
    }

    async fn create(&self, name: &str) -> Result<RoleId, StoreError> {
        let role = self
            .guild_id
            .create_role(&self.http, EditRole::new().name(name))
            .await?;
        Ok(role.id)
    }

    async fn move_to(&self, id: RoleId, position: usize) -> Result<(), StoreError> {
        self.guild_id
            .edit_role_position(&self.http, id, discord_position(position + 1))
            .await?;
        Ok(())
    }

    async fn rename(&self, id: RoleId, name: &str) -> Result<(), StoreError> {
        self.guild_id
            .edit_role(&self.http, id, EditRole::new().name(name))
            .await?;
        Ok(())
    }

    async fn add_member(&self, id: RoleId, member: UserId) -> Result<(), StoreError> {
        self.http
            .add_member_role(self.guild_id, member, id, Some(AUDIT_LOG_REASON))
            .await?;
        Ok(())
    }

    async fn remove_member(&self, id: RoleId, member: UserId) -> Result<(), StoreError> {
        self.http
            .remove_member_role(self.guild_id, member, id, Some(AUDIT_LOG_REASON))
            .await?;
        Ok(())
    }
}

/// Channels of one guild.  New channels are text channels inside `category`, when given.
pub struct ChannelStore {
    pub http: Arc<Http>,
    pub guild_id: GuildId,
    pub category: Option<ChannelId>,
}

#[serenity::async_trait]
impl EntityStore for ChannelStore {
    type Id = ChannelId;

    fn kind(&self) -> &'static str {
        "channel"
    }

    async fn create(&self, name: &str) -> Result<ChannelId, StoreError> {
        let mut builder = CreateChannel::new(name).kind(ChannelType::Text);
        if let Some(category) = self.category {
            builder = builder.category(category);
        }
        let channel = self.guild_id.create_channel(&self.http, builder).await?;
        Ok(channel.id)
    }

    async fn move_to(&self, id: ChannelId, position: usize) -> Result<(), StoreError> {
        id.edit(
            &self.http,
            EditChannel::new().position(discord_position(position)),
        )
        .await?;
        Ok(())
    }

    async fn rename(&self, id: ChannelId, name: &str) -> Result<(), StoreError> {
        id.edit(&self.http, EditChannel::new().name(name)).await?;
        Ok(())
    }
}
