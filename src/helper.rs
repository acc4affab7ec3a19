//! Miscellaneous convenience methods

use crate::{
    context::Context,
    error::{user_input, CommandError, StoreError},
};
use anyhow::Result;
use serenity::all::{CreateAttachment, CreateMessage, GuildId, Message, MessageId};

/// Discord rejects messages longer than this.
const MESSAGE_LIMIT: usize = 2000;
/// Room kept free in every chunk to close an open code fence.
const FENCE: &str = "```\n";

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_owner(&self, ctx: &Context<'_>) -> bool;
    async fn is_from_moderator(&self, ctx: &Context<'_>) -> Result<bool>;
    /// Fail with a reply unless the author may run moderation commands.
    async fn require_moderator(&self, ctx: &Context<'_>) -> Result<GuildId>;
    fn require_guild(&self) -> Result<GuildId>;
    /// The message a command operates on: the one with ID `id` in this channel, or the one being
    /// replied to when no ID is given.
    async fn referenced(&self, ctx: &Context<'_>, id: Option<&str>) -> Result<Message>;
    /// Reply, splitting text longer than Discord allows into several messages.
    async fn reply_chunked(&self, ctx: &Context<'_>, text: &str) -> Result<()>;
    async fn reply_with_file(
        &self,
        ctx: &Context<'_>,
        text: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<()>;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    async fn is_from_owner(&self, ctx: &Context<'_>) -> bool {
        let owners = &ctx.cfg.read().await.general.bot_owners;
        let author_global_name = &self.author.name;

        owners.contains(author_global_name)
    }

    async fn is_from_moderator(&self, ctx: &Context<'_>) -> Result<bool> {
        if self.is_from_owner(ctx).await {
            return Ok(true);
        }
        let Some(guild_id) = self.guild_id else {
            return Ok(false);
        };

        let moderator_roles = ctx.cfg.read().await.general.moderator_roles.clone();
        if moderator_roles.is_empty() {
            return Ok(false);
        }

        let member = guild_id.member(ctx.cache_http, self.author.id).await?;
        let roles = guild_id.roles(ctx.http).await?;
        Ok(member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .any(|role| moderator_roles.contains(&role.name)))
    }

    async fn require_moderator(&self, ctx: &Context<'_>) -> Result<GuildId> {
        let guild_id = self.require_guild()?;
        if !self.is_from_moderator(ctx).await? {
            return Err(CommandError::NotAuthorized.into());
        }
        Ok(guild_id)
    }

    fn require_guild(&self) -> Result<GuildId> {
        self.guild_id.ok_or(CommandError::NotInGuild.into())
    }

    async fn referenced(&self, ctx: &Context<'_>, id: Option<&str>) -> Result<Message> {
        let Some(id) = id else {
            return match &self.referenced_message {
                Some(msg) => Ok((**msg).clone()),
                None => user_input("Reply to the message with the list, or give its message ID."),
            };
        };

        let Ok(message_id) = id.parse::<MessageId>() else {
            return user_input("Invalid message ID format. Please provide a valid message ID.");
        };
        self.channel_id
            .message(ctx.cache_http, message_id)
            .await
            .map_err(|e| lookup_error(id, StoreError::from(e)))
    }

    async fn reply_chunked(&self, ctx: &Context<'_>, text: &str) -> Result<()> {
        let mut chunks = split_message(text).into_iter();
        if let Some(first) = chunks.next() {
            self.reply(ctx.cache_http, first).await?;
        }
        for chunk in chunks {
            self.channel_id.say(ctx.http, chunk).await?;
        }
        Ok(())
    }

    async fn reply_with_file(
        &self,
        ctx: &Context<'_>,
        text: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        let message = CreateMessage::new()
            .content(text)
            .reference_message(self)
            .add_file(CreateAttachment::bytes(data, file_name));
        self.channel_id.send_message(ctx.cache_http, message).await?;
        Ok(())
    }
}

/// Only a message that is really gone is the user's mistake; anything else is reported as is.
fn lookup_error(id: &str, err: StoreError) -> anyhow::Error {
    match err {
        StoreError::NotFound(_) => {
            CommandError::UserInput(format!("Message with ID {} not found.", id)).into()
        }
        err => err.into(),
    }
}

/// Split `text` on line boundaries into messages Discord will accept.
///
/// A code fence left open at a split is closed at the end of one chunk and reopened at the start
/// of the next.  Lines too long for a single message are cut.
pub fn split_message(text: &str) -> Vec<String> {
    let budget = MESSAGE_LIMIT - FENCE.len();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_fence = false;

    for line in text.lines() {
        for piece in cut(line, budget - FENCE.len() - 1) {
            if !current.is_empty() && current.len() + piece.len() + 1 > budget {
                if in_fence {
                    current.push_str(FENCE);
                }
                chunks.push(std::mem::take(&mut current));
                if in_fence {
                    current.push_str(FENCE);
                }
            }
            current.push_str(piece);
            current.push('\n');
        }
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cut a line into pieces of at most `max` bytes without splitting characters.
fn cut(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while rest.len() > max {
        let mut end = max;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello\nworld"), vec!["hello\nworld\n"]);
    }

    #[test]
    fn long_text_respects_limit_and_fences() {
        let mut text = String::from("Channels:\n```\n");
        for i in 0..400 {
            text.push_str(&format!("channel-number-{}\n", i));
        }
        text.push_str("```\n");

        let chunks = split_message(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= MESSAGE_LIMIT);
            assert_eq!(chunk.matches("```").count() % 2, 0, "{}", chunk);
        }
        let rejoined: String = chunks.concat();
        assert!(rejoined.contains("channel-number-0\n"));
        assert!(rejoined.contains("channel-number-399\n"));
    }

    #[test]
    fn oversized_lines_are_cut() {
        let line = "é".repeat(3000);
        let chunks = split_message(&line);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
        assert_eq!(chunks.concat().replace('\n', ""), line);
    }

    #[test]
    fn only_missing_messages_are_reported_as_not_found() {
        let missing = lookup_error("42", StoreError::NotFound("Unknown Message".into()));
        assert_eq!(crate::error::describe(&missing), "Message with ID 42 not found.");

        let denied = lookup_error("42", StoreError::PermissionDenied("Missing Access".into()));
        assert!(matches!(
            denied.downcast_ref::<StoreError>(),
            Some(StoreError::PermissionDenied(_))
        ));

        let flaky = lookup_error("42", StoreError::Transient("502".into()));
        assert!(!crate::error::describe(&flaky).contains("not found"));
    }
}
