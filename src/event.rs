//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! the handler translates the callbacks into a distinct Event enum.

use crate::{context::Context, error::describe, log_internal, parse::split_args};
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    //
    // Errors stop at this boundary: they are logged, and if the event was a message the author
    // gets a reply explaining what went wrong.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => {
                    log_internal!("Error in plugin {}: {:#}", plugin.name(), err);
                    if let Event::Message(msg) = &self {
                        if let Err(e) = msg.reply(ctx.cache_http, describe(&err)).await {
                            log_internal!("Could not report error to user: {}", e);
                        }
                    }
                    return;
                }
            }
        }
    }

    // Check if a message should be interpreted as a special bot command.
    //
    // These are prefixed with the configured command prefix, e.g. `;role 1234`.  On a match the
    // remaining arguments are returned, with double quotes grouping words.
    pub async fn is_bot_cmd(&self, ctx: &Context<'_>, cmd: &str) -> Option<(&Message, Vec<String>)> {
        let (msg, args) = self.bot_cmd_text(ctx, cmd).await?;
        Some((msg, split_args(args)))
    }

    // Like `is_bot_cmd`, but hands back everything after the command name exactly as typed.
    pub async fn bot_cmd_text(&self, ctx: &Context<'_>, cmd: &str) -> Option<(&Message, &str)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.prefix().await;
        let rest = strip_command_prefix(&msg.content, &prefix)?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args),
            None => (rest, ""),
        };

        if name == cmd {
            Some((msg, args))
        } else {
            None
        }
    }
}

/// The message body after the command prefix, if it has one.  Leading whitespace is ignored.
pub fn strip_command_prefix<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    content.trim_start().strip_prefix(prefix)
}

pub enum EventHandled {
    Yes,
    No,
}
