//! Logging to the terminal with colors
//!
//! Lines start with a colored marker: `*` for something Discord told us, `+` for something the
//! bot did on its own, `✔`/`✘` for a guild change that went through or did not.

use serenity::all::Http;
use std::borrow::Cow;
use std::io::IsTerminal;
use std::sync::{Arc, LazyLock};

#[derive(Clone, Copy)]
pub enum Color {
    Default,
    Event,
    Internal,
    Success,
    Failure,
    User,
    Channel,
    Guild,
    Role,
    Glue,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Default => "\x1b[0m",
            Color::Event => "\x1b[33m",
            Color::Internal => "\x1b[35m",
            Color::Success => "\x1b[32m",
            Color::Failure => "\x1b[31m",
            Color::User => "\x1b[32m",
            Color::Channel => "\x1b[36m",
            Color::Guild => "\x1b[38;5;33m",
            Color::Role => "\x1b[38;5;208m",
            Color::Glue => "\x1b[90m",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Whether stdout is a terminal is fixed for the life of the process.
        static STDOUT_IS_TERMINAL: LazyLock<bool> =
            LazyLock::new(|| std::io::stdout().is_terminal());

        if *STDOUT_IS_TERMINAL {
            f.write_str(self.code())
        } else {
            Ok(())
        }
    }
}

/// `text` in `color`, reset afterwards.
pub fn paint(color: Color, text: &str) -> String {
    format!("{}{}{}", color, text, Color::Default)
}

/// Shared body of the logging macros: a colored marker, then the message.
#[macro_export]
macro_rules! log_line {
    ($color:ident, $marker:literal, $fmtstr:expr $(, $args:expr)* $(,)?) => {{
        println!(
            concat!("{}", $marker, "{} ", $fmtstr),
            $crate::logging::Color::$color,
            $crate::logging::Color::Default
            $(, $args)*
        )
    }};
}

/// Something Discord told us about.
#[macro_export]
macro_rules! log_event {
    ($($tt:tt)*) => {
        $crate::log_line!(Event, "*", $($tt)*)
    };
}

/// Something the bot did or noticed.
#[macro_export]
macro_rules! log_internal {
    ($($tt:tt)*) => {
        $crate::log_line!(Internal, "+", $($tt)*)
    };
}

/// A guild change and whether it went through.
#[macro_export]
macro_rules! log_outcome {
    (true, $($tt:tt)*) => {
        $crate::log_line!(Success, "✔", $($tt)*)
    };
    (false, $($tt:tt)*) => {
        $crate::log_line!(Failure, "✘", $($tt)*)
    };
}

pub trait PrintColor {
    fn color(&self) -> String;
}

#[serenity::async_trait]
pub trait AsyncPrintColor {
    async fn color(&self, http: &Arc<Http>) -> String;
}

// Field separator
pub struct Glue;
impl PrintColor for Glue {
    fn color(&self) -> String {
        paint(Color::Glue, ":")
    }
}

impl PrintColor for serenity::all::CurrentUser {
    fn color(&self) -> String {
        paint(Color::User, &self.name)
    }
}

impl PrintColor for serenity::all::User {
    fn color(&self) -> String {
        paint(Color::User, &self.name)
    }
}

/// Role and channel names as they appear in a moderator's list.
impl PrintColor for str {
    fn color(&self) -> String {
        paint(Color::Role, self)
    }
}

#[serenity::async_trait]
impl AsyncPrintColor for serenity::all::ChannelId {
    async fn color(&self, http: &Arc<Http>) -> String {
        let name = match self.name(http).await {
            Ok(name) => Cow::Owned(format!("#{}", name)),
            Err(_) => Cow::Borrowed("<unknown-channel>"),
        };
        paint(Color::Channel, &name)
    }
}

#[serenity::async_trait]
impl AsyncPrintColor for Option<serenity::all::GuildId> {
    async fn color(&self, http: &Arc<Http>) -> String {
        let name = match self {
            Some(guild_id) => match guild_id.to_partial_guild(http).await {
                Ok(guild) => Cow::Owned(guild.name),
                Err(_) => Cow::Borrowed("<unknown-guild>"),
            },
            None => Cow::Borrowed("<direct-message>"),
        };
        paint(Color::Guild, &name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn painted_text_keeps_its_content() {
        let painted = paint(Color::Role, "Team Leads");
        assert!(painted.contains("Team Leads"));
        assert!(painted.starts_with(&Color::Role.to_string()));
        assert!(painted.ends_with(&Color::Default.to_string()));
    }

    #[test]
    fn outcome_markers_use_distinct_colors() {
        assert_ne!(Color::Success.code(), Color::Failure.code());
    }
}
