use crate::{context::Context, event::EventHandled};
use anyhow::Result;

mod addrole;
mod assign;
mod channel;
mod debug;
mod get;
mod help;
mod ignore_bots;
mod reload;
mod rename;
mod role;
mod send;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Doubles as the command name for command plugins.
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context<'_>) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context<'_>, event: &crate::event::Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(help::Help),
        Box::new(reload::Reload),
        // Read-only queries
        Box::new(get::Get),
        // Guild changes
        Box::new(addrole::AddRole),
        Box::new(role::Role),
        Box::new(assign::Assign),
        Box::new(channel::Channel),
        Box::new(rename::Rename),
        Box::new(send::SendMessage),
    ]
}

/// `;name args - description` help line.
async fn usage_line(ctx: &Context<'_>, name: &str, args: &str, description: &str) -> String {
    let prefix = ctx.prefix().await;
    if args.is_empty() {
        format!("{}{} - {}", prefix, name, description)
    } else {
        format!("{}{} {} - {}", prefix, name, args, description)
    }
}
