use crate::config::Config;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a plugin gets to work with while handling one event
pub struct Context<'a> {
    /// Shared with `reload`, which swaps the contents in place.
    pub cfg: &'a RwLock<Config>,
    pub cache: &'a Arc<serenity::all::Cache>,
    pub http: &'a Arc<serenity::all::Http>,
    pub cache_http: &'a CacheHttp,
}

impl Context<'_> {
    /// The command prefix currently configured, e.g. `;`.
    pub async fn prefix(&self) -> String {
        self.cfg.read().await.general.command_prefix.clone()
    }
}

/// Serenity calls that take `impl CacheHttp` try the cache before going over http.  Its own
/// `Context` is the handiest value implementing that, but the name clashes with ours.
pub type CacheHttp = serenity::all::Context;
