pub mod config;
pub mod freshen;
pub mod infra;
pub mod locator;
pub mod patch;
pub mod plugin;
pub mod publish;
pub mod services;
pub mod template;

pub use config::{PluginConfig, SecretSpec};
pub use plugin::{Hook, HookOutcome, PLUGIN_NAME, PatchOutcome, Plugin};
pub use template::Template;
