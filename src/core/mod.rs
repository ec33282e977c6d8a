//! Core business logic - framework-agnostic LFG operations.
//!
//! Nothing in here depends on poise or serenity; the chat platform is reached only
//! through the [`provisioner::ChatPlatform`] trait.

pub mod announcement;
pub mod draft;
pub mod guild_config;
pub mod lfg;
pub mod locks;
pub mod provisioner;
pub mod rotation;
pub mod squad;
pub mod store;
pub mod wizard;
