//! Discord interaction handlers
//!
//! This module provides handlers for non-command interactions: the buttons and select
//! menus carried by wizard messages, close prompts and announcements.

/// Button and select menu dispatch
pub mod components;
/// Custom id encoding for every component the bot sends
pub mod custom_id;
