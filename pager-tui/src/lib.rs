//! Remote pager terminal viewer library exports.

pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod logging;
pub mod notifications;
pub mod remote;
pub mod state;
pub mod view;
