//! Roster source: list, remove, and add channel members.
//!
//! The engine talks to the chat platform only through [`Roster`].
//! [`SlackRoster`] implements it on the Slack Web API.

pub mod error;
pub mod roster;
pub mod slack;

pub use error::RosterError;
pub use roster::Roster;
pub use slack::SlackRoster;
