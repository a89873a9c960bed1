//! Ephemeral in-process store for meeting rooms.
//!
//! Tracks sessions, host/participant membership and per-room settings for a
//! video-conferencing backend. State lives in memory only and is gone when
//! the owning process exits.

pub mod filter;
pub mod room;
pub mod store;

pub use filter::{Condition, RoomFilter};
pub use room::{Room, RoomDraft, RoomPatch, RoomSettings, SettingsUpdate, DEFAULT_ROOM_NAME};
pub use store::{RoomRepository, RoomStore, StoreConfig, StoreError};
