//! ModaMatch Widget - The try-on experience embedded in a host store page.
//!
//! The widget runs inside the store's page but in its own frame. It talks to
//! the host page only through the [`messenger`], keeps the shopper's settings
//! in a write-through [`store`], and drives the fitting room from the pure
//! rules in `modamatch_core`.
//!
//! # Modules
//!
//! - [`messenger`] - Correlated request/response calls to the host page
//! - [`embed`] - Typed host operations with fallbacks
//! - [`store`] - Settings snapshot persisted after every mutation
//! - [`storage`] - Durable key/value backends
//! - [`fitting_room`] - Selection state for the model view
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod embed;
pub mod error;
pub mod fitting_room;
pub mod messenger;
pub mod storage;
pub mod store;

pub use config::WidgetConfig;
pub use embed::EmbedClient;
pub use error::{MessengerError, StorageError};
pub use fitting_room::{DisplayFlags, FittingRoom, hydrate_store};
pub use messenger::{ChannelTransport, FrameTransport, Messenger};
pub use storage::{FileStorage, MemoryStorage, SettingsStorage};
pub use store::SettingsStore;
