//! ModaMatch Core - Shared domain types and fitting logic.
//!
//! This crate is used by every ModaMatch component:
//! - `widget` - The try-on experience embedded in a host store page
//! - `host` - The store-side loader that answers widget requests
//! - `catalog` - Product catalog service fed by store and CMS webhooks
//! - `cli` - Command-line tools for migrations and support
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Settings transitions, variant matching
//! and fitting compatibility are all deterministic so they can be tested in
//! isolation and shared between the widget and the catalog.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and clothing classes
//! - [`product`] - Catalog products, options and variants
//! - [`variant`] - Option extraction and variant matching
//! - [`fitting`] - Fitting items, try-on assets and shopper models
//! - [`resolver`] - Fitting-room compatibility rules
//! - [`cart`] - Cart lines and totals
//! - [`settings`] - Shopper settings transitions
//! - [`protocol`] - Widget-to-host message envelopes and commands

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod fitting;
pub mod product;
pub mod protocol;
pub mod resolver;
pub mod settings;
pub mod types;
pub mod variant;

pub use cart::{CartItem, cart_total};
pub use fitting::{FittingItem, ProductTryOnItems, ShopperModel, SizeRef, TryOnItem};
pub use product::{Category, Platform, Product, ProductOption, StoreData, Variant};
pub use protocol::{Command, CustomerData, Envelope, Frame, MessageType, Request, Response};
pub use resolver::{Decision, Selection, select_for_fitting};
pub use settings::CustomerSettings;
pub use types::*;
pub use variant::{ProductOptions, SelectedOptions};
