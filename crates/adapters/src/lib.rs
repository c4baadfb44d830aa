//! alt-texter adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `captioning`: SceneXplain and stub captioners
//! - `auth`: Per-request credential providers
//! - `ghost`, `wordpress`, `woocommerce`, `shopify`: content platform adapters

pub mod auth;
pub mod captioning;
mod gallery;
mod http;
mod pagination;

pub mod ghost;
pub mod shopify;
pub mod woocommerce;
pub mod wordpress;

pub use ghost::GhostPlatform;
pub use shopify::ShopifyPlatform;
pub use woocommerce::WooCommercePlatform;
pub use wordpress::WordPressPlatform;
