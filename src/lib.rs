//! ProductAI SDK for Rust
//!
//! A blocking client for the ProductAI image search API. Every request is a
//! signed `POST`: the client attaches `x-ca-*` authentication headers and an
//! `x-ca-signature` computed with HMAC-SHA1 over the headers and form body
//! (see [`auth`]).
//!
//! # Example
//!
//! ```no_run
//! use productai_sdk::{Client, Credentials};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load credentials from ~/.productai/config
//!     let credentials = Credentials::from_file(None, None)?;
//!     let client = Client::with_config(credentials, Default::default())?;
//!
//!     // Search by image URL
//!     let response = client
//!         .get_image_search_api("my-service-id")
//!         .query("https://example.com/shoe.jpg", "0-0-1-1")?;
//!     println!("{}: {}", response.status(), response.text()?);
//!
//!     // Manage an image set
//!     let image_set = client.get_image_set_api("my-image-set");
//!     image_set.add_image("https://example.com/shoe.jpg", Some("sku-42"))?;
//!     image_set.delete_images(&["https://example.com/shoe.jpg"])?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
mod base_client;
pub mod client;
pub mod config;
pub mod image_set;

pub const API_URL: &str = "https://api.productai.cn";
pub const API_VERSION: &str = "1";
/// Length of the per-request signature nonce
pub const SIGNATURE_LEN: usize = 32;

// Re-export commonly used types
pub use api::{Api, DEFAULT_LOC};
pub use auth::{AuthError, AuthHeaders, Credentials};
pub use base_client::default_http_client;
pub use client::{Attachment, Client, ClientError};
pub use config::ClientConfig;
pub use image_set::ImageSetApi;
