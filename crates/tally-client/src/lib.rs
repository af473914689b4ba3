//! Outbound HTTP clients: the typed Tally API client used by the CLI, and
//! the signed Cloudinary admin client used by the server's media proxy.

pub mod api;
pub mod cloudinary;

pub use api::ApiClient;
pub use cloudinary::{CloudinaryClient, CloudinaryConfig};
