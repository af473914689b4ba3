use tally_client::CloudinaryClient;
use tally_db::Database;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    /// Static API key protecting the `/v1` routes.
    pub api_key: String,
    /// Signed Cloudinary client. `None` disables the media proxy.
    pub cloudinary: Option<CloudinaryClient>,
}
