// Application state (AppState)

use crate::core::config::Config;
use crate::stores::{picture_store::PictureStore, session_store::SessionStore, user_store::UserStore};
use crate::wal::wal::Wal;
use std::sync::Arc;

/// Shared application state
///
/// Everything a handler needs is reached through here; there are no global
/// singletons. All fields are wrapped in Arc for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// User table
    pub users: Arc<UserStore>,

    /// Logged-in browsers
    pub sessions: Arc<SessionStore>,

    /// Profile pictures on disk
    pub pictures: Arc<PictureStore>,

    /// Write-Ahead Log for persistence
    pub wal: Arc<Wal>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, wal: Wal) -> Self {
        let config = Arc::new(config);
        let wal = Arc::new(wal);

        let users = Arc::new(UserStore::with_capacity(
            Arc::clone(&wal),
            config.storage.user_capacity,
        ));

        let pictures = Arc::new(PictureStore::new(
            config.storage.static_dir.clone(),
            config.storage.picture_quality,
            config.storage.max_upload_bytes,
        ));

        Self {
            users,
            sessions: Arc::new(SessionStore::new(config.session.ttl_seconds)),
            pictures,
            wal,
            config,
        }
    }
}
