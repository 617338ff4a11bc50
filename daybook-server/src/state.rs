use chrono::Duration;

use crate::config::Settings;
use crate::db::repositories::{
    FollowRepository, LikeRepository, PostRepository, ScheduleRepository, UserRepository,
};
use crate::db::Database;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub settings: Settings,
}

impl AppState {
    pub fn new(db: Database, settings: &Settings) -> Self {
        let session_manager = SessionManager::new(db.clone(), Duration::days(settings.session.ttl_days));
        Self {
            db,
            session_manager,
            settings: settings.clone(),
        }
    }

    /// Get authenticated user ID from session token
    pub fn get_authenticated_user_id_from_token(&self, token: &str) -> Option<uuid::Uuid> {
        self.session_manager.validate_session(token).ok()
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db.pool.clone())
    }

    pub fn posts(&self) -> PostRepository {
        PostRepository::new(self.db.pool.clone())
    }

    pub fn likes(&self) -> LikeRepository {
        LikeRepository::new(self.db.pool.clone())
    }

    pub fn follows(&self) -> FollowRepository {
        FollowRepository::new(self.db.pool.clone())
    }

    pub fn schedule(&self) -> ScheduleRepository {
        ScheduleRepository::new(self.db.pool.clone())
    }
}
