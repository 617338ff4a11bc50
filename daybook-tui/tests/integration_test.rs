use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use daybook::api::{ApiClient, ApiError};
use daybook::app::{categorize_api_error, App, NoticeLevel, Screen, Tab};
use daybook::config::{ConfigManager, SessionData};
use daybook::watchdog::{LoadError, LoadingWatchdog};
use daybook_types::{FeedScope, Post, User};
use tempfile::TempDir;
use uuid::Uuid;

// Nothing listens on the discard port, so every request fails fast
const DEAD_SERVER: &str = "http://127.0.0.1:9";

fn saved_session(dir: &TempDir) -> ConfigManager {
    let config = ConfigManager::with_dir(dir.path()).expect("config dir");
    config
        .save_session(&SessionData {
            email: "ada@example.com".to_string(),
            session_token: "saved-token".to_string(),
            user_id: Uuid::new_v4().to_string(),
        })
        .expect("save session");
    config
}

#[tokio::test]
async fn test_unreachable_server_fails_startup_but_keeps_session() {
    let dir = TempDir::new().unwrap();
    let config = saved_session(&dir);

    let watchdog = LoadingWatchdog::new(Duration::from_secs(5), 1);
    let result = watchdog
        .run(|_| {
            let mut app = App::new(Arc::new(ApiClient::new(DEAD_SERVER))).with_config_manager(config.clone());
            async move {
                app.initialize().await?;
                Ok::<_, ApiError>(app)
            }
        })
        .await;

    match result {
        Err(LoadError::Failed(e)) => {
            assert!(matches!(e, ApiError::Network(_)), "got {:?}", e);
            assert!(categorize_api_error(&e).contains("Network error"));
        }
        Err(other) => panic!("expected a network failure, got {}", other),
        Ok(_) => panic!("startup should not succeed without a server"),
    }

    // A network failure is not a rejection; the session survives for the next run
    let config = ConfigManager::with_dir(dir.path()).unwrap();
    assert!(config.load_session().unwrap().is_some());
}

#[tokio::test]
async fn test_like_against_unreachable_server_rolls_back() {
    let me = User {
        id: Uuid::new_v4(),
        email: "ada@example.com".to_string(),
        username: Some("ada".to_string()),
        join_date: Utc::now(),
    };
    let post = Post {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        author_username: Some("grace".to_string()),
        content: "Writing the compiler".to_string(),
        created_at: Utc::now(),
        start_time: None,
        end_time: None,
        completed: false,
        likes_count: 3,
        liked_by_user: false,
    };

    let mut app = App::new(Arc::new(ApiClient::new(DEAD_SERVER)));
    app.current_user = Some(me);
    app.screen = Screen::Main;
    app.current_tab = Tab::World;
    let feed = app.feeds.entry(FeedScope::World).or_default();
    feed.posts = vec![post.clone()];
    feed.loaded = true;
    feed.list_state.select(Some(0));

    app.toggle_like_selected();
    {
        let shown = &app.feed(FeedScope::World).unwrap().posts[0];
        assert_eq!(shown.likes_count, 4);
        assert!(shown.liked_by_user);
    }

    tokio::time::timeout(Duration::from_secs(10), app.wait_for_mutations())
        .await
        .expect("like should settle");

    assert_eq!(app.feed(FeedScope::World).unwrap().posts[0], post);
    let notice = app.notice.as_ref().expect("rollback notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("Network error"), "got {:?}", notice.message);
}
