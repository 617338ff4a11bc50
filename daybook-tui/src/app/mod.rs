use anyhow::Result;
use chrono::Duration as ChronoDuration;
use daybook_types::{
    parse_time_block, validate_email, validate_post, validate_schedule_entry, validate_username,
    CreatePostRequest, FeedScope, ScheduleEntryDraft, User, ValidationErrors,
};
use ratatui::widgets::ListState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::api::{ApiError, Backend};
use crate::config::{ConfigManager, SessionData};
use crate::logging::LogConfig;
use crate::optimistic::InFlight;
use crate::{log_api_call, log_debug};

pub mod handlers;
pub mod mutations;
pub mod state;

pub use mutations::{categorize_api_error, categorize_error, Completion, MutationError, PendingMutation};
pub use state::*;

/// Work a key press asks for that has to await the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadTab,
    SubmitAuth,
    SubmitUsername,
    SubmitComposer,
    Search,
    DeleteAccount,
    Logout,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            screen: Screen::Auth,
            backend,
            current_user: None,
            current_tab: Tab::Self_,
            feeds: HashMap::new(),
            requests: RequestsState::default(),
            schedule: ScheduleState::default(),
            composer: None,
            search: None,
            auth: AuthState::default(),
            username_prompt: UsernamePromptState::default(),
            notice: None,
            confirm_delete_account: false,
            show_help: false,
            inflight: InFlight::new(),
            pending: HashMap::new(),
            next_mutation_id: 0,
            completion_tx,
            completion_rx,
            log_config: LogConfig::default(),
            config_manager: None,
        }
    }

    pub fn with_config_manager(mut self, config_manager: ConfigManager) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn feed(&self, scope: FeedScope) -> Option<&FeedState> {
        self.feeds.get(&scope)
    }

    pub fn handle_key_event(&mut self, key: crossterm::event::KeyEvent) -> Option<Action> {
        handlers::handle_key_event(self, key)
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn next_tab(&mut self) {
        self.current_tab = self.current_tab.next();
    }

    pub fn previous_tab(&mut self) {
        self.current_tab = self.current_tab.previous();
    }

    /// Drop the notice once it has been up long enough
    pub fn clear_expired_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
    }

    fn current_list(&mut self) -> Option<(&mut ListState, usize)> {
        match self.current_tab {
            Tab::Requests => {
                let len = self.requests.len();
                Some((&mut self.requests.list_state, len))
            }
            Tab::Schedule => {
                let len = self.schedule.entries.len();
                Some((&mut self.schedule.list_state, len))
            }
            feed_tab => {
                let feed = self.feeds.get_mut(&feed_tab.scope()?)?;
                let len = feed.posts.len();
                Some((&mut feed.list_state, len))
            }
        }
    }

    /// Move the selection down, stopping at the last item
    pub fn select_next(&mut self) {
        if let Some((list_state, len)) = self.current_list() {
            step_selection(list_state, len, 1);
        }
    }

    pub fn select_previous(&mut self) {
        if let Some((list_state, len)) = self.current_list() {
            step_selection(list_state, len, -1);
        }
    }

    /// Move the schedule view by `days`
    pub fn shift_schedule_day(&mut self, days: i64) {
        self.schedule.date += ChronoDuration::days(days);
        self.schedule.entries.clear();
        self.schedule.list_state.select(None);
    }

    pub fn open_composer(&mut self) {
        let mode = match self.current_tab {
            Tab::Schedule => ComposerMode::ScheduleEntry,
            _ => ComposerMode::Post,
        };
        self.composer = Some(ComposerState::new(mode));
    }

    pub fn close_composer(&mut self) {
        self.composer = None;
    }

    pub fn open_search(&mut self) {
        self.search = Some(SearchState::default());
    }

    pub fn close_search(&mut self) {
        self.search = None;
    }

    /// Run an action requested by a key press
    pub async fn perform(&mut self, action: Action) -> Result<()> {
        log_debug!(self.log_config, "Performing {:?}", action);
        match action {
            Action::LoadTab => self.load_current_tab().await,
            Action::SubmitAuth => self.submit_auth().await,
            Action::SubmitUsername => self.submit_username().await,
            Action::SubmitComposer => self.submit_composer().await,
            Action::Search => self.search_users().await,
            Action::DeleteAccount => self.delete_account().await,
            Action::Logout => self.logout().await,
        }
    }

    /// Restore a saved session, if any, and load the first tab.
    ///
    /// A rejected token is forgotten and the login screen shown. Any other
    /// failure is returned so the caller can report it.
    pub async fn initialize(&mut self) -> Result<(), ApiError> {
        let saved = self
            .config_manager
            .as_ref()
            .and_then(|config| match config.load_session() {
                Ok(session) => session,
                Err(e) => {
                    log::warn!("Failed to load saved session: {}", e);
                    None
                }
            });

        let Some(session) = saved else {
            log::info!("No saved session, showing login");
            self.screen = Screen::Auth;
            return Ok(());
        };

        self.auth.email = session.email.clone();
        self.backend.set_session_token(Some(session.session_token));
        log_api_call!(self.log_config, "GET /auth/validate");

        match self.backend.validate_session().await {
            Ok(user) => {
                log::info!("Restored session for {}", user.email);
                self.enter_session(user).await;
                Ok(())
            }
            Err(ApiError::Unauthorized(_)) | Err(ApiError::NotFound(_)) => {
                log::info!("Saved session was rejected, clearing it");
                self.forget_session();
                self.auth.error = Some("Your session expired. Please log in again.".to_string());
                self.screen = Screen::Auth;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn enter_session(&mut self, user: User) {
        let needs_username = user.username.is_none();
        self.current_user = Some(user);
        self.auth.error = None;
        self.auth.loading = false;
        if needs_username {
            self.screen = Screen::UsernamePrompt;
        } else {
            self.screen = Screen::Main;
            let _ = self.load_current_tab().await;
        }
    }

    fn persist_session(&self, email: &str, token: &str, user: &User) {
        let Some(config) = &self.config_manager else {
            return;
        };
        let session = SessionData {
            email: email.to_string(),
            session_token: token.to_string(),
            user_id: user.id.to_string(),
        };
        if let Err(e) = config.save_session(&session) {
            log::warn!("Failed to save session: {}", e);
        }
    }

    fn forget_session(&mut self) {
        self.backend.set_session_token(None);
        if let Some(config) = &self.config_manager {
            if let Err(e) = config.delete_session() {
                log::warn!("Failed to delete session file: {}", e);
            }
        }
    }

    /// Clear everything tied to the signed-in user
    fn reset_session_state(&mut self) {
        self.current_user = None;
        self.screen = Screen::Auth;
        self.current_tab = Tab::Self_;
        self.feeds.clear();
        self.requests = RequestsState::default();
        self.schedule = ScheduleState::default();
        self.composer = None;
        self.search = None;
        self.confirm_delete_account = false;
        self.username_prompt = UsernamePromptState::default();
        // Dropping the tokens releases their in-flight claims
        self.pending.clear();
    }

    pub async fn load_current_tab(&mut self) -> Result<()> {
        match self.current_tab {
            Tab::Requests => self.load_requests().await,
            Tab::Schedule => self.load_schedule().await,
            tab => match tab.scope() {
                Some(scope) => self.load_feed(scope).await,
                None => Ok(()),
            },
        }
    }

    pub async fn load_feed(&mut self, scope: FeedScope) -> Result<()> {
        {
            let feed = self.feeds.entry(scope).or_default();
            feed.loading = true;
            feed.error = None;
        }
        log_api_call!(self.log_config, "GET /posts?scope={}", scope.as_str());

        let result = self.backend.feed(scope, None).await;
        self.feeds.entry(scope).or_default().loading = false;
        match result {
            Ok(posts) => {
                log_api_call!(self.log_config, "Loaded {} {} posts", posts.len(), scope.as_str());
                let feed = self.feeds.entry(scope).or_default();
                let selected = feed.list_state.selected();
                feed.posts = posts;
                feed.loaded = true;
                // Mutations still in flight keep showing over the fresh data
                self.reapply_pending_posts(scope);
                let feed = self.feeds.entry(scope).or_default();
                match (selected, feed.posts.len()) {
                    (_, 0) => feed.list_state.select(None),
                    (Some(i), len) => feed.list_state.select(Some(i.min(len - 1))),
                    (None, _) => feed.list_state.select(Some(0)),
                }
            }
            Err(e) => {
                log::warn!("Failed to load {} feed: {}", scope.as_str(), e);
                self.feeds.entry(scope).or_default().error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    pub async fn load_requests(&mut self) -> Result<()> {
        self.requests.loading = true;
        self.requests.error = None;
        log_api_call!(self.log_config, "GET /follows/incoming, /follows/outgoing");

        let incoming = self.backend.pending_requests().await;
        let outgoing = self.backend.outgoing_follows().await;
        self.requests.loading = false;

        match (incoming, outgoing) {
            (Ok(incoming), Ok(outgoing)) => {
                self.requests.incoming = incoming;
                self.requests.outgoing = outgoing;
                self.reapply_pending_requests();
                let len = self.requests.len();
                mutations::clamp_selection(&mut self.requests.list_state, len);
            }
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Failed to load follow requests: {}", e);
                self.requests.error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    pub async fn load_schedule(&mut self) -> Result<()> {
        self.schedule.loading = true;
        self.schedule.error = None;
        let date = self.schedule.date;
        log_api_call!(self.log_config, "GET /functions/schedule?date={}", date);

        let result = self.backend.schedule_for(date).await;
        self.schedule.loading = false;
        match result {
            // The day may have changed while the request was out
            Ok(_) if self.schedule.date != date => {}
            Ok(entries) => {
                self.schedule.entries = entries;
                self.reapply_pending_schedule();
                mutations::clamp_selection(&mut self.schedule.list_state, self.schedule.entries.len());
            }
            Err(e) => {
                log::warn!("Failed to load schedule for {}: {}", date, e);
                self.schedule.error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    pub fn toggle_auth_mode(&mut self) {
        self.auth.mode = match self.auth.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.auth.error = None;
    }

    /// Log in or register with the typed email
    pub async fn submit_auth(&mut self) -> Result<()> {
        let email = self.auth.email.trim().to_string();
        if let Err(errors) = validate_email(&email) {
            self.auth.error = errors.for_field("email").map(str::to_string);
            return Ok(());
        }

        self.auth.loading = true;
        self.auth.error = None;
        let result = match self.auth.mode {
            AuthMode::Login => {
                log_api_call!(self.log_config, "POST /auth/login");
                self.backend.login(&email).await
            }
            AuthMode::Register => {
                log_api_call!(self.log_config, "POST /auth/register");
                self.backend.register(&email).await
            }
        };
        self.auth.loading = false;

        match result {
            Ok(login) => {
                self.persist_session(&email, &login.session_token, &login.user);
                self.enter_session(login.user).await;
            }
            Err(ApiError::NotFound(_)) => {
                self.auth.error =
                    Some("No account for that email. Press Tab to register instead.".to_string());
            }
            Err(ApiError::Conflict(_)) => {
                self.auth.error =
                    Some("That email is already registered. Press Tab to log in.".to_string());
            }
            Err(e) => {
                log::warn!("Authentication failed: {}", e);
                self.auth.error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    /// Claim the typed username
    pub async fn submit_username(&mut self) -> Result<()> {
        let username = self.username_prompt.input.trim().to_string();
        if let Err(errors) = validate_username(&username) {
            self.username_prompt.error = errors.for_field("username").map(str::to_string);
            return Ok(());
        }

        self.username_prompt.submitting = true;
        log_api_call!(self.log_config, "POST /functions/set-username");
        let result = self.backend.set_username(&username).await;
        self.username_prompt.submitting = false;

        match result {
            Ok(user) => {
                self.username_prompt = UsernamePromptState::default();
                self.notice = Some(Notice::info(format!("Welcome, {}!", user.display_name())));
                self.current_user = Some(user);
                self.screen = Screen::Main;
                self.load_current_tab().await?;
            }
            Err(ApiError::Conflict(_)) => {
                self.username_prompt.error = Some("That username is taken".to_string());
            }
            Err(ApiError::BadRequest(msg)) => {
                self.username_prompt.error = Some(msg);
            }
            Err(e) => {
                self.username_prompt.error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    /// Validate and send the composer. Validation problems stay in the form.
    pub async fn submit_composer(&mut self) -> Result<()> {
        let Some(composer) = self.composer.as_mut() else {
            return Ok(());
        };
        composer.errors = ValidationErrors::new();

        let block = match parse_time_block(&composer.time_block) {
            Ok(block) => block,
            Err(errors) => {
                composer.errors = errors;
                return Ok(());
            }
        };

        match composer.mode {
            ComposerMode::Post => {
                let (start_time, end_time) = block.unzip();
                if let Err(errors) = validate_post(&composer.text, start_time, end_time) {
                    composer.errors = errors;
                    return Ok(());
                }
                let request = CreatePostRequest {
                    content: composer.text.trim().to_string(),
                    start_time,
                    end_time,
                };
                composer.submitting = true;
                log_api_call!(self.log_config, "POST /posts");
                let result = self.backend.create_post(&request).await;

                match result {
                    Ok(post) => {
                        // Self and World both show the author's own posts, newest first
                        for scope in [FeedScope::Self_, FeedScope::World] {
                            if let Some(feed) = self.feeds.get_mut(&scope).filter(|f| f.loaded) {
                                feed.posts.insert(0, post.clone());
                                feed.list_state.select(Some(0));
                            }
                        }
                        self.composer = None;
                        self.notice = Some(Notice::info("Posted"));
                    }
                    Err(e) => self.composer_failed(e),
                }
            }
            ComposerMode::ScheduleEntry => {
                let Some((start_time, end_time)) = block else {
                    composer.errors.add("time_block", "A time block is required");
                    return Ok(());
                };
                let draft = ScheduleEntryDraft {
                    date: self.schedule.date,
                    start_time,
                    end_time,
                    text: composer.text.trim().to_string(),
                };
                if let Err(errors) = validate_schedule_entry(&draft) {
                    composer.errors = errors;
                    return Ok(());
                }
                composer.submitting = true;
                log_api_call!(self.log_config, "POST /functions/schedule");
                let result = self.backend.create_schedule_entry(&draft).await;

                match result {
                    Ok(entry) => {
                        if entry.date == self.schedule.date {
                            let position = self
                                .schedule
                                .entries
                                .iter()
                                .position(|e| e.start_time > entry.start_time)
                                .unwrap_or(self.schedule.entries.len());
                            self.schedule.entries.insert(position, entry);
                            self.schedule.list_state.select(Some(position));
                        }
                        self.composer = None;
                        self.notice = Some(Notice::info("Added to your schedule"));
                    }
                    Err(e) => self.composer_failed(e),
                }
            }
        }
        Ok(())
    }

    fn composer_failed(&mut self, error: ApiError) {
        log::warn!("Composer submit failed: {}", error);
        if let Some(composer) = self.composer.as_mut() {
            composer.submitting = false;
        }
        self.notice = Some(Notice::error(categorize_api_error(&error)));
    }

    /// Search for the typed query. An unchanged query keeps the current results.
    pub async fn search_users(&mut self) -> Result<()> {
        let Some(search) = self.search.as_mut() else {
            return Ok(());
        };
        let query = search.query.trim().to_string();
        if query.is_empty() {
            search.results.clear();
            search.last_query = None;
            search.list_state.select(None);
            return Ok(());
        }

        search.loading = true;
        search.error = None;
        log_api_call!(self.log_config, "GET /functions/search-users");
        let result = self.backend.search_users(&query).await;

        let Some(search) = self.search.as_mut() else {
            return Ok(());
        };
        search.loading = false;
        match result {
            Ok(results) => {
                search.list_state.select(if results.is_empty() { None } else { Some(0) });
                search.results = results;
                search.last_query = Some(search.query.clone());
            }
            Err(e) => {
                search.error = Some(categorize_api_error(&e));
            }
        }
        Ok(())
    }

    /// Follow the highlighted search result
    pub fn follow_search_selection(&mut self) {
        let Some(target) = self.search.as_ref().and_then(|s| s.selected_user()).cloned() else {
            return;
        };
        self.follow_user(&target);
    }

    pub async fn delete_account(&mut self) -> Result<()> {
        self.confirm_delete_account = false;
        log_api_call!(self.log_config, "POST /functions/delete-account");
        match self.backend.delete_account().await {
            Ok(()) => {
                log::info!("Account deleted");
                self.forget_session();
                self.reset_session_state();
                self.auth = AuthState::default();
                self.notice = Some(Notice::info("Your account was deleted"));
            }
            Err(e) => {
                log::warn!("Account deletion failed: {}", e);
                self.notice = Some(Notice::error(format!(
                    "Could not delete your account. {}",
                    categorize_api_error(&e)
                )));
            }
        }
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        // Best effort; the local session goes either way
        if let Err(e) = self.backend.logout().await {
            log::warn!("Server logout failed: {}", e);
        }
        self.forget_session();
        self.reset_session_state();
        self.auth.error = None;
        self.auth.loading = false;
        Ok(())
    }
}

fn step_selection(list_state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        list_state.select(None);
        return;
    }
    let next = match list_state.selected() {
        Some(i) => i.saturating_add_signed(delta).min(len - 1),
        None => 0,
    };
    list_state.select(Some(next));
}
