use chrono::{Local, NaiveDate};
use daybook_types::{FeedScope, FollowEdge, Post, ScheduleEntry, User, UserSummary, ValidationErrors};
use ratatui::widgets::ListState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::Backend;
use crate::config::ConfigManager;
use crate::logging::LogConfig;
use crate::optimistic::InFlight;

use super::mutations::{Completion, PendingMutation};

/// How long a notice stays on screen
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    /// Signed in but no username claimed yet
    UsernamePrompt,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Self_,
    Friends,
    World,
    Requests,
    Schedule,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Self_, Tab::Friends, Tab::World, Tab::Requests, Tab::Schedule];

    pub fn next(&self) -> Self {
        match self {
            Tab::Self_ => Tab::Friends,
            Tab::Friends => Tab::World,
            Tab::World => Tab::Requests,
            Tab::Requests => Tab::Schedule,
            Tab::Schedule => Tab::Self_,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Tab::Self_ => Tab::Schedule,
            Tab::Friends => Tab::Self_,
            Tab::World => Tab::Friends,
            Tab::Requests => Tab::World,
            Tab::Schedule => Tab::Requests,
        }
    }

    /// The feed shown on this tab, if it is a feed tab
    pub fn scope(&self) -> Option<FeedScope> {
        match self {
            Tab::Self_ => Some(FeedScope::Self_),
            Tab::Friends => Some(FeedScope::Friends),
            Tab::World => Some(FeedScope::World),
            Tab::Requests | Tab::Schedule => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Requests => "Requests",
            Tab::Schedule => "Schedule",
            feed => feed.scope().map(|s| s.title()).unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message shown in the status bar
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created: Instant,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Info,
            created: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Error,
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= NOTICE_TTL
    }
}

/// One feed's posts and selection
#[derive(Debug, Default)]
pub struct FeedState {
    pub posts: Vec<Post>,
    pub list_state: ListState,
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
}

impl FeedState {
    pub fn selected_post(&self) -> Option<&Post> {
        self.list_state.selected().and_then(|i| self.posts.get(i))
    }
}

/// Incoming requests are listed first, then outgoing follows
#[derive(Debug, Default)]
pub struct RequestsState {
    pub incoming: Vec<FollowEdge>,
    pub outgoing: Vec<FollowEdge>,
    pub list_state: ListState,
    pub loading: bool,
    pub error: Option<String>,
}

/// What the combined requests selection points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSelection {
    Incoming(usize),
    Outgoing(usize),
}

impl RequestsState {
    pub fn len(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn selection(&self) -> Option<RequestSelection> {
        let index = self.list_state.selected()?;
        if index < self.incoming.len() {
            Some(RequestSelection::Incoming(index))
        } else if index < self.len() {
            Some(RequestSelection::Outgoing(index - self.incoming.len()))
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct ScheduleState {
    pub date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
    pub list_state: ListState,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            date: Local::now().date_naive(),
            entries: Vec::new(),
            list_state: ListState::default(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerMode {
    Post,
    ScheduleEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerField {
    Text,
    TimeBlock,
}

/// New post or schedule entry form.
///
/// `errors` holds field-level validation failures so they render next to the input.
#[derive(Debug, Clone)]
pub struct ComposerState {
    pub mode: ComposerMode,
    pub text: String,
    pub time_block: String,
    pub focus: ComposerField,
    pub errors: ValidationErrors,
    pub submitting: bool,
}

impl ComposerState {
    pub fn new(mode: ComposerMode) -> Self {
        Self {
            mode,
            text: String::new(),
            time_block: String::new(),
            focus: ComposerField::Text,
            errors: ValidationErrors::new(),
            submitting: false,
        }
    }

    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            ComposerField::Text => &mut self.text,
            ComposerField::TimeBlock => &mut self.time_block,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            ComposerField::Text => ComposerField::TimeBlock,
            ComposerField::TimeBlock => ComposerField::Text,
        };
    }

    /// Message for the text input, whichever field name the validator used
    pub fn text_error(&self) -> Option<&str> {
        self.errors
            .for_field("content")
            .or_else(|| self.errors.for_field("text"))
    }

    pub fn time_error(&self) -> Option<&str> {
        self.errors
            .for_field("time_block")
            .or_else(|| self.errors.for_field("start_time"))
            .or_else(|| self.errors.for_field("end_time"))
    }
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    /// Query the current results belong to
    pub last_query: Option<String>,
    pub results: Vec<UserSummary>,
    pub list_state: ListState,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchState {
    pub fn selected_user(&self) -> Option<&UserSummary> {
        self.list_state.selected().and_then(|i| self.results.get(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Default)]
pub struct AuthState {
    pub email: String,
    pub mode: AuthMode,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct UsernamePromptState {
    pub input: String,
    pub error: Option<String>,
    pub submitting: bool,
}

/// Main application state
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub backend: Arc<dyn Backend>,
    pub current_user: Option<User>,
    pub current_tab: Tab,
    pub feeds: HashMap<FeedScope, FeedState>,
    pub requests: RequestsState,
    pub schedule: ScheduleState,
    pub composer: Option<ComposerState>,
    pub search: Option<SearchState>,
    pub auth: AuthState,
    pub username_prompt: UsernamePromptState,
    pub notice: Option<Notice>,
    pub confirm_delete_account: bool,
    pub show_help: bool,
    /// Items with a remote mutation outstanding
    pub inflight: InFlight,
    pub pending: HashMap<u64, (String, PendingMutation)>,
    pub next_mutation_id: u64,
    pub completion_tx: UnboundedSender<Completion>,
    pub completion_rx: UnboundedReceiver<Completion>,
    pub log_config: LogConfig,
    /// `None` when running without a writable config directory
    pub config_manager: Option<ConfigManager>,
}
