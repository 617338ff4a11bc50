//! Optimistic mutations of feed posts, follow edges and schedule entries.
//!
//! Each mutation is applied to the view on the UI task, its remote call runs
//! on a spawned task, and the result comes back over the completion channel.
//! `process_completions` settles them: confirmed mutations are left alone,
//! failed ones have their slot written back and raise a notice.

use std::future::Future;
use std::sync::Arc;

use daybook_types::{FeedScope, FollowEdge, FollowStatus, Post, ScheduleEntry, UserSummary};
use thiserror::Error;
use tokio::task::JoinError;
use uuid::Uuid;

use super::{App, Notice, RequestSelection};
use crate::api::{ApiError, ApiResult, Backend};
use crate::logging::LogConfig;
use crate::optimistic::{begin_in_list, Optimistic, Settled, Slot};
use crate::{log_debug, log_mutation};

#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The task running the remote call panicked or was cancelled
    #[error("Request stopped unexpectedly: {0}")]
    Aborted(String),
}

impl From<JoinError> for MutationError {
    fn from(e: JoinError) -> Self {
        if e.is_panic() {
            MutationError::Aborted("the request task panicked".to_string())
        } else {
            MutationError::Aborted("the request task was cancelled".to_string())
        }
    }
}

/// An applied mutation waiting for its remote result
#[derive(Debug)]
pub enum PendingMutation {
    Post {
        scope: FeedScope,
        token: Optimistic<Slot<Post>>,
    },
    /// Keyed by followee id, since the server assigns the edge id
    Outgoing(Optimistic<Slot<FollowEdge>>),
    Incoming(Optimistic<Slot<FollowEdge>>),
    Schedule(Optimistic<Slot<ScheduleEntry>>),
}

/// Result of a remote call, sent back to the UI task
#[derive(Debug)]
pub struct Completion {
    pub id: u64,
    pub result: Result<(), MutationError>,
}

pub fn post_key(post: &Post) -> Uuid {
    post.id
}

pub fn outgoing_key(edge: &FollowEdge) -> Uuid {
    edge.followee_id
}

pub fn edge_key(edge: &FollowEdge) -> Uuid {
    edge.id
}

pub fn entry_key(entry: &ScheduleEntry) -> Uuid {
    entry.id
}

/// Write back a rolled-back slot. Returns the error to report, if any.
fn settle_slot<T: Clone>(
    token: Optimistic<Slot<T>>,
    result: Result<(), MutationError>,
    list: &mut Vec<T>,
    key_of: fn(&T) -> Uuid,
) -> Option<MutationError> {
    match token.settle(result) {
        Settled::Confirmed => None,
        Settled::RolledBack { snapshot, error } => {
            snapshot.write(list, key_of);
            Some(error)
        }
    }
}

fn skipped(log_config: &LogConfig, what: &str, key: Uuid) {
    log_mutation!(log_config, "{} {} already in flight, ignoring", what, key);
}

pub(crate) fn clamp_selection(list_state: &mut ratatui::widgets::ListState, len: usize) {
    match list_state.selected() {
        _ if len == 0 => list_state.select(None),
        Some(i) if i >= len => list_state.select(Some(len - 1)),
        None => list_state.select(Some(0)),
        Some(_) => {}
    }
}

impl App {
    /// Record `mutation` and run `remote` on a spawned task
    fn dispatch<F, Fut>(&mut self, label: &str, mutation: PendingMutation, remote: F)
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = ApiResult<()>> + Send + 'static,
    {
        let id = self.next_mutation_id;
        self.next_mutation_id += 1;
        log_mutation!(self.log_config, "#{} applied: {}", id, label);
        self.pending.insert(id, (label.to_string(), mutation));

        let op = remote(Arc::clone(&self.backend));
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            // The inner task isolates panics in the remote call
            let result = match tokio::spawn(op).await {
                Ok(result) => result.map_err(MutationError::from),
                Err(e) => Err(MutationError::from(e)),
            };
            let _ = tx.send(Completion { id, result });
        });
    }

    /// Settle every completion that has arrived. Returns how many were settled.
    pub fn process_completions(&mut self) -> usize {
        let mut settled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.settle(completion);
            settled += 1;
        }
        settled
    }

    /// Wait until every pending mutation has settled
    pub async fn wait_for_mutations(&mut self) {
        while !self.pending.is_empty() {
            match self.completion_rx.recv().await {
                Some(completion) => self.settle(completion),
                None => break,
            }
        }
    }

    fn settle(&mut self, completion: Completion) {
        let Completion { id, result } = completion;
        // Discarded on logout; the guard was released with it
        let Some((label, mutation)) = self.pending.remove(&id) else {
            log_mutation!(self.log_config, "#{} settled after being discarded", id);
            return;
        };

        let failure = match mutation {
            PendingMutation::Post { scope, token } => {
                let key = token.key();
                let feed = self.feeds.entry(scope).or_default();
                let failure = settle_slot(token, result, &mut feed.posts, post_key);
                clamp_selection(&mut feed.list_state, feed.posts.len());
                if failure.is_none() {
                    self.propagate_post(scope, key);
                }
                failure
            }
            PendingMutation::Outgoing(token) => {
                settle_slot(token, result, &mut self.requests.outgoing, outgoing_key)
            }
            PendingMutation::Incoming(token) => {
                settle_slot(token, result, &mut self.requests.incoming, edge_key)
            }
            PendingMutation::Schedule(token) => {
                let failure = settle_slot(token, result, &mut self.schedule.entries, entry_key);
                clamp_selection(&mut self.schedule.list_state, self.schedule.entries.len());
                failure
            }
        };
        let len = self.requests.len();
        clamp_selection(&mut self.requests.list_state, len);

        match failure {
            None => log_mutation!(self.log_config, "#{} confirmed: {}", id, label),
            Some(error) => {
                log_mutation!(self.log_config, "#{} rolled back: {} ({})", id, label, error);
                log::warn!("Could not {}: {}", label, error);
                self.notice = Some(Notice::error(format!(
                    "Could not {}. {}",
                    label,
                    categorize_error(&error)
                )));
            }
        }
    }

    /// Ids of pending mutations in the order they were applied
    fn pending_in_order(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.pending.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Write unconfirmed changes back over a freshly loaded feed
    pub(crate) fn reapply_pending_posts(&mut self, scope: FeedScope) {
        let ids = self.pending_in_order();
        let Some(feed) = self.feeds.get_mut(&scope) else {
            return;
        };
        for id in ids {
            if let Some((_, PendingMutation::Post { scope: origin, token })) = self.pending.get(&id) {
                if *origin == scope {
                    token.applied().write(&mut feed.posts, post_key);
                }
            }
        }
    }

    /// Same as [`App::reapply_pending_posts`] for both request lists
    pub(crate) fn reapply_pending_requests(&mut self) {
        for id in self.pending_in_order() {
            match self.pending.get(&id) {
                Some((_, PendingMutation::Outgoing(token))) => {
                    token.applied().write(&mut self.requests.outgoing, outgoing_key)
                }
                Some((_, PendingMutation::Incoming(token))) => {
                    token.applied().write(&mut self.requests.incoming, edge_key)
                }
                _ => {}
            }
        }
    }

    pub(crate) fn reapply_pending_schedule(&mut self) {
        for id in self.pending_in_order() {
            if let Some((_, PendingMutation::Schedule(token))) = self.pending.get(&id) {
                let applied = token.applied();
                if applied.item.as_ref().map_or(true, |e| e.date == self.schedule.date) {
                    applied.write(&mut self.schedule.entries, entry_key);
                }
            }
        }
    }

    /// Copy a confirmed post change into the other loaded feeds
    fn propagate_post(&mut self, origin: FeedScope, key: Uuid) {
        let confirmed = self
            .feeds
            .get(&origin)
            .and_then(|feed| feed.posts.iter().find(|p| p.id == key).cloned());

        for (scope, feed) in self.feeds.iter_mut() {
            if *scope == origin {
                continue;
            }
            let Some(index) = feed.posts.iter().position(|p| p.id == key) else {
                continue;
            };
            match &confirmed {
                Some(post) => feed.posts[index] = post.clone(),
                None => {
                    feed.posts.remove(index);
                    clamp_selection(&mut feed.list_state, feed.posts.len());
                }
            }
        }
    }

    fn selected_post_in_view(&self) -> Option<(FeedScope, Post)> {
        let scope = self.current_tab.scope()?;
        let post = self.feeds.get(&scope)?.selected_post()?.clone();
        Some((scope, post))
    }

    fn is_mine(&self, author_id: Uuid) -> bool {
        self.current_user.as_ref().map(|u| u.id) == Some(author_id)
    }

    /// Like or unlike the selected post
    pub fn toggle_like_selected(&mut self) {
        let Some((scope, post)) = self.selected_post_in_view() else {
            return;
        };
        let feed = self.feeds.entry(scope).or_default();
        let Some(token) = begin_in_list(&self.inflight, &mut feed.posts, post.id, post_key, |slot| {
            slot.map_item(Post::toggle_like)
        }) else {
            skipped(&self.log_config, "post", post.id);
            return;
        };

        let post_id = post.id;
        let was_liked = post.liked_by_user;
        let label = if was_liked { "unlike the post" } else { "like the post" };
        self.dispatch(label, PendingMutation::Post { scope, token }, move |api| async move {
            if was_liked {
                api.unlike(post_id).await
            } else {
                api.like(post_id).await
            }
        });
    }

    /// Flip the completed flag on one of the user's own posts
    pub fn toggle_complete_selected(&mut self) {
        let Some((scope, post)) = self.selected_post_in_view() else {
            return;
        };
        if !self.is_mine(post.author_id) {
            self.notice = Some(Notice::error("You can only complete your own posts"));
            return;
        }

        let completed = !post.completed;
        let feed = self.feeds.entry(scope).or_default();
        let Some(token) = begin_in_list(&self.inflight, &mut feed.posts, post.id, post_key, |slot| {
            slot.map_item(|p| p.completed = completed)
        }) else {
            skipped(&self.log_config, "post", post.id);
            return;
        };

        let post_id = post.id;
        let label = if completed {
            "mark the post completed"
        } else {
            "reopen the post"
        };
        self.dispatch(label, PendingMutation::Post { scope, token }, move |api| async move {
            api.set_completed(post_id, completed).await
        });
    }

    /// Remove one of the user's own posts. It disappears at once and comes back if the delete fails.
    pub fn delete_selected_post(&mut self) {
        let Some((scope, post)) = self.selected_post_in_view() else {
            return;
        };
        if !self.is_mine(post.author_id) {
            self.notice = Some(Notice::error("You can only delete your own posts"));
            return;
        }

        let feed = self.feeds.entry(scope).or_default();
        let Some(token) =
            begin_in_list(&self.inflight, &mut feed.posts, post.id, post_key, Slot::vacated)
        else {
            skipped(&self.log_config, "post", post.id);
            return;
        };
        clamp_selection(&mut feed.list_state, feed.posts.len());

        let post_id = post.id;
        self.dispatch("delete the post", PendingMutation::Post { scope, token }, move |api| async move {
            api.delete_post(post_id).await
        });
    }

    /// Send a follow request. A pending edge shows up in the outgoing list right away.
    pub fn follow_user(&mut self, target: &UserSummary) {
        let Some(me) = self.current_user.clone() else {
            return;
        };
        if target.id == me.id {
            self.notice = Some(Notice::error("You can't follow yourself"));
            return;
        }
        if let Some(existing) = self
            .requests
            .outgoing
            .iter()
            .find(|e| e.followee_id == target.id && e.status != FollowStatus::Rejected)
        {
            let message = if existing.is_accepted() {
                format!("You already follow {}", target.username)
            } else {
                format!("Already asked to follow {}", target.username)
            };
            self.notice = Some(Notice::info(message));
            return;
        }

        let mut placeholder = FollowEdge::pending(me.id, target.id);
        placeholder.follower_username = me.username.clone();
        placeholder.followee_username = Some(target.username.clone());

        let Some(token) = begin_in_list(
            &self.inflight,
            &mut self.requests.outgoing,
            target.id,
            outgoing_key,
            |slot| slot.filled(placeholder),
        ) else {
            skipped(&self.log_config, "follow of", target.id);
            return;
        };

        let followee_id = target.id;
        self.notice = Some(Notice::info(format!("Follow request sent to {}", target.username)));
        self.dispatch("send the follow request", PendingMutation::Outgoing(token), move |api| async move {
            api.follow(followee_id).await.map(|_| ())
        });
    }

    /// Drop the selected outgoing follow, whatever its status
    pub fn unfollow_selected(&mut self) {
        let Some(RequestSelection::Outgoing(index)) = self.requests.selection() else {
            return;
        };
        let Some(followee_id) = self.requests.outgoing.get(index).map(|e| e.followee_id) else {
            return;
        };

        let Some(token) = begin_in_list(
            &self.inflight,
            &mut self.requests.outgoing,
            followee_id,
            outgoing_key,
            Slot::vacated,
        ) else {
            skipped(&self.log_config, "follow of", followee_id);
            return;
        };
        let len = self.requests.len();
        clamp_selection(&mut self.requests.list_state, len);

        self.dispatch("unfollow", PendingMutation::Outgoing(token), move |api| async move {
            api.unfollow(followee_id).await
        });
    }

    /// Accept or reject the selected incoming request
    pub fn answer_selected(&mut self, status: FollowStatus) {
        let Some(me) = self.current_user.as_ref().map(|u| u.id) else {
            return;
        };
        let Some(RequestSelection::Incoming(index)) = self.requests.selection() else {
            return;
        };
        let Some(edge) = self.requests.incoming.get(index).cloned() else {
            return;
        };

        let answered = match edge.transition(me, status) {
            Ok(next) => next,
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return;
            }
        };

        let Some(token) = begin_in_list(
            &self.inflight,
            &mut self.requests.incoming,
            edge.id,
            edge_key,
            |slot| slot.filled(answered),
        ) else {
            skipped(&self.log_config, "request", edge.id);
            return;
        };

        let edge_id = edge.id;
        let label = match status {
            FollowStatus::Accepted => "accept the request",
            _ => "reject the request",
        };
        log_debug!(self.log_config, "Answering follow request {} with {}", edge_id, status);
        self.dispatch(label, PendingMutation::Incoming(token), move |api| async move {
            api.answer_request(edge_id, status).await.map(|_| ())
        });
    }

    /// Remove the selected schedule entry
    pub fn delete_selected_entry(&mut self) {
        let Some(entry_id) = self
            .schedule
            .list_state
            .selected()
            .and_then(|i| self.schedule.entries.get(i))
            .map(|e| e.id)
        else {
            return;
        };

        let Some(token) = begin_in_list(
            &self.inflight,
            &mut self.schedule.entries,
            entry_id,
            entry_key,
            Slot::vacated,
        ) else {
            skipped(&self.log_config, "schedule entry", entry_id);
            return;
        };
        clamp_selection(&mut self.schedule.list_state, self.schedule.entries.len());

        self.dispatch("delete the entry", PendingMutation::Schedule(token), move |api| async move {
            api.delete_schedule_entry(entry_id).await
        });
    }
}

/// Turn a failed mutation into a message for the status bar
pub fn categorize_error(error: &MutationError) -> String {
    match error {
        MutationError::Api(e) => categorize_api_error(e),
        MutationError::Aborted(msg) => format!("Something went wrong: {}.", msg),
    }
}

pub fn categorize_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => {
            "Network error: could not reach the server. Check your connection and press r to refresh.".to_string()
        }
        ApiError::Unauthorized(_) => {
            "Your session expired or you are not allowed to do that. Press L to log out and sign in again.".to_string()
        }
        ApiError::NotFound(_) => "It no longer exists. Press r to refresh.".to_string(),
        ApiError::BadRequest(msg) => format!("Rejected: {}", msg),
        ApiError::Conflict(msg) => format!("Conflict: {}", msg),
        ApiError::Serialization(_) => "The server sent a response we could not read.".to_string(),
        ApiError::Api(msg) => {
            let lower = msg.to_lowercase();
            if ["500", "502", "503", "internal"].iter().any(|s| lower.contains(s)) {
                "Server error: please try again later.".to_string()
            } else {
                format!("Error: {}", msg)
            }
        }
    }
}
