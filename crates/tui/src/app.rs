use std::collections::HashSet;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use tracing::debug;

use loupe_api::{DailyUsage, MessageBreakdown, SessionSummary};
use loupe_core::filter::{Debouncer, filter_turns};
use loupe_core::message::Message;
use loupe_core::summary::{Summary, summarize};
use loupe_core::timeline::{TimelineEvent, extract_events, merge_events};
use loupe_core::turns::{Turn, assemble_turns};

use crate::async_ops::{AsyncCommand, CommandResult, SessionPayload};
use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SessionList,
    SessionDetail,
    Usage,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Sessions,
    Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Error,
}

/// Query input plus the reusable debounce slot and the generation of the
/// most recent request issued for it.
pub struct SearchState {
    pub query: String,
    pub active: bool,
    pub generation: u64,
    pub debounce: Debouncer,
}

impl SearchState {
    fn new(quiet: Duration) -> Self {
        Self {
            query: String::new(),
            active: false,
            generation: 0,
            debounce: Debouncer::new(quiet),
        }
    }

    fn reset(&mut self) {
        self.query.clear();
        self.active = false;
        self.debounce.clear();
    }
}

/// Everything derived from one session load. Rebuilt from scratch on every
/// load; never patched incrementally.
pub struct SessionView {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub turns: Vec<Turn>,
    pub summary: Summary,
    pub breakdown: MessageBreakdown,
    /// Merged activity events, ready for layout.
    pub events: Vec<TimelineEvent>,
}

impl SessionView {
    pub fn build(payload: SessionPayload) -> Self {
        let facts = payload
            .detail
            .as_ref()
            .map(|d| d.facts())
            .unwrap_or_default();
        let turns = assemble_turns(&payload.messages);
        let summary = summarize(facts, &payload.messages);
        let events = merge_events(&extract_events(&payload.messages));
        Self {
            session_id: payload.session_id,
            messages: payload.messages,
            turns,
            summary,
            breakdown: payload.breakdown,
            events,
        }
    }
}

/// Raw-payload popup over the detail view. Shows the server-side preview
/// until the full payload arrives.
pub struct RawPopup {
    pub message_index: usize,
    pub preview: Option<String>,
    pub content: Option<String>,
    pub scroll: u16,
}

pub struct App {
    pub view: View,
    pub active_tab: Tab,
    pub config: ClientConfig,

    // ── Session list ──────────────────────────────────────────────
    pub sessions: Vec<SessionSummary>,
    pub filtered_sessions: Vec<usize>,
    pub list_state: ListState,
    pub loading_sessions: bool,
    pub session_search: SearchState,
    pub session_matches: Option<HashSet<String>>,

    // ── Session detail ────────────────────────────────────────────
    pub detail: Option<SessionView>,
    pub detail_loading: bool,
    pub load_generation: u64,
    pub turn_index: usize,
    pub message_search: SearchState,
    pub message_matches: Option<HashSet<usize>>,
    pub raw_popup: Option<RawPopup>,
    pub raw_generation: u64,

    // ── Usage ─────────────────────────────────────────────────────
    pub usage: Option<DailyUsage>,
    pub usage_loading: bool,

    // ── Shared ────────────────────────────────────────────────────
    pub flash_message: Option<(String, FlashLevel)>,
    pub pending_commands: Vec<AsyncCommand>,
}

impl App {
    pub fn new(config: ClientConfig) -> Self {
        let quiet = Duration::from_millis(config.ui.search_debounce_ms);
        Self {
            view: View::SessionList,
            active_tab: Tab::Sessions,
            config,
            sessions: Vec::new(),
            filtered_sessions: Vec::new(),
            list_state: ListState::default(),
            loading_sessions: true,
            session_search: SearchState::new(quiet),
            session_matches: None,
            detail: None,
            detail_loading: false,
            load_generation: 0,
            turn_index: 0,
            message_search: SearchState::new(quiet),
            message_matches: None,
            raw_popup: None,
            raw_generation: 0,
            usage: None,
            usage_loading: false,
            flash_message: None,
            pending_commands: Vec::new(),
        }
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    pub fn take_commands(&mut self) -> Vec<AsyncCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    pub fn selected_session(&self) -> Option<&SessionSummary> {
        let slot = self.list_state.selected()?;
        let idx = *self.filtered_sessions.get(slot)?;
        self.sessions.get(idx)
    }

    /// Turns of the loaded session, narrowed by the active message filter.
    pub fn visible_turns(&self) -> Vec<Turn> {
        match &self.detail {
            Some(view) => filter_turns(&view.turns, self.message_matches.as_ref()),
            None => Vec::new(),
        }
    }

    // ── Periodic work ─────────────────────────────────────────────

    /// Fire due debounce slots. Called once per event-loop iteration.
    pub fn tick(&mut self, now: Instant) {
        if self.session_search.debounce.fire(now) {
            self.session_search.generation += 1;
            self.pending_commands.push(AsyncCommand::SearchSessions {
                query: self.session_search.query.trim().to_string(),
                generation: self.session_search.generation,
            });
        }
        if self.message_search.debounce.fire(now)
            && let Some(view) = &self.detail
        {
            self.message_search.generation += 1;
            self.pending_commands.push(AsyncCommand::SearchMessages {
                session_id: view.session_id.clone(),
                query: self.message_search.query.trim().to_string(),
                generation: self.message_search.generation,
            });
        }
    }

    // ── Command results ───────────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        match result {
            CommandResult::Sessions(Ok(sessions)) => {
                self.loading_sessions = false;
                self.sessions = sessions;
                self.apply_session_filter();
                self.flash_info(format!("{} sessions", self.sessions.len()));
            }
            CommandResult::Sessions(Err(e)) => {
                self.loading_sessions = false;
                self.sessions.clear();
                self.apply_session_filter();
                self.flash_error(format!("Error: {e}"));
            }

            CommandResult::SessionSearch { generation, result } => {
                if generation != self.session_search.generation {
                    debug!(generation, "stale session search result, discarded");
                    return;
                }
                match result {
                    Ok(resp) => {
                        self.session_matches =
                            Some(resp.matching_session_ids.into_iter().collect());
                    }
                    Err(e) => {
                        self.session_matches = None;
                        self.flash_error(format!("Search failed: {e}"));
                    }
                }
                self.apply_session_filter();
            }

            CommandResult::SessionLoaded { generation, result } => {
                if generation != self.load_generation {
                    debug!(generation, "stale session load, discarded");
                    return;
                }
                self.detail_loading = false;
                match result {
                    Ok(payload) => {
                        self.detail = Some(SessionView::build(payload));
                        self.turn_index = 0;
                        self.view = View::SessionDetail;
                    }
                    Err(e) => {
                        self.detail = None;
                        self.view = View::SessionList;
                        self.flash_error(format!("Error: {e}"));
                    }
                }
            }

            CommandResult::MessageSearch { generation, result } => {
                if generation != self.message_search.generation {
                    debug!(generation, "stale message search result, discarded");
                    return;
                }
                match result {
                    Ok(resp) => {
                        self.message_matches = Some(resp.matching_indices.into_iter().collect());
                        self.clamp_turn_index();
                    }
                    Err(e) => {
                        self.message_matches = None;
                        self.flash_error(format!("Search failed: {e}"));
                    }
                }
            }

            CommandResult::RawMessage { generation, result } => {
                if generation != self.raw_generation {
                    debug!(generation, "stale raw message, discarded");
                    return;
                }
                match result {
                    Ok(value) => {
                        if let Some(popup) = self.raw_popup.as_mut() {
                            popup.content = Some(
                                serde_json::to_string_pretty(&value)
                                    .unwrap_or_else(|_| value.to_string()),
                            );
                        }
                    }
                    Err(e) => {
                        self.raw_popup = None;
                        self.flash_error(format!("Error: {e}"));
                    }
                }
            }

            CommandResult::DailyUsage(Ok(usage)) => {
                self.usage_loading = false;
                self.usage = Some(usage);
            }
            CommandResult::DailyUsage(Err(e)) => {
                self.usage_loading = false;
                self.usage = None;
                self.flash_error(format!("Error: {e}"));
            }
        }
    }

    pub fn apply_session_filter(&mut self) {
        self.filtered_sessions = self
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| match &self.session_matches {
                None => true,
                Some(ids) => ids.contains(&s.session_id),
            })
            .map(|(i, _)| i)
            .collect();

        match self.list_state.selected() {
            Some(slot) if slot < self.filtered_sessions.len() => {}
            _ if self.filtered_sessions.is_empty() => self.list_state.select(None),
            _ => self.list_state.select(Some(0)),
        }
    }

    fn clamp_turn_index(&mut self) {
        let count = self.visible_turns().len();
        if count == 0 {
            self.turn_index = 0;
        } else if self.turn_index >= count {
            self.turn_index = count - 1;
        }
    }

    // ── Key handling ──────────────────────────────────────────────

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.flash_message = None;

        if self.raw_popup.is_some() {
            return self.handle_raw_popup_key(key);
        }
        if self.session_search.active {
            return self.handle_session_search_key(key);
        }
        if self.message_search.active {
            return self.handle_message_search_key(key);
        }

        // Help overlay — `?` from any non-input state
        if matches!(key, KeyCode::Char('?')) {
            self.view = if self.view == View::Help {
                self.tab_home_view()
            } else {
                View::Help
            };
            return false;
        }

        // Tab switching outside the detail view
        if !matches!(self.view, View::SessionDetail) {
            match key {
                KeyCode::Char('1') => {
                    self.switch_tab(Tab::Sessions);
                    return false;
                }
                KeyCode::Char('2') => {
                    self.switch_tab(Tab::Usage);
                    return false;
                }
                _ => {}
            }
        }

        match self.view {
            View::SessionList => self.handle_list_key(key),
            View::SessionDetail => self.handle_detail_key(key),
            View::Usage => self.handle_usage_key(key),
            View::Help => {
                // Any key exits help
                self.view = self.tab_home_view();
                false
            }
        }
    }

    fn tab_home_view(&self) -> View {
        match self.active_tab {
            Tab::Sessions => View::SessionList,
            Tab::Usage => View::Usage,
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.view = self.tab_home_view();
        if tab == Tab::Usage && self.usage.is_none() && !self.usage_loading {
            self.usage_loading = true;
            self.pending_commands.push(AsyncCommand::FetchDailyUsage);
        }
    }

    fn handle_list_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.list_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list_prev(),
            KeyCode::Char('g') => self.list_select(0),
            KeyCode::Char('G') => self.list_select(self.filtered_sessions.len().saturating_sub(1)),
            KeyCode::Char('/') => self.session_search.active = true,
            KeyCode::Char('r') => {
                self.loading_sessions = true;
                self.pending_commands.push(AsyncCommand::FetchSessions);
            }
            KeyCode::Esc => {
                self.session_search.reset();
                self.session_matches = None;
                self.apply_session_filter();
            }
            KeyCode::Enter => self.open_selected_session(),
            _ => {}
        }
        false
    }

    fn handle_detail_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => self.leave_detail(),
            KeyCode::Esc => {
                if self.message_matches.is_some() || !self.message_search.query.is_empty() {
                    self.message_search.reset();
                    self.message_matches = None;
                } else {
                    self.leave_detail();
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let count = self.visible_turns().len();
                if count > 0 {
                    self.turn_index = (self.turn_index + 1).min(count - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.turn_index = self.turn_index.saturating_sub(1);
            }
            KeyCode::Char('g') => self.turn_index = 0,
            KeyCode::Char('G') => {
                self.turn_index = self.visible_turns().len().saturating_sub(1);
            }
            KeyCode::Char('/') => self.message_search.active = true,
            KeyCode::Enter => self.open_raw_popup(),
            _ => {}
        }
        false
    }

    fn handle_usage_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.switch_tab(Tab::Sessions),
            KeyCode::Char('r') => {
                self.usage_loading = true;
                self.pending_commands.push(AsyncCommand::FetchDailyUsage);
            }
            _ => {}
        }
        false
    }

    fn handle_raw_popup_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.raw_popup = None,
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(popup) = self.raw_popup.as_mut() {
                    popup.scroll = popup.scroll.saturating_add(2);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(popup) = self.raw_popup.as_mut() {
                    popup.scroll = popup.scroll.saturating_sub(2);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_session_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                self.session_search.reset();
                self.session_matches = None;
                self.apply_session_filter();
            }
            KeyCode::Enter => self.session_search.active = false,
            KeyCode::Backspace => {
                self.session_search.query.pop();
                self.on_session_query_changed();
            }
            KeyCode::Char(c) => {
                self.session_search.query.push(c);
                self.on_session_query_changed();
            }
            _ => {}
        }
        false
    }

    fn handle_message_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                self.message_search.reset();
                self.message_matches = None;
            }
            KeyCode::Enter => self.message_search.active = false,
            KeyCode::Backspace => {
                self.message_search.query.pop();
                self.on_message_query_changed();
            }
            KeyCode::Char(c) => {
                self.message_search.query.push(c);
                self.on_message_query_changed();
            }
            _ => {}
        }
        false
    }

    /// An emptied query clears results immediately without a request; any
    /// other edit re-arms the debounce slot.
    fn on_session_query_changed(&mut self) {
        if self.session_search.query.trim().is_empty() {
            self.session_search.debounce.clear();
            self.session_matches = None;
            self.apply_session_filter();
        } else {
            self.session_search.debounce.rearm(Instant::now());
        }
    }

    fn on_message_query_changed(&mut self) {
        if self.message_search.query.trim().is_empty() {
            self.message_search.debounce.clear();
            self.message_matches = None;
        } else {
            self.message_search.debounce.rearm(Instant::now());
        }
    }

    // ── Navigation ────────────────────────────────────────────────

    fn list_next(&mut self) {
        if self.filtered_sessions.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.filtered_sessions.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn list_prev(&mut self) {
        if self.filtered_sessions.is_empty() {
            return;
        }
        let prev = self.list_state.selected().unwrap_or(0).saturating_sub(1);
        self.list_state.select(Some(prev));
    }

    fn list_select(&mut self, slot: usize) {
        if !self.filtered_sessions.is_empty() {
            self.list_state.select(Some(slot));
        }
    }

    fn open_selected_session(&mut self) {
        let Some(session) = self.selected_session() else {
            return;
        };
        let session_id = session.session_id.clone();
        self.load_generation += 1;
        self.detail_loading = true;
        self.message_search.reset();
        self.message_matches = None;
        self.view = View::SessionDetail;
        self.pending_commands.push(AsyncCommand::LoadSession {
            session_id,
            generation: self.load_generation,
        });
    }

    fn leave_detail(&mut self) {
        self.view = View::SessionList;
        self.detail = None;
        self.message_search.reset();
        self.message_matches = None;
        self.turn_index = 0;
    }

    fn open_raw_popup(&mut self) {
        let turns = self.visible_turns();
        let Some(turn) = turns.get(self.turn_index) else {
            return;
        };
        let Some(&message_index) = turn.message_indices().first() else {
            return;
        };
        let Some(view) = &self.detail else {
            return;
        };
        let preview = view
            .messages
            .iter()
            .find(|m| m.index == message_index)
            .and_then(|m| m.preview.clone());
        self.raw_generation += 1;
        self.raw_popup = Some(RawPopup {
            message_index,
            preview,
            content: None,
            scroll: 0,
        });
        self.pending_commands.push(AsyncCommand::FetchRawMessage {
            session_id: view.session_id.clone(),
            index: message_index,
            generation: self.raw_generation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_api::{MessageSearchResponse, SessionSearchResponse};
    use loupe_core::testing;

    fn session(id: &str) -> SessionSummary {
        SessionSummary {
            session_id: id.to_string(),
            project_name: "proj".to_string(),
            project_path: "/tmp/proj".to_string(),
            start_time: None,
            end_time: None,
            duration_seconds: None,
            agent_time_seconds: None,
            tool_time_seconds: None,
            input_tokens: None,
            output_tokens: None,
            commit_count: 0,
            error_count: 0,
            tool_loc: None,
            git_loc: None,
        }
    }

    fn app_with_sessions(ids: &[&str]) -> App {
        let mut app = App::new(ClientConfig::default());
        app.apply_command_result(CommandResult::Sessions(Ok(ids
            .iter()
            .map(|id| session(id))
            .collect())));
        app
    }

    #[test]
    fn session_load_populates_filtered_list() {
        let app = app_with_sessions(&["a", "b", "c"]);
        assert_eq!(app.filtered_sessions, vec![0, 1, 2]);
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn match_set_narrows_session_rows() {
        let mut app = app_with_sessions(&["a", "b", "c"]);
        app.session_search.generation = 1;
        app.apply_command_result(CommandResult::SessionSearch {
            generation: 1,
            result: Ok(SessionSearchResponse {
                query: "x".to_string(),
                matching_session_ids: vec!["b".to_string()],
            }),
        });
        assert_eq!(app.filtered_sessions, vec![1]);
    }

    #[test]
    fn stale_search_result_is_discarded() {
        let mut app = app_with_sessions(&["a", "b"]);
        app.session_search.generation = 5;
        app.apply_command_result(CommandResult::SessionSearch {
            generation: 4,
            result: Ok(SessionSearchResponse {
                query: "old".to_string(),
                matching_session_ids: vec![],
            }),
        });
        // The stale empty set must not clobber the unfiltered list.
        assert_eq!(app.filtered_sessions, vec![0, 1]);
    }

    #[test]
    fn stale_session_load_is_discarded() {
        let mut app = app_with_sessions(&["a"]);
        app.load_generation = 3;
        app.apply_command_result(CommandResult::SessionLoaded {
            generation: 2,
            result: Ok(SessionPayload {
                session_id: "a".to_string(),
                detail: None,
                messages: vec![],
                breakdown: MessageBreakdown::default(),
            }),
        });
        assert!(app.detail.is_none());
        assert_eq!(app.view, View::SessionList);
    }

    #[test]
    fn debounce_fires_one_search_command() {
        let mut app = app_with_sessions(&["a"]);
        app.session_search.active = true;
        app.handle_key(KeyCode::Char('f'));
        app.handle_key(KeyCode::Char('o'));
        assert!(app.take_commands().is_empty());

        app.tick(Instant::now() + Duration::from_millis(400));
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            &commands[0],
            AsyncCommand::SearchSessions { query, generation: 1 } if query == "fo"
        ));

        // The slot disarmed itself: no second fire.
        app.tick(Instant::now() + Duration::from_secs(1));
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn emptying_the_query_clears_without_a_request() {
        let mut app = app_with_sessions(&["a", "b"]);
        app.session_matches = Some(HashSet::from(["a".to_string()]));
        app.apply_session_filter();
        assert_eq!(app.filtered_sessions.len(), 1);

        app.session_search.active = true;
        app.session_search.query = "x".to_string();
        app.handle_key(KeyCode::Backspace);

        assert!(app.session_matches.is_none());
        assert_eq!(app.filtered_sessions.len(), 2);
        app.tick(Instant::now() + Duration::from_secs(1));
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn loaded_session_recomputes_turns_and_timeline() {
        let mut app = app_with_sessions(&["a"]);
        let mut call = testing::assistant(1, "hello", 2000);
        call.tool_uses.push(testing::tool_use("t", "Bash"));
        call.duration_seconds = Some(2.0);
        let messages = vec![
            testing::user(0, "hi", 0),
            call,
            testing::tool_result_msg(2, "t", 2500),
        ];

        app.load_generation = 1;
        app.apply_command_result(CommandResult::SessionLoaded {
            generation: 1,
            result: Ok(SessionPayload {
                session_id: "a".to_string(),
                detail: None,
                messages,
                breakdown: MessageBreakdown::default(),
            }),
        });

        let view = app.detail.as_ref().unwrap();
        assert_eq!(view.turns.len(), 2);
        assert!(!view.events.is_empty());
        assert_eq!(app.view, View::SessionDetail);
    }

    #[test]
    fn message_filter_narrows_visible_turns() {
        let mut app = app_with_sessions(&["a"]);
        app.load_generation = 1;
        app.apply_command_result(CommandResult::SessionLoaded {
            generation: 1,
            result: Ok(SessionPayload {
                session_id: "a".to_string(),
                detail: None,
                messages: vec![
                    testing::user(0, "first", 0),
                    testing::user(1, "second", 1000),
                ],
                breakdown: MessageBreakdown::default(),
            }),
        });
        assert_eq!(app.visible_turns().len(), 2);

        app.message_search.generation = 1;
        app.apply_command_result(CommandResult::MessageSearch {
            generation: 1,
            result: Ok(MessageSearchResponse {
                query: "second".to_string(),
                matching_indices: vec![1],
            }),
        });
        assert_eq!(app.visible_turns().len(), 1);
    }
}
