use marquee_metadata::MetadataError;
use marquee_metadata::models::SearchSuggestion;
use marquee_metadata::source::is_suggestion_query;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Query too short; nothing shown, nothing scheduled.
    Idle,
    /// Debounce timer armed for the current query.
    Pending,
    /// Request in flight for the current query.
    Loading,
    /// Latest request finished (possibly with zero results).
    Populated,
    /// Hidden after blur, outside click, explicit close or a selection.
    Closed,
}

/// UI events fed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// The input text changed.
    #[serde(rename = "input")]
    Typed { text: String },
    Focus,
    Blur,
    /// Explicit close or a click outside the dropdown.
    Close,
    /// A suggestion was picked and navigation happened.
    Select,
}

/// Work the owner of a [`Machine`] must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the debounce timer; report back with this token.
    ArmDebounce { token: u64 },
    CancelDebounce,
    /// Issue one suggestion request; report back with this token.
    Fetch { token: u64, query: String },
    /// Abort the request in flight, if any.
    CancelFetch,
    ArmBlurGrace { token: u64 },
    CancelBlurGrace,
}

/// What a dropdown renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub query: String,
    pub suggestions: Vec<SearchSuggestion>,
    pub loading: bool,
    pub visible: bool,
    /// The last request failed; `suggestions` is empty because of it.
    pub failed: bool,
    /// Link to the full search page, offered whenever results are shown.
    pub search_url: Option<String>,
}

/// Per-input-field suggestion state.
///
/// `generation` is bumped whenever the current query stops being current
/// (new text, close, selection). Timers and responses carry the generation
/// they were started for and are ignored when it no longer matches.
#[derive(Debug)]
pub struct Machine {
    phase: Phase,
    query: String,
    suggestions: Vec<SearchSuggestion>,
    failed: bool,
    /// Query the current `suggestions` (or failure) answer.
    answered: Option<String>,
    focused: bool,
    generation: u64,
    in_flight: Option<u64>,
    blur_token: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            query: String::new(),
            suggestions: Vec::new(),
            failed: false,
            answered: None,
            focused: true,
            generation: 0,
            in_flight: None,
            blur_token: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Typed { text } => self.typed(text),
            Input::Focus => self.focus(),
            Input::Blur => self.blur(),
            Input::Close => self.close(),
            Input::Select => self.select(),
        }
    }

    fn typed(&mut self, text: String) -> Vec<Effect> {
        let active = matches!(
            self.phase,
            Phase::Pending | Phase::Loading | Phase::Populated
        );
        if active && text == self.query {
            return Vec::new();
        }

        self.query = text;
        self.focused = true;
        let mut effects = Vec::new();
        self.supersede(&mut effects);

        if !is_suggestion_query(&self.query) {
            self.phase = Phase::Idle;
            self.suggestions.clear();
            self.failed = false;
            self.answered = None;
            return effects;
        }

        // Previous suggestions stay on screen until the new ones arrive.
        self.phase = Phase::Pending;
        effects.push(Effect::ArmDebounce {
            token: self.generation,
        });
        effects
    }

    /// The debounce timer armed with `token` fired.
    pub fn debounce_elapsed(&mut self, token: u64) -> Vec<Effect> {
        if self.phase != Phase::Pending || token != self.generation {
            debug!(token, generation = self.generation, "ignoring superseded debounce");
            return Vec::new();
        }
        self.phase = Phase::Loading;
        self.in_flight = Some(token);
        vec![Effect::Fetch {
            token,
            query: self.query.trim().to_string(),
        }]
    }

    /// The request started with `token` completed.
    pub fn fetch_finished(
        &mut self,
        token: u64,
        result: Result<Vec<SearchSuggestion>, MetadataError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(token) || token != self.generation {
            debug!(token, generation = self.generation, "discarding stale suggestions");
            return Vec::new();
        }
        self.in_flight = None;
        self.answered = Some(self.query.trim().to_string());

        match result {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                self.failed = false;
            }
            Err(e) => {
                warn!(query = %self.query, error = %e, "suggestion request failed");
                self.suggestions.clear();
                self.failed = true;
            }
        }
        self.phase = Phase::Populated;
        Vec::new()
    }

    fn blur(&mut self) -> Vec<Effect> {
        self.focused = false;
        self.blur_token += 1;
        vec![Effect::ArmBlurGrace {
            token: self.blur_token,
        }]
    }

    /// The grace period after a blur elapsed without a refocus.
    pub fn blur_elapsed(&mut self, token: u64) -> Vec<Effect> {
        if token != self.blur_token || self.focused {
            return Vec::new();
        }
        self.close()
    }

    fn focus(&mut self) -> Vec<Effect> {
        self.focused = true;
        self.blur_token += 1;
        let mut effects = vec![Effect::CancelBlurGrace];

        if self.phase == Phase::Closed && is_suggestion_query(&self.query) {
            // Results for an older text do not count as an answer.
            if self.answered.as_deref() != Some(self.query.trim()) {
                self.generation += 1;
                self.phase = Phase::Pending;
                effects.push(Effect::ArmDebounce {
                    token: self.generation,
                });
            } else {
                self.phase = Phase::Populated;
            }
        }
        effects
    }

    fn close(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.supersede(&mut effects);
        self.blur_token += 1;
        effects.push(Effect::CancelBlurGrace);
        if self.phase != Phase::Idle {
            self.phase = Phase::Closed;
        }
        effects
    }

    fn select(&mut self) -> Vec<Effect> {
        let mut effects = self.close();
        self.query.clear();
        self.suggestions.clear();
        self.failed = false;
        self.answered = None;
        self.phase = Phase::Closed;
        effects
    }

    /// Invalidate the pending timer and any request for the current query.
    fn supersede(&mut self, effects: &mut Vec<Effect>) {
        self.generation += 1;
        effects.push(Effect::CancelDebounce);
        if self.in_flight.take().is_some() {
            effects.push(Effect::CancelFetch);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let visible = match self.phase {
            Phase::Loading | Phase::Populated => true,
            Phase::Pending => !self.suggestions.is_empty(),
            Phase::Idle | Phase::Closed => false,
        };
        let search_url = (self.phase == Phase::Populated && is_suggestion_query(&self.query))
            .then(|| {
                let q: String = form_urlencoded::byte_serialize(self.query.trim().as_bytes()).collect();
                format!("/search?q={q}")
            });

        Snapshot {
            phase: self.phase,
            query: self.query.clone(),
            suggestions: self.suggestions.clone(),
            loading: self.phase == Phase::Loading,
            visible,
            failed: self.failed,
            search_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::types::ContentType;

    fn typed(text: &str) -> Input {
        Input::Typed { text: text.into() }
    }

    fn suggestion(id: u64, title: &str) -> SearchSuggestion {
        SearchSuggestion {
            id,
            title: title.into(),
            content_type: ContentType::Movie,
            year: None,
            poster_path: None,
            vote_average: 0.0,
        }
    }

    fn armed_token(effects: &[Effect]) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::ArmDebounce { token } => Some(*token),
                _ => None,
            })
            .expect("debounce armed")
    }

    #[test]
    fn short_query_stays_idle_without_timer() {
        let mut m = Machine::new();
        let effects = m.handle(typed("a"));
        assert_eq!(m.phase(), Phase::Idle);
        assert!(!effects.iter().any(|e| matches!(e, Effect::ArmDebounce { .. })));
    }

    #[test]
    fn each_keystroke_supersedes_previous_timer() {
        let mut m = Machine::new();
        let first = armed_token(&m.handle(typed("ba")));
        let second = armed_token(&m.handle(typed("bat")));
        assert_ne!(first, second);

        assert!(m.debounce_elapsed(first).is_empty());
        assert_eq!(
            m.debounce_elapsed(second),
            vec![Effect::Fetch {
                token: second,
                query: "bat".into()
            }]
        );
        assert_eq!(m.phase(), Phase::Loading);
        assert!(m.snapshot().loading);
    }

    #[test]
    fn typing_while_loading_cancels_request() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("batma")));
        m.debounce_elapsed(t);

        let effects = m.handle(typed("batman"));
        assert!(effects.contains(&Effect::CancelFetch));
        assert_eq!(m.phase(), Phase::Pending);
    }

    #[test]
    fn superseded_response_does_not_overwrite_newer_result() {
        let mut m = Machine::new();
        let old = armed_token(&m.handle(typed("batma")));
        m.debounce_elapsed(old);
        let new = armed_token(&m.handle(typed("batman")));
        m.debounce_elapsed(new);

        m.fetch_finished(new, Ok(vec![suggestion(268, "Batman")]));
        m.fetch_finished(old, Ok(vec![suggestion(1, "Batma...")]));

        let snap = m.snapshot();
        assert_eq!(snap.phase, Phase::Populated);
        assert_eq!(snap.suggestions, vec![suggestion(268, "Batman")]);
    }

    #[test]
    fn failure_populates_empty_with_search_link() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("dune part")));
        m.debounce_elapsed(t);
        let effects = m.fetch_finished(t, Err(MetadataError::Upstream(502)));
        assert!(effects.is_empty(), "no automatic retry");

        let snap = m.snapshot();
        assert_eq!(snap.phase, Phase::Populated);
        assert!(snap.failed);
        assert!(snap.suggestions.is_empty());
        assert_eq!(snap.search_url.as_deref(), Some("/search?q=dune+part"));
    }

    #[test]
    fn dropping_below_two_chars_cancels_everything() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("ab")));
        m.debounce_elapsed(t);

        let effects = m.handle(typed("a"));
        assert!(effects.contains(&Effect::CancelDebounce));
        assert!(effects.contains(&Effect::CancelFetch));
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.fetch_finished(t, Ok(vec![suggestion(1, "x")])).is_empty());
        assert!(m.snapshot().suggestions.is_empty());
    }

    #[test]
    fn blur_closes_only_after_grace() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("alien")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(348, "Alien")]));

        let grace = match m.handle(Input::Blur).as_slice() {
            [Effect::ArmBlurGrace { token }] => *token,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(m.phase(), Phase::Populated);

        m.blur_elapsed(grace);
        assert_eq!(m.phase(), Phase::Closed);
        assert!(!m.snapshot().visible);
    }

    #[test]
    fn selection_during_grace_wins() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("alien")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(348, "Alien")]));

        let effects = m.handle(Input::Blur);
        let Effect::ArmBlurGrace { token: grace } = effects[0] else {
            panic!("expected grace timer");
        };
        m.handle(Input::Select);
        assert!(m.blur_elapsed(grace).is_empty());

        let snap = m.snapshot();
        assert_eq!(snap.phase, Phase::Closed);
        assert_eq!(snap.query, "");
        assert!(snap.suggestions.is_empty());
    }

    #[test]
    fn refocus_cancels_pending_close() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("alien")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(348, "Alien")]));

        let Effect::ArmBlurGrace { token: grace } = m.handle(Input::Blur)[0] else {
            panic!("expected grace timer");
        };
        m.handle(Input::Focus);
        m.blur_elapsed(grace);
        assert_eq!(m.phase(), Phase::Populated);
    }

    #[test]
    fn focus_after_close_reopens_previous_results() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("alien")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(348, "Alien")]));
        m.handle(Input::Close);
        assert_eq!(m.phase(), Phase::Closed);

        m.handle(Input::Focus);
        assert_eq!(m.phase(), Phase::Populated);
        assert!(m.snapshot().visible);
    }

    #[test]
    fn focus_after_edit_and_close_refetches_for_new_text() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("star")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(11, "Star Wars")]));

        m.handle(typed("star trek"));
        m.handle(Input::Close);
        let effects = m.handle(Input::Focus);
        let t = armed_token(&effects);
        assert_eq!(m.phase(), Phase::Pending);
        assert_eq!(m.snapshot().search_url, None);

        let effects = m.debounce_elapsed(t);
        assert_eq!(
            effects,
            vec![Effect::Fetch {
                token: t,
                query: "star trek".into()
            }]
        );
        m.fetch_finished(t, Ok(vec![suggestion(13475, "Star Trek")]));
        assert_eq!(m.phase(), Phase::Populated);
        assert_eq!(m.snapshot().suggestions[0].title, "Star Trek");
    }

    #[test]
    fn focus_after_failure_for_same_text_does_not_retry() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("heat")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Err(MetadataError::Upstream(500)));
        m.handle(Input::Close);

        let effects = m.handle(Input::Focus);
        assert_eq!(effects, vec![Effect::CancelBlurGrace]);
        assert_eq!(m.phase(), Phase::Populated);
        assert!(m.snapshot().failed);
    }

    #[test]
    fn close_while_loading_discards_late_response() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("alien")));
        m.debounce_elapsed(t);
        assert!(m.handle(Input::Close).contains(&Effect::CancelFetch));

        m.fetch_finished(t, Ok(vec![suggestion(348, "Alien")]));
        assert_eq!(m.phase(), Phase::Closed);
        assert!(m.snapshot().suggestions.is_empty());
    }

    #[test]
    fn pending_keeps_previous_suggestions_visible() {
        let mut m = Machine::new();
        let t = armed_token(&m.handle(typed("star")));
        m.debounce_elapsed(t);
        m.fetch_finished(t, Ok(vec![suggestion(11, "Star Wars")]));

        m.handle(typed("star w"));
        let snap = m.snapshot();
        assert_eq!(snap.phase, Phase::Pending);
        assert!(snap.visible);
        assert_eq!(snap.suggestions.len(), 1);
        assert_eq!(snap.search_url, None);
    }

    #[test]
    fn input_events_decode_from_json() {
        let input: Input =
            serde_json::from_str(r#"{"type":"input","text":"heat"}"#).unwrap();
        assert_eq!(input, typed("heat"));
        let blur: Input = serde_json::from_str(r#"{"type":"blur"}"#).unwrap();
        assert_eq!(blur, Input::Blur);
    }
}
