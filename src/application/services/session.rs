//! Per-conversation game session
//!
//! A session owns the characters in play and serializes narrative turns.
//! The session mutex is held across the full LLM round trip: two inputs for
//! the same conversation are processed strictly in arrival order, at the
//! cost of blocking status reads on that session while a turn is in flight.
//! A watchdog task reads the activity clock outside that mutex and
//! force-stops the session after prolonged inactivity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::application::ports::outbound::{LlmError, LlmPort};
use crate::application::services::prompt_builder::PromptBuilder;
use crate::application::services::rule_checker::RuleChecker;
use crate::application::services::update_parser::parse_character_update;
use crate::domain::entities::{apply_character_update, Character};
use crate::domain::value_objects::{ChatId, GameInput, GameOutput, PlayerId};

/// Narrative lifecycle of a session, independent of character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting to be started (or stopped).
    Idle,
    /// Accepting player input.
    Active,
    /// A turn is in flight; new input is rejected.
    Processing,
    /// Paused by the game master.
    Paused,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {id} is not active (state: {state:?})")]
    NotActive { id: String, state: SessionState },
    #[error("failed to generate response: {0}")]
    Llm(#[from] LlmError),
    #[error("session {0} was cancelled during the turn")]
    Cancelled(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity window after which the watchdog stops the session.
    pub inactivity_timeout: Duration,
    /// How often the watchdog checks the activity clock.
    pub watchdog_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(30 * 60),
            watchdog_interval: Duration::from_secs(1),
        }
    }
}

/// State guarded by the session mutex.
struct SessionInner {
    state: SessionState,
    characters: HashMap<PlayerId, Character>,
    prompt_builder: PromptBuilder,
}

impl SessionInner {
    fn character_sheets(&self) -> Vec<String> {
        self.characters.values().map(|c| c.sheet.clone()).collect()
    }
}

/// An active game session for one conversation.
pub struct GameSession {
    pub id: String,
    pub chat_id: ChatId,
    pub campaign: String,
    started_at: DateTime<Utc>,
    /// Activity clock, readable without the session mutex so the watchdog
    /// never waits behind an in-flight LLM call.
    last_activity: RwLock<DateTime<Utc>>,
    inner: tokio::sync::Mutex<SessionInner>,
    llm: Arc<dyn LlmPort>,
    rule_checker: RuleChecker,
    cancel: CancellationToken,
    config: SessionConfig,
}

impl GameSession {
    pub fn new(chat_id: ChatId, campaign: impl Into<String>, llm: Arc<dyn LlmPort>) -> Self {
        Self::with_config(chat_id, campaign, llm, SessionConfig::default())
    }

    pub fn with_config(
        chat_id: ChatId,
        campaign: impl Into<String>,
        llm: Arc<dyn LlmPort>,
        config: SessionConfig,
    ) -> Self {
        let campaign = campaign.into();
        Self {
            id: format!("{}_{}", campaign, chat_id),
            chat_id,
            campaign: campaign.clone(),
            started_at: Utc::now(),
            last_activity: RwLock::new(Utc::now()),
            inner: tokio::sync::Mutex::new(SessionInner {
                state: SessionState::Idle,
                characters: HashMap::new(),
                prompt_builder: PromptBuilder::new(campaign),
            }),
            llm,
            rule_checker: RuleChecker::new(),
            cancel: CancellationToken::new(),
            config,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Mark the session active and start its watchdog.
    pub async fn start(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = SessionState::Active;
        }
        self.touch();
        tracing::info!(session = %self.id, campaign = %self.campaign, "session started");

        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.watchdog_loop().await;
        });
    }

    /// Cancel any in-flight turn and return the session to Idle.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Idle;
        tracing::info!(session = %self.id, "session stopped");
    }

    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Paused;
    }

    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.state == SessionState::Active
    }

    pub fn llm_provider(&self) -> Arc<dyn LlmPort> {
        Arc::clone(&self.llm)
    }

    pub async fn add_character(&self, player_id: PlayerId, character: Character) {
        let mut inner = self.inner.lock().await;
        tracing::info!(
            session = %self.id,
            player = %player_id,
            character = %character.name,
            "character joined session"
        );
        inner.characters.insert(player_id, character);
    }

    pub async fn remove_character(&self, player_id: &PlayerId) -> Option<Character> {
        let mut inner = self.inner.lock().await;
        inner.characters.remove(player_id)
    }

    pub async fn character(&self, player_id: &PlayerId) -> Option<Character> {
        let inner = self.inner.lock().await;
        inner.characters.get(player_id).cloned()
    }

    pub async fn all_character_sheets(&self) -> Vec<String> {
        self.inner.lock().await.character_sheets()
    }

    pub async fn set_scenario(&self, scenario: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.prompt_builder.set_scenario(scenario);
    }

    pub async fn add_rule(&self, rule: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.prompt_builder.add_rule(rule);
    }

    /// Run one narrative turn.
    ///
    /// The session mutex is held for the entire LLM round trip; cancellation
    /// via the session's token aborts the turn with no partial update.
    pub async fn process_input(&self, input: GameInput) -> Result<GameOutput, SessionError> {
        let mut inner = self.inner.lock().await;

        if inner.state != SessionState::Active {
            return Err(SessionError::NotActive {
                id: self.id.clone(),
                state: inner.state,
            });
        }
        inner.state = SessionState::Processing;
        self.touch();

        let sheets = inner.character_sheets();
        let prompt = inner.prompt_builder.build_game_prompt(&input, &sheets);

        // Advisory only; findings never block the turn.
        for warning in self.rule_checker.check(&input) {
            tracing::warn!(session = %self.id, warning = %warning, "rule check");
        }

        let response = tokio::select! {
            result = self.llm.generate(&prompt, &sheets) => result,
            _ = self.cancel.cancelled() => {
                inner.state = SessionState::Active;
                return Err(SessionError::Cancelled(self.id.clone()));
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                inner.state = SessionState::Active;
                return Err(SessionError::Llm(e));
            }
        };

        inner.state = SessionState::Active;

        let update = parse_character_update(&response);
        if !update.is_empty() {
            // Applied to every character in the session, not just the acting
            // player's. Inherited behavior.
            for character in inner.characters.values_mut() {
                let (sheet, warnings) = apply_character_update(&character.sheet, &update);
                for warning in warnings {
                    tracing::info!(
                        session = %self.id,
                        character = %character.name,
                        warning = %warning,
                        "character update"
                    );
                }
                character.sheet = sheet;
                character.last_update = Utc::now();
            }
        }

        Ok(GameOutput::gm(response))
    }

    /// How long the session has been without input.
    pub fn idle_for(&self) -> chrono::Duration {
        let last = *self
            .last_activity
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Utc::now() - last
    }

    fn touch(&self) {
        let mut last = self
            .last_activity
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Utc::now();
    }

    async fn watchdog_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.watchdog_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let timeout = chrono::Duration::from_std(self.config.inactivity_timeout)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if self.idle_for() > timeout {
                        tracing::info!(
                            session = %self.id,
                            idle_minutes = self.idle_for().num_minutes(),
                            "session timed out"
                        );
                        self.stop().await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::entities::Character;

    struct StubLlm {
        reply: String,
        calls: AtomicUsize,
    }

    impl StubLlm {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmPort for StubLlm {
        async fn generate(&self, _: &str, _: &[String]) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmPort for FailingLlm {
        async fn generate(&self, _: &str, _: &[String]) -> Result<String, LlmError> {
            Err(LlmError::Api("backend down".to_string()))
        }
    }

    fn character(name: &str, sheet: &str) -> Character {
        Character::new(name, PathBuf::from(format!("{name}.md")), sheet)
    }

    #[tokio::test]
    async fn input_on_an_idle_session_is_rejected() {
        let session = Arc::new(GameSession::new(
            ChatId(1),
            "test",
            StubLlm::new("ответ"),
        ));
        let err = session
            .process_input(GameInput::player("привет"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotActive {
                state: SessionState::Idle,
                ..
            }
        ));
        // Rejection does not mutate state.
        assert!(!session.is_active().await);
    }

    #[tokio::test]
    async fn input_on_a_paused_session_is_rejected() {
        let session = Arc::new(GameSession::new(
            ChatId(1),
            "test",
            StubLlm::new("ответ"),
        ));
        session.start().await;
        session.pause().await;
        let err = session
            .process_input(GameInput::player("привет"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotActive {
                state: SessionState::Paused,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn turn_returns_gm_output_and_reactivates() {
        let llm = StubLlm::new("Трактирщик кивает вам.");
        let session = Arc::new(GameSession::new(ChatId(7), "Враг внутри", llm.clone()));
        session.start().await;

        let output = session
            .process_input(GameInput::player("Захожу в таверну"))
            .await
            .unwrap();
        assert_eq!(output.content, "Трактирщик кивает вам.");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(session.is_active().await);
    }

    #[tokio::test]
    async fn llm_error_reverts_to_active_with_typed_error() {
        let session = Arc::new(GameSession::new(ChatId(7), "test", Arc::new(FailingLlm)));
        session.start().await;

        let err = session
            .process_input(GameInput::player("ау"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Llm(_)));
        // Never stuck in Processing.
        assert!(session.is_active().await);
    }

    #[tokio::test]
    async fn narrative_deltas_are_applied_to_every_character() {
        let llm = StubLlm::new("Гюнтер получил 3 урона в стычке.");
        let session = Arc::new(GameSession::new(ChatId(7), "test", llm));
        session.start().await;

        session
            .add_character(PlayerId::new("p1"), character("Гюнтер", "# Имя: Гюнтер\nHP: 10\n"))
            .await;
        session
            .add_character(PlayerId::new("p2"), character("Эльза", "# Имя: Эльза\nHP: 8\n"))
            .await;

        session
            .process_input(GameInput::player("Вступаю в драку"))
            .await
            .unwrap();

        // Both sheets took the damage - scoping to the acting player is
        // flagged but intentionally not done.
        let p1 = session.character(&PlayerId::new("p1")).await.unwrap();
        let p2 = session.character(&PlayerId::new("p2")).await.unwrap();
        assert!(p1.sheet.contains("HP: 7"));
        assert!(p2.sheet.contains("HP: 5"));
        assert!(p1.sheet.contains("*(Обновлено:"));
    }

    #[tokio::test]
    async fn watchdog_stops_a_stale_session() {
        let config = SessionConfig {
            inactivity_timeout: Duration::from_millis(50),
            watchdog_interval: Duration::from_millis(10),
        };
        let session = Arc::new(GameSession::with_config(
            ChatId(7),
            "test",
            StubLlm::new("ответ"),
            config,
        ));
        session.start().await;
        assert!(session.is_active().await);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!session.is_active().await);
    }

    #[tokio::test]
    async fn cancellation_aborts_an_in_flight_turn() {
        struct SlowLlm;

        #[async_trait]
        impl LlmPort for SlowLlm {
            async fn generate(&self, _: &str, _: &[String]) -> Result<String, LlmError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("слишком поздно".to_string())
            }
        }

        let session = Arc::new(GameSession::new(ChatId(7), "test", Arc::new(SlowLlm)));
        session.start().await;

        let turn = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.process_input(GameInput::player("ау")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.cancel.cancel();

        let err = turn.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::Cancelled(_)));
    }

    #[tokio::test]
    async fn turns_for_one_session_are_serialized_in_order() {
        struct RecordingLlm {
            log: tokio::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl LlmPort for RecordingLlm {
            async fn generate(&self, prompt: &str, _: &[String]) -> Result<String, LlmError> {
                // Hold the turn briefly so overlap would be visible.
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.log.lock().await.push(prompt.to_string());
                Ok("ок".to_string())
            }
        }

        let llm = Arc::new(RecordingLlm {
            log: tokio::sync::Mutex::new(Vec::new()),
        });
        let session = Arc::new(GameSession::new(ChatId(7), "test", llm.clone()));
        session.start().await;

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .process_input(GameInput::player("первый"))
                    .await
                    .unwrap()
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .process_input(GameInput::player("второй"))
                    .await
                    .unwrap()
            })
        };

        first.await.unwrap();
        second.await.unwrap();

        let log = llm.log.lock().await;
        assert_eq!(log.len(), 2);
        assert!(log[0].contains("первый"));
        assert!(log[1].contains("второй"));
    }
}
