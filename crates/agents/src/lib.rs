mod session;
mod suggestions;

use std::sync::Arc;
use std::time::{Duration, Instant};

use folio_core::{
    contains_link, normalize_text, ConversationMessage, Profile, Resolution, Responder,
};
use folio_observability::{AssistantMetrics, MetricsSnapshot};
use tracing::{debug, info, instrument};

pub use session::ChatSession;
pub use suggestions::{SuggestionCarousel, DEFAULT_SUGGESTIONS, SUGGESTION_ROTATION};

pub const DEFAULT_THINKING_DELAY: Duration = Duration::from_millis(700);

pub const OPENING_MESSAGE: &str = "Hi! I'm Sparkie. Ask about education, visa status, a short summary, skills — or say \"tell me a joke\".";

#[derive(Clone)]
pub struct SparkieAgent {
    responder: Arc<Responder>,
    metrics: Arc<AssistantMetrics>,
    thinking_delay: Duration,
}

impl SparkieAgent {
    pub fn new(responder: Arc<Responder>, metrics: Arc<AssistantMetrics>) -> Self {
        Self {
            responder,
            metrics,
            thinking_delay: DEFAULT_THINKING_DELAY,
        }
    }

    pub fn with_thinking_delay(mut self, delay: Duration) -> Self {
        self.thinking_delay = delay;
        self
    }

    pub fn thinking_delay(&self) -> Duration {
        self.thinking_delay
    }

    pub fn profile(&self) -> &Profile {
        self.responder.profile()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn greeting(&self) -> ConversationMessage {
        ConversationMessage::assistant(OPENING_MESSAGE)
    }

    /// Trims and expands raw input. Blank input yields `None` and is never answered.
    pub fn prepare_query(raw: &str) -> Option<String> {
        let query = normalize_text(raw);
        if query.is_empty() {
            return None;
        }
        if query.eq_ignore_ascii_case("joke") {
            return Some("tell me a joke".to_string());
        }
        Some(query)
    }

    /// Answers immediately, without the thinking delay.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub fn answer(&self, query: &str) -> Resolution {
        let started = Instant::now();
        let resolution = self.responder.resolve(query);
        let intent = resolution
            .intent
            .map(|kind| kind.as_key())
            .unwrap_or("fallback");
        let has_link = contains_link(&resolution.text);

        self.metrics
            .record_reply(intent, has_link, started.elapsed());
        info!(intent, score = resolution.score, has_link, "reply composed");
        resolution
    }

    /// Full assistant turn: prepare, wait out the thinking delay, answer.
    pub async fn reply(&self, raw: &str) -> Option<ConversationMessage> {
        let query = Self::prepare_query(raw)?;
        debug!(delay_ms = self.thinking_delay.as_millis() as u64, "thinking");
        tokio::time::sleep(self.thinking_delay).await;
        Some(ConversationMessage::assistant(self.answer(&query).text))
    }

    /// Starts a session whose replies arrive in submission order.
    pub fn start_session(&self) -> ChatSession {
        ChatSession::spawn(self.clone())
    }
}

impl From<Arc<Profile>> for SparkieAgent {
    fn from(profile: Arc<Profile>) -> Self {
        Self::new(Arc::new(Responder::new(profile)), AssistantMetrics::shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{builtin_profile, IntentKind, RenderHint, Role, FALLBACK_REPLY};

    fn agent() -> SparkieAgent {
        SparkieAgent::from(Arc::new(builtin_profile().unwrap()))
            .with_thinking_delay(Duration::from_millis(5))
    }

    #[test]
    fn blank_input_is_not_answered() {
        assert_eq!(SparkieAgent::prepare_query("   \n"), None);
        assert_eq!(
            SparkieAgent::prepare_query("  what   skills? "),
            Some("what skills?".to_string())
        );
    }

    #[test]
    fn joke_shortcut_expands() {
        assert_eq!(
            SparkieAgent::prepare_query("Joke"),
            Some("tell me a joke".to_string())
        );
    }

    #[test]
    fn answer_updates_metrics() {
        let agent = agent();
        assert_eq!(agent.answer("visa?").intent, Some(IntentKind::Visa));
        assert_eq!(agent.answer("qwerty").text, FALLBACK_REPLY);
        agent.answer("resume please");

        let snapshot = agent.metrics();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.fallback_total, 1);
        assert_eq!(snapshot.link_replies_total, 1);
    }

    #[tokio::test]
    async fn reply_waits_and_marks_render_mode() {
        let agent = agent();
        let started = Instant::now();
        let message = agent.reply("resume").await.expect("reply expected");
        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.render, RenderHint::Instant);

        let plain = agent.reply("summary").await.expect("reply expected");
        assert_eq!(plain.render, RenderHint::Typewriter);

        assert!(agent.reply("  ").await.is_none());
    }

    #[test]
    fn greeting_is_an_assistant_message() {
        let greeting = agent().greeting();
        assert_eq!(greeting.role, Role::Assistant);
        assert!(greeting.text.starts_with("Hi! I'm Sparkie."));
    }
}
