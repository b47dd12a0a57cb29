use folio_core::ConversationMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::SparkieAgent;

/// A chat window's worth of state: the transcript plus a single worker that
/// answers queued queries one at a time, so replies keep submission order.
pub struct ChatSession {
    queries: mpsc::UnboundedSender<String>,
    replies: mpsc::UnboundedReceiver<ConversationMessage>,
    transcript: Vec<ConversationMessage>,
    pending: usize,
    worker: JoinHandle<()>,
}

impl ChatSession {
    pub(crate) fn spawn(agent: SparkieAgent) -> Self {
        let (query_tx, mut query_rx) = mpsc::unbounded_channel::<String>();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        let transcript = vec![agent.greeting()];
        let worker = tokio::spawn(async move {
            while let Some(query) = query_rx.recv().await {
                tokio::time::sleep(agent.thinking_delay()).await;
                let reply = ConversationMessage::assistant(agent.answer(&query).text);
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
            debug!("chat session worker stopped");
        });

        Self {
            queries: query_tx,
            replies: reply_rx,
            transcript,
            pending: 0,
            worker,
        }
    }

    /// Queues a query. Blank input is dropped and returns `None`; otherwise
    /// the echoed user message is returned and appended to the transcript.
    pub fn submit(&mut self, raw: &str) -> Option<ConversationMessage> {
        let query = SparkieAgent::prepare_query(raw)?;
        let message = ConversationMessage::user(query.clone());
        self.queries.send(query).ok()?;
        self.pending += 1;
        self.transcript.push(message.clone());
        Some(message)
    }

    /// Whether replies are still outstanding ("thinking…").
    pub fn is_thinking(&self) -> bool {
        self.pending > 0
    }

    /// Waits for the next reply in submission order.
    pub async fn next_reply(&mut self) -> Option<ConversationMessage> {
        if self.pending == 0 {
            return None;
        }
        let reply = self.replies.recv().await?;
        self.pending -= 1;
        self.transcript.push(reply.clone());
        Some(reply)
    }

    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use folio_core::{builtin_profile, Role, FALLBACK_REPLY};

    use super::*;

    fn session() -> ChatSession {
        SparkieAgent::from(Arc::new(builtin_profile().unwrap()))
            .with_thinking_delay(Duration::from_millis(5))
            .start_session()
    }

    #[tokio::test]
    async fn replies_arrive_in_submission_order() {
        let mut session = session();
        session.submit("What is your visa status?").unwrap();
        session.submit("qwerty").unwrap();
        session.submit("What are your core skills?").unwrap();
        assert!(session.is_thinking());

        let first = session.next_reply().await.unwrap();
        let second = session.next_reply().await.unwrap();
        let third = session.next_reply().await.unwrap();

        assert!(first.text.contains("OPT"));
        assert_eq!(second.text, FALLBACK_REPLY);
        assert!(third.text.starts_with("Core skills: "));
        assert!(!session.is_thinking());
        assert!(session.next_reply().await.is_none());
    }

    #[tokio::test]
    async fn transcript_starts_with_greeting_and_skips_blank_input() {
        let mut session = session();
        assert!(session.submit("   ").is_none());
        assert!(!session.is_thinking());

        let echoed = session.submit("hello").unwrap();
        assert_eq!(echoed.role, Role::User);
        session.next_reply().await.unwrap();

        let roles = session
            .transcript()
            .iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }
}
