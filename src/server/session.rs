// Per-session conversation state
//
// Sessions are keyed by the caller-supplied identifier. Each session holds
// its turn list behind its own async mutex, so concurrent requests on one
// session serialize instead of interleaving read-modify-write on the
// history. The manager evicts idle sessions once the cap is reached.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::constants::SYSTEM_PROMPT;

/// Speaker role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered turn history for one session identifier.
#[derive(Debug)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    /// New sessions start with the fixed system prompt.
    fn new() -> Self {
        Self {
            turns: vec![Turn {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            }],
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Flatten the history into the model prompt: one `role: content` line
    /// per turn in chronological order, then a trailing `assistant:` cue.
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        for turn in &self.turns {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
        prompt.push_str("assistant:");
        prompt
    }
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_active: Instant,
}

/// Session store with a max-count cap and idle-TTL eviction.
pub struct SessionManager {
    sessions: DashMap<String, Entry>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize, timeout_minutes: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
            idle_timeout: Duration::from_secs(timeout_minutes * 60),
        }
    }

    /// Get the session for `id`, creating and seeding it on first use.
    /// Touches the session's activity timestamp.
    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            entry.last_active = Instant::now();
            return Arc::clone(&entry.session);
        }

        if self.sessions.len() >= self.max_sessions {
            self.evict();
        }

        let session = Arc::new(Mutex::new(Session::new()));
        self.sessions.insert(
            id.to_string(),
            Entry {
                session: Arc::clone(&session),
                last_active: Instant::now(),
            },
        );
        session
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn delete(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop expired sessions; if none have expired, drop the least recently
    /// touched one so a new session always fits.
    fn evict(&self) {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_active) < self.idle_timeout);
        if self.sessions.len() < before {
            return;
        }

        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_active)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            tracing::debug!(session = %key, "Evicting least recently used session");
            self.sessions.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_seeded_with_system_prompt() {
        let manager = SessionManager::new(10, 30);
        let session = manager.get_or_create("s1");
        let session = session.lock().await;
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::System);
        assert_eq!(session.turns()[0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let manager = SessionManager::new(10, 30);
        {
            let session = manager.get_or_create("s1");
            session.lock().await.push(Role::User, "hello");
        }
        let session = manager.get_or_create("s1");
        let session = session.lock().await;
        assert_eq!(session.turns().len(), 2);
        assert_eq!(manager.active_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_flattens_history_with_assistant_cue() {
        let manager = SessionManager::new(10, 30);
        let session = manager.get_or_create("s1");
        let mut session = session.lock().await;
        session.push(Role::User, "I have a headache");

        let prompt = session.prompt();
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("system: "));
        assert_eq!(lines[1], "user: I have a headache");
        assert_eq!(lines[2], "assistant:");
        assert!(prompt.ends_with("assistant:"));
    }

    #[tokio::test]
    async fn test_delete_session() {
        let manager = SessionManager::new(10, 30);
        manager.get_or_create("s1");
        assert!(manager.delete("s1"));
        assert!(!manager.delete("s1"));
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_eviction_keeps_session_count_bounded() {
        let manager = SessionManager::new(2, 30);
        manager.get_or_create("s1");
        std::thread::sleep(Duration::from_millis(5));
        manager.get_or_create("s2");
        std::thread::sleep(Duration::from_millis(5));
        manager.get_or_create("s3");
        assert_eq!(manager.active_count(), 2);
        // The oldest (s1) is the one that went away
        assert!(!manager.delete("s1"));
        assert!(manager.delete("s3"));
    }

    #[tokio::test]
    async fn test_idle_sessions_evicted_before_live_ones() {
        // Zero-minute TTL: everything is expired by the time we hit the cap
        let manager = SessionManager::new(1, 0);
        manager.get_or_create("s1");
        manager.get_or_create("s2");
        assert_eq!(manager.active_count(), 1);
        assert!(manager.delete("s2"));
    }
}
