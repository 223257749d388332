//! Session management
//!
//! One orchestration-loop instance per session id, all running on a single
//! dedicated scheduler thread so a synchronous caller (an HTTP request
//! thread, the CLI) can submit work and block only itself. The scheduler
//! is a current-thread tokio runtime parked on a daemon thread; it lives
//! for the life of the process, like a background event loop.

use crate::orchestrator::{Orchestrator, QueryError};
use crate::provider::Provider;
use crate::tool::ToolRegistry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session '{0}' is not initialized — initialize it first")]
    NotInitialized(String),

    /// The caller's wait expired. The underlying work is not cancelled;
    /// it may still complete on the scheduler and its result is discarded.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("scheduler unavailable: {0}")]
    Scheduler(String),
}

#[derive(Clone)]
struct SessionEntry {
    // tokio Mutex: held across await points, making each model-call →
    // dispatch → feedback round trip atomic w.r.t. this transcript
    orchestrator: Arc<tokio::sync::Mutex<Orchestrator>>,
    created_at: DateTime<Utc>,
    last_active: Arc<Mutex<DateTime<Utc>>>,
}

/// Summary of one live session
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

pub struct SessionManager {
    handle: tokio::runtime::Handle,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl SessionManager {
    /// Start the background scheduler and an empty session table.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        max_iterations: usize,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building session scheduler runtime")?;
        let handle = runtime.handle().clone();

        std::thread::Builder::new()
            .name("session-scheduler".to_string())
            .spawn(move || {
                runtime.block_on(std::future::pending::<()>());
            })
            .context("spawning session scheduler thread")?;

        Ok(Self {
            handle,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            provider,
            tools,
            max_iterations,
        })
    }

    /// Submit one unit of work to the scheduler and wait for its result.
    /// Submission is thread-safe; on timeout the work keeps running and
    /// its eventual result is dropped with the channel.
    fn submit<T, F>(&self, work: F, timeout: Duration) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        self.handle.spawn(async move {
            let _ = tx.send(work.await);
        });

        match rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(SessionError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SessionError::Scheduler("worker task dropped".to_string()))
            }
        }
    }

    /// Create a session. Idempotent: creating an existing session is a
    /// no-op, not an error.
    pub fn create(&self, session_id: &str, timeout: Duration) -> Result<(), SessionError> {
        let sessions = Arc::clone(&self.sessions);
        let session_id = session_id.to_string();
        let provider = Arc::clone(&self.provider);
        let tools = Arc::clone(&self.tools);
        let max_iterations = self.max_iterations;

        self.submit(
            async move {
                let mut table = sessions.lock();
                if table.contains_key(&session_id) {
                    tracing::debug!(session = %session_id, "Session already initialized");
                    return;
                }
                let orchestrator =
                    Orchestrator::new(provider, tools).max_iterations(max_iterations);
                let now = Utc::now();
                table.insert(
                    session_id.clone(),
                    SessionEntry {
                        orchestrator: Arc::new(tokio::sync::Mutex::new(orchestrator)),
                        created_at: now,
                        last_active: Arc::new(Mutex::new(now)),
                    },
                );
                tracing::info!(session = %session_id, "Session created");
            },
            timeout,
        )
    }

    /// Run one query on an existing session. Uninitialized sessions are
    /// rejected before any work is scheduled.
    pub fn query(
        &self,
        session_id: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let entry = self
            .sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotInitialized(session_id.to_string()))?;

        let text = text.to_string();
        let result = self.submit(
            async move {
                let mut orchestrator = entry.orchestrator.lock().await;
                let answer = orchestrator.process_query(&text).await;
                *entry.last_active.lock() = Utc::now();
                answer
            },
            timeout,
        )?;

        Ok(result?)
    }

    /// Tear a session down. Failures are logged, never propagated —
    /// cleanup always succeeds from the caller's perspective.
    pub fn destroy(&self, session_id: &str, timeout: Duration) {
        let Some(entry) = self.sessions.lock().remove(session_id) else {
            return;
        };

        // Let an in-flight round trip finish before the transcript drops.
        let result = self.submit(
            async move {
                let _guard = entry.orchestrator.lock().await;
            },
            timeout,
        );
        match result {
            Ok(()) => tracing::info!(session = %session_id, "Session destroyed"),
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "Session teardown did not finish cleanly")
            }
        }
    }

    pub fn has(&self, session_id: &str) -> bool {
        self.sessions.lock().contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions
            .lock()
            .iter()
            .map(|(id, entry)| SessionSummary {
                session_id: id.clone(),
                created_at: entry.created_at,
                last_active: *entry.last_active.lock(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::ScriptedProvider;
    use crate::provider::{Message, ProviderError};
    use async_trait::async_trait;

    const T: Duration = Duration::from_secs(5);

    fn manager_with(provider: Arc<dyn Provider>) -> SessionManager {
        SessionManager::new(provider, Arc::new(ToolRegistry::new()), 5).unwrap()
    }

    #[test]
    fn create_is_idempotent() {
        let manager = manager_with(Arc::new(ScriptedProvider::new(vec!["hi"])));
        manager.create("alice", T).unwrap();
        manager.create("alice", T).unwrap();
        assert_eq!(manager.session_count(), 1);
        assert!(manager.has("alice"));
    }

    #[test]
    fn query_on_uninitialized_session_is_rejected() {
        let manager = manager_with(Arc::new(ScriptedProvider::new(vec!["hi"])));
        let error = manager.query("ghost", "hello", T).unwrap_err();
        assert!(matches!(error, SessionError::NotInitialized(_)));
    }

    #[test]
    fn sessions_are_isolated() {
        let provider = Arc::new(ScriptedProvider::new(vec!["answer"]));
        let manager = manager_with(provider);
        manager.create("a", T).unwrap();
        manager.create("b", T).unwrap();

        assert_eq!(manager.query("a", "q1", T).unwrap(), "answer");
        assert_eq!(manager.query("b", "q2", T).unwrap(), "answer");
        assert_eq!(manager.session_count(), 2);
    }

    #[test]
    fn destroy_removes_the_session_and_is_quiet_for_unknown_ids() {
        let manager = manager_with(Arc::new(ScriptedProvider::new(vec!["x"])));
        manager.create("temp", T).unwrap();
        manager.destroy("temp", T);
        assert!(!manager.has("temp"));

        // unknown id: no panic, no error
        manager.destroy("never-existed", T);
    }

    struct SlowProvider;

    #[async_trait]
    impl Provider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("slow answer".to_string())
        }
    }

    #[test]
    fn timeout_surfaces_without_corrupting_the_session() {
        let manager = manager_with(Arc::new(SlowProvider));
        manager.create("s", T).unwrap();

        let error = manager
            .query("s", "first", Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(error, SessionError::Timeout(_)));

        // The timed-out work finishes in the background; the session
        // remains usable for the next query.
        let answer = manager.query("s", "second", Duration::from_secs(5)).unwrap();
        assert_eq!(answer, "slow answer");
    }
}
