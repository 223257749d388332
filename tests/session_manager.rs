//! Session manager behavior from a synchronous caller's point of view.

use adjutant::provider::{Message, Provider, ProviderError};
use adjutant::session::{SessionError, SessionManager};
use adjutant::tool::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const T: Duration = Duration::from_secs(5);

struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        // answer with the latest user message, prefixed
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == adjutant::provider::Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("echo: {last}"))
    }
}

fn manager() -> SessionManager {
    SessionManager::new(Arc::new(EchoProvider), Arc::new(ToolRegistry::new()), 5).unwrap()
}

#[test]
fn create_twice_yields_one_session() {
    let manager = manager();
    manager.create("user-1", T).unwrap();
    manager.create("user-1", T).unwrap();
    assert_eq!(manager.session_count(), 1);
}

#[test]
fn query_requires_explicit_initialization() {
    let manager = manager();
    let error = manager.query("unknown", "hi", T).unwrap_err();
    assert!(matches!(error, SessionError::NotInitialized(_)));
    assert!(error.to_string().contains("not initialized"));
}

#[test]
fn each_session_keeps_its_own_transcript() {
    let manager = manager();
    manager.create("a", T).unwrap();
    manager.create("b", T).unwrap();

    let answer_a = manager.query("a", "alpha question", T).unwrap();
    let answer_b = manager.query("b", "beta question", T).unwrap();
    assert_eq!(answer_a, "echo: alpha question");
    assert_eq!(answer_b, "echo: beta question");
}

#[test]
fn destroy_then_query_is_not_initialized() {
    let manager = manager();
    manager.create("temp", T).unwrap();
    manager.destroy("temp", T);
    assert!(!manager.has("temp"));

    let error = manager.query("temp", "hello", T).unwrap_err();
    assert!(matches!(error, SessionError::NotInitialized(_)));
}

#[test]
fn concurrent_callers_are_served_independently() {
    let manager = Arc::new(manager());
    manager.create("x", T).unwrap();
    manager.create("y", T).unwrap();

    let m1 = Arc::clone(&manager);
    let h1 = std::thread::spawn(move || m1.query("x", "one", T).unwrap());
    let m2 = Arc::clone(&manager);
    let h2 = std::thread::spawn(move || m2.query("y", "two", T).unwrap());

    assert_eq!(h1.join().unwrap(), "echo: one");
    assert_eq!(h2.join().unwrap(), "echo: two");
}
