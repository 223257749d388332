//! Orchestration loop
//!
//! The bounded think/act/observe cycle between the model and the tools:
//! invoke the model over the transcript, interpret the response as either
//! a tool call or a final answer, dispatch tool calls, feed results back,
//! and stop when the model answers in plain text or the iteration budget
//! runs out.

pub mod parse;

use crate::provider::{Message, Provider, ProviderError};
use crate::tool::ToolRegistry;
use parse::{BraceScanParser, ToolCallParser};
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Deterministic answer when the iteration budget is exhausted. A
/// user-visible outcome, not an error.
pub const BUDGET_EXHAUSTED_ANSWER: &str =
    "Maximum iterations reached. Could not complete the request.";

/// Failure of one `process_query` call. Tool-level failures never surface
/// here — they are fed back to the model as text. Only the model backend
/// aborts a query, and callers can tell "backend down, retry once it is
/// up" from any other failure.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    BackendUnavailable(ProviderError),

    #[error("{0}")]
    Backend(ProviderError),
}

impl From<ProviderError> for QueryError {
    fn from(e: ProviderError) -> Self {
        if e.is_unreachable() {
            Self::BackendUnavailable(e)
        } else {
            Self::Backend(e)
        }
    }
}

/// One orchestration-loop instance: a provider, a tool catalog, and the
/// transcript it exclusively owns.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    parser: Box<dyn ToolCallParser>,
    transcript: Vec<Message>,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self::with_role(provider, tools, None)
    }

    /// A loop instance whose system prompt is shaped for a specialized
    /// role. Used by the multi-agent coordinator.
    pub fn with_role(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        role: Option<&str>,
    ) -> Self {
        let system = system_prompt(&tools, role);
        Self {
            provider,
            tools,
            parser: Box::new(BraceScanParser),
            transcript: vec![Message::system(system)],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Swap the tool-call parser (e.g. for a stricter structured-output
    /// contract).
    pub fn parser(mut self, parser: Box<dyn ToolCallParser>) -> Self {
        self.parser = parser;
        self
    }

    /// The transcript so far. The first message is always the system
    /// prompt; messages are append-only.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Run one user query to a final natural-language answer.
    ///
    /// On a backend failure the turn's user message remains in the
    /// transcript but no assistant message is appended, so the session
    /// stays usable for the next query.
    pub async fn process_query(&mut self, user_text: &str) -> Result<String, QueryError> {
        self.transcript.push(Message::user(user_text));

        for iteration in 1..=self.max_iterations {
            tracing::debug!(iteration, "Invoking model");
            let response_text = self.provider.complete(&self.transcript).await?;

            let Some(call) = self.parser.extract(&response_text) else {
                // No tool call: this is the final answer
                self.transcript.push(Message::assistant(&response_text));
                tracing::info!(iteration, "Query answered");
                return Ok(response_text);
            };

            tracing::info!(iteration, tool = %call.tool, "Model requested tool");
            self.transcript.push(Message::assistant(&response_text));

            let result = self.tools.dispatch(&call).await;
            let feedback = if result.is_error {
                format!(
                    "Tool call failed: {}\n\nPlease respond to the user explaining the error.",
                    result.output
                )
            } else {
                format!(
                    "Tool '{}' returned: {}\n\nPlease provide a natural language response to the user based on this result.",
                    call.tool, result.output
                )
            };
            self.transcript.push(Message::user(feedback));
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "Iteration budget exhausted"
        );
        Ok(BUDGET_EXHAUSTED_ANSWER.to_string())
    }
}

/// Render the system prompt: the tool catalog in registry order plus the
/// calling convention. Deterministic for a given registry, so prompts are
/// reproducible in tests.
fn system_prompt(tools: &ToolRegistry, role: Option<&str>) -> String {
    let identity = match role {
        Some(role) => format!("You are a specialized {role} agent."),
        None => "You are a helpful assistant.".to_string(),
    };

    if tools.is_empty() {
        return format!("{identity} Answer from your own knowledge and reasoning.");
    }

    format!(
        "{identity} You have access to the following tools:\n\n{}\n\n\
         When you need to use a tool, respond with a JSON object in this format:\n\
         {{\"tool\": \"tool_name\", \"arguments\": {{\"arg1\": \"value1\", \"arg2\": \"value2\"}}}}\n\n\
         If you don't need to use a tool, just respond normally.\n\n\
         Important: Only use the tools when necessary to answer the user's question.",
        tools.render_catalog()
    )
}

#[cfg(test)]
pub mod testing {
    //! Scripted provider for loop tests

    use crate::provider::{Message, Provider, ProviderError};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Plays back a fixed list of responses and counts invocations. When
    /// the script runs out it repeats the last entry.
    pub struct ScriptedProvider {
        responses: Vec<String>,
        pub calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: responses.into_iter().map(String::from).collect(),
                calls: Mutex::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            let mut calls = self.calls.lock();
            let index = (*calls).min(self.responses.len().saturating_sub(1));
            *calls += 1;
            Ok(self.responses[index].clone())
        }
    }

    /// Always fails with an API error.
    pub struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            Err(ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::provider::Role;
    use crate::tool::{calculator::CalculatorTool, ToolRegistry};

    fn calculator_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool::new()));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn plain_answer_terminates_after_one_invocation() {
        let provider = Arc::new(ScriptedProvider::new(vec!["Paris is the capital of France."]));
        let mut orchestrator =
            Orchestrator::new(Arc::clone(&provider) as Arc<dyn Provider>, calculator_registry());

        let answer = orchestrator.process_query("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "Paris is the capital of France.");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn tool_call_round_trip_produces_final_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"tool": "calculator", "arguments": {"operation": "multiply", "a": 25, "b": 4}}"#,
            "25 times 4 is 100.",
        ]));
        let mut orchestrator =
            Orchestrator::new(Arc::clone(&provider) as Arc<dyn Provider>, calculator_registry());

        let answer = orchestrator.process_query("What is 25 times 4?").await.unwrap();
        assert!(answer.contains("100"));
        assert_eq!(provider.call_count(), 2);

        // transcript: system, user, assistant(tool call), user(feedback), assistant(answer)
        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[0].role, Role::System);
        assert!(transcript[3].content.contains("Tool 'calculator' returned"));
        assert!(transcript[3].content.contains("100"));
    }

    #[tokio::test]
    async fn iteration_budget_caps_model_invocations() {
        // A model that always requests the same tool call never terminates
        // on its own; the loop must stop at the budget with the sentinel.
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"tool": "calculator", "arguments": {"operation": "add", "a": 1, "b": 1}}"#,
        ]));
        let mut orchestrator =
            Orchestrator::new(Arc::clone(&provider) as Arc<dyn Provider>, calculator_registry());

        let answer = orchestrator.process_query("loop forever").await.unwrap();
        assert_eq!(answer, BUDGET_EXHAUSTED_ANSWER);
        assert_eq!(provider.call_count(), DEFAULT_MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn unknown_tool_recovers_through_feedback() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"tool": "no_such_tool", "arguments": {}}"#,
            "I could not use that tool.",
        ]));
        let mut orchestrator =
            Orchestrator::new(Arc::clone(&provider) as Arc<dyn Provider>, calculator_registry());

        let answer = orchestrator.process_query("use a bad tool").await.unwrap();
        assert_eq!(answer, "I could not use that tool.");
        let feedback = &orchestrator.transcript()[3];
        assert!(feedback.content.starts_with("Tool call failed:"));
        assert!(feedback.content.contains("Unknown tool: no_such_tool"));
    }

    #[tokio::test]
    async fn brace_text_that_is_not_a_call_passes_through_verbatim() {
        let text = "A JSON object looks like { \"key\": \"value\" } in most languages.";
        let provider = Arc::new(ScriptedProvider::new(vec![text]));
        let mut orchestrator =
            Orchestrator::new(Arc::clone(&provider) as Arc<dyn Provider>, calculator_registry());

        let answer = orchestrator.process_query("what does JSON look like?").await.unwrap();
        assert_eq!(answer, text);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn backend_failure_leaves_no_dangling_assistant_message() {
        let provider = Arc::new(FailingProvider);
        let mut orchestrator =
            Orchestrator::new(provider as Arc<dyn Provider>, calculator_registry());

        let error = orchestrator.process_query("hello").await.unwrap_err();
        assert!(matches!(error, QueryError::Backend(_)));

        // The user message remains; no assistant message was appended.
        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::User);

        // The session stays usable once the backend recovers — verified by
        // the transcript still starting with the system prompt.
        assert_eq!(transcript[0].role, Role::System);
    }

    #[test]
    fn system_prompt_lists_tools_in_registry_order() {
        let registry = calculator_registry();
        let prompt = system_prompt(&registry, None);
        assert!(prompt.contains("- calculator:"));
        assert!(prompt.contains("\"tool\": \"tool_name\""));

        let role_prompt = system_prompt(&registry, Some("researcher"));
        assert!(role_prompt.starts_with("You are a specialized researcher agent."));
    }
}
