//! Multi-agent coordination
//!
//! Each "agent" is the same orchestration loop parameterized with a role
//! label and a role-scoped subset of the tool catalog — configuration,
//! not subclassing. Roles run sequentially over the same task; a planner
//! runs first to decompose it, a critic always runs last over the
//! accumulated outputs.

use crate::orchestrator::{Orchestrator, QueryError};
use crate::provider::Provider;
use crate::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Researcher,
    Coder,
    Analyst,
    Writer,
    Planner,
    Critic,
}

impl AgentRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Researcher => "researcher",
            Self::Coder => "coder",
            Self::Analyst => "analyst",
            Self::Writer => "writer",
            Self::Planner => "planner",
            Self::Critic => "critic",
        }
    }

    /// The tool subset this role may use. Planner and critic work by
    /// reasoning alone.
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            Self::Researcher => &[
                "web_extract_text",
                "web_search_in_page",
                "rag_query",
                "rag_index_document",
            ],
            Self::Coder => &[
                "execute_code",
                "analyze_code",
                "git_status",
                "git_log",
                "file_read",
                "file_write",
            ],
            Self::Analyst => &["data_load_csv", "data_summary", "data_query"],
            Self::Writer => &["file_write", "rag_query"],
            Self::Planner => &[],
            Self::Critic => &[],
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One role's contribution to a task
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub role: String,
    pub output: String,
}

/// Outcome of a coordinated task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: String,
    pub plan: Option<String>,
    pub contributions: Vec<Contribution>,
    pub review: Option<String>,
}

pub struct Coordinator {
    provider: Arc<dyn Provider>,
    catalog: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl Coordinator {
    pub fn new(
        provider: Arc<dyn Provider>,
        catalog: Arc<ToolRegistry>,
        max_iterations: usize,
    ) -> Self {
        Self {
            provider,
            catalog,
            max_iterations,
        }
    }

    fn agent_for(&self, role: AgentRole) -> Orchestrator {
        let tools = Arc::new(self.catalog.subset(role.tool_names()));
        Orchestrator::with_role(Arc::clone(&self.provider), tools, Some(role.label()))
            .max_iterations(self.max_iterations)
    }

    /// Solve a task with the requested roles. Ordering rules: a planner
    /// (if requested) runs first on a decomposition prompt; a critic (if
    /// requested) runs last over the accumulated outputs; everything else
    /// runs in the order given. No shared mutable state between roles.
    pub async fn solve(
        &self,
        task: &str,
        roles: &[AgentRole],
    ) -> Result<TaskOutcome, QueryError> {
        let mut outcome = TaskOutcome {
            task: task.to_string(),
            plan: None,
            contributions: Vec::new(),
            review: None,
        };

        if roles.contains(&AgentRole::Planner) {
            let mut planner = self.agent_for(AgentRole::Planner);
            let plan = planner
                .process_query(&format!("Break down this task into steps: {task}"))
                .await?;
            tracing::info!(role = "planner", "Plan produced");
            outcome.plan = Some(plan);
        }

        for &role in roles {
            if matches!(role, AgentRole::Planner | AgentRole::Critic) {
                continue;
            }
            let mut agent = self.agent_for(role);
            let prompt = match &outcome.plan {
                Some(plan) => format!("Task: {task}\n\nPlan:\n{plan}"),
                None => task.to_string(),
            };
            let output = agent.process_query(&prompt).await?;
            tracing::info!(role = %role, "Contribution produced");
            outcome.contributions.push(Contribution {
                role: role.label().to_string(),
                output,
            });
        }

        if roles.contains(&AgentRole::Critic) {
            let mut critic = self.agent_for(AgentRole::Critic);
            let accumulated = outcome
                .contributions
                .iter()
                .map(|c| format!("[{}]\n{}", c.role, c.output))
                .collect::<Vec<_>>()
                .join("\n\n");
            let review = critic
                .process_query(&format!(
                    "Review the following solution for: {task}\n\n{accumulated}"
                ))
                .await?;
            tracing::info!(role = "critic", "Review produced");
            outcome.review = Some(review);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::ScriptedProvider;
    use crate::tool::{calculator::CalculatorTool, weather::WeatherTool};

    fn catalog() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(WeatherTool::new()));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn roles_contribute_in_order_and_critic_reviews_last() {
        let provider = Arc::new(ScriptedProvider::new(vec!["output"]));
        let coordinator =
            Coordinator::new(Arc::clone(&provider) as Arc<dyn Provider>, catalog(), 3);

        let outcome = coordinator
            .solve(
                "summarize the data",
                &[AgentRole::Researcher, AgentRole::Writer, AgentRole::Critic],
            )
            .await
            .unwrap();

        let roles: Vec<&str> = outcome
            .contributions
            .iter()
            .map(|c| c.role.as_str())
            .collect();
        assert_eq!(roles, vec!["researcher", "writer"]);
        assert!(outcome.review.is_some());
        assert!(outcome.plan.is_none());
        // researcher + writer + critic = 3 loop runs, one invocation each
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn planner_runs_first_when_requested() {
        let provider = Arc::new(ScriptedProvider::new(vec!["step 1, step 2"]));
        let coordinator =
            Coordinator::new(Arc::clone(&provider) as Arc<dyn Provider>, catalog(), 3);

        let outcome = coordinator
            .solve("build a thing", &[AgentRole::Planner, AgentRole::Coder])
            .await
            .unwrap();
        assert_eq!(outcome.plan.as_deref(), Some("step 1, step 2"));
        assert_eq!(outcome.contributions.len(), 1);
    }
}
