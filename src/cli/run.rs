//! Non-interactive one-shot mode

use super::RunArgs;
use crate::app::AppContext;
use crate::config::Config;
use crate::orchestrator::{Orchestrator, QueryError};
use anyhow::Result;
use std::sync::Arc;

pub async fn execute(args: RunArgs) -> Result<()> {
    let mut config = Config::load().await?;
    if let Some(model) = args.model {
        config.model.name = model;
    }
    let ctx = AppContext::build(config).await?;

    let mut orchestrator = Orchestrator::new(Arc::clone(&ctx.provider), Arc::clone(&ctx.tools))
        .max_iterations(ctx.config.orchestrator.max_iterations);

    match orchestrator.process_query(&args.message).await {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(QueryError::BackendUnavailable(e)) => {
            anyhow::bail!("{e}")
        }
        Err(e) => anyhow::bail!("query failed: {e}"),
    }
}
