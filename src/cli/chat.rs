//! Interactive chat mode

use super::ChatArgs;
use crate::app::AppContext;
use crate::config::Config;
use crate::orchestrator::{Orchestrator, QueryError};
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn execute(args: ChatArgs) -> Result<()> {
    let mut config = Config::load().await?;
    if let Some(model) = args.model {
        config.model.name = model;
    }
    let ctx = AppContext::build(config).await?;

    let tools = Arc::clone(&ctx.tools);
    let mut orchestrator = Orchestrator::new(Arc::clone(&ctx.provider), Arc::clone(&ctx.tools))
        .max_iterations(ctx.config.orchestrator.max_iterations);

    println!("adjutant — local assistant ({} tools loaded)", tools.len());
    println!("Type 'help' for commands, 'quit' to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        match query.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "help" => {
                println!("Commands: help, tools, quit");
                println!("Anything else is sent to the assistant.");
                continue;
            }
            "tools" => {
                for tool in tools.list() {
                    println!("  {} — {}", tool.name(), tool.description());
                }
                continue;
            }
            _ => {}
        }

        match orchestrator.process_query(query).await {
            Ok(answer) => println!("\nassistant> {answer}\n"),
            Err(QueryError::BackendUnavailable(e)) => {
                eprintln!("\n{e}\n");
            }
            Err(e) => {
                eprintln!("\nQuery failed: {e}\n");
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
