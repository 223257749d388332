//! Document indexing command

use super::IndexArgs;
use crate::app::AppContext;
use crate::config::Config;
use anyhow::Result;

pub async fn execute(args: IndexArgs) -> Result<()> {
    let config = Config::load().await?;
    let ctx = AppContext::build(config).await?;

    if args.path.is_dir() {
        let report = ctx.rag.index_directory(&args.path, !args.flat).await?;
        println!(
            "Indexed {} file(s), {} chunks ({} failed)",
            report.indexed, report.total_chunks, report.failed
        );
    } else {
        let report = ctx.rag.index_document(&args.path).await?;
        println!(
            "Indexed {} — {} chunks from {} characters",
            report.file, report.chunks_indexed, report.total_chars
        );
    }

    let stats = ctx.rag.stats();
    println!("Knowledge base now holds {} chunks", stats.total_documents);
    Ok(())
}
