//! `insights`: prints the next-trending predictions.

use beatscope_collector::CycleOutcome;

use crate::context;

pub(crate) async fn run_insights(memory: bool) -> anyhow::Result<()> {
    let ctx = context::build(memory).await?;

    // A fresh in-memory store is empty; fill it before predicting.
    if memory {
        if let CycleOutcome::Completed(report) = ctx.collector.run_cycle().await {
            tracing::info!(persisted = report.persisted(), "seeded in-memory store");
        }
    }

    let predictions = ctx.insights.predict_next_trending().await;
    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}
