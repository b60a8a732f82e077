//! `collect`: one cycle through the full pipeline.

use std::fmt::{self, Write as _};

use beatscope_collector::{CycleOutcome, CycleReport};
use beatscope_db::{EntityStore, EntityTable, StoredEntity};

use crate::context;

const LISTED: u32 = 15;

pub(crate) async fn run_collect(memory: bool) -> anyhow::Result<()> {
    let ctx = context::build(memory).await?;

    let report = match ctx.collector.run_cycle().await {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::Skipped => {
            println!("a collection cycle is already in progress");
            return Ok(());
        }
    };
    print!("{}", format_report(&report)?);

    // An in-memory store is gone once the process exits, so show what it holds.
    if memory {
        print_table(ctx.store.as_ref(), EntityTable::Artists).await?;
        print_table(ctx.store.as_ref(), EntityTable::Keywords).await?;
    }
    Ok(())
}

pub(crate) fn format_report(report: &CycleReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let elapsed = report.finished_at - report.started_at;
    writeln!(
        out,
        "cycle finished at {} in {}s{}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S"),
        elapsed.num_seconds(),
        if report.demo_mode { " (demo mode)" } else { "" }
    )?;
    writeln!(
        out,
        "{:<12}{:<10}{:<10}{:<11}{:<12}{:<8}ERROR",
        "PHASE", "QUERIES", "FAILURES", "PERSISTED", "DUPLICATES", "WRITES"
    )?;
    for phase in &report.phases {
        writeln!(
            out,
            "{:<12}{:<10}{:<10}{:<11}{:<12}{:<8}{}",
            phase.name,
            phase.queries,
            phase.failures,
            phase.persisted,
            phase.duplicates,
            phase.write_failures,
            phase.error.as_deref().unwrap_or("-")
        )?;
    }
    writeln!(
        out,
        "total: {} persisted, {} failed queries, {} failed writes",
        report.persisted(),
        report.failures(),
        report.write_failures()
    )?;
    Ok(out)
}

pub(crate) fn format_entities(
    table: EntityTable,
    rows: &[StoredEntity],
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "\n{} ({})", table.table_name(), rows.len())?;
    writeln!(
        out,
        "{:<30}{:<14}{:<10}{:<13}{:<15}DIRECTION",
        "NAME", "GENRE", "MOMENTUM", "OPPORTUNITY", "COMPETITION"
    )?;
    for row in rows {
        let e = &row.entity;
        writeln!(
            out,
            "{:<30}{:<14}{:<10.1}{:<13.1}{:<15}{}",
            e.name,
            e.genre,
            e.trend_momentum,
            e.opportunity_score,
            e.competition_level.as_str(),
            e.trend_direction.as_str()
        )?;
    }
    Ok(out)
}

async fn print_table(store: &dyn EntityStore, table: EntityTable) -> anyhow::Result<()> {
    let rows = store.list(table, "-trend_momentum", LISTED).await?;
    print!("{}", format_entities(table, &rows)?);
    Ok(())
}
