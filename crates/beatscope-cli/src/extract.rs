//! `extract`: runs the title extractor on one title.

use std::fmt::{self, Write as _};

use beatscope_core::EntityKind;
use beatscope_signals::{Candidate, EntityExtractor};

pub(crate) fn run_extract(title: &str, seed: Option<&str>) -> anyhow::Result<()> {
    let candidates = EntityExtractor::default().extract_names(title, seed);
    print!("{}", format_candidates(&candidates)?);
    Ok(())
}

pub(crate) fn format_candidates(candidates: &[Candidate]) -> Result<String, fmt::Error> {
    if candidates.is_empty() {
        return Ok("no entities found\n".to_string());
    }
    let mut out = String::new();
    writeln!(out, "{:<30}{:<10}RULE", "NAME", "KIND")?;
    for c in candidates {
        let kind = match c.kind {
            EntityKind::Artist => "artist",
            EntityKind::Keyword => "keyword",
        };
        writeln!(out, "{:<30}{:<10}{}", c.name, kind, c.rule)?;
    }
    Ok(out)
}
