use beatscope_core::{EntityKind, RawVideoResult};

/// A name pulled out of one title by one rule, before it is tied to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Cleaned, lower-cased name.
    pub name: String,
    pub kind: EntityKind,
    /// Name of the rule that produced it.
    pub rule: &'static str,
}

/// One extraction hit. Folded into an accumulator and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntity<'a> {
    pub raw_name: String,
    pub kind: EntityKind,
    pub rule: &'static str,
    pub source: &'a RawVideoResult,
}
