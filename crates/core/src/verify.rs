use serde::{Deserialize, Serialize};
use std::fmt;

use crate::species;

/// Outcome of cross-checking an extracted name against an extracted CP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    /// Species is known and the CP is at or below its ceiling.
    Plausible,
    /// Species is known but the CP exceeds what it can legitimately reach,
    /// so at least one of the two fields was misread.
    ImplausibleCp { max_cp: u32 },
    /// The recovered name matches nothing in the reference table.
    UnknownSpecies,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Plausible => write!(f, "plausible"),
            Verdict::ImplausibleCp { max_cp } => {
                write!(f, "implausible CP (species max is {max_cp})")
            }
            Verdict::UnknownSpecies => write!(f, "unknown species"),
        }
    }
}

/// Stricter validation pass over an extraction: does this CP make sense for
/// this species? Not part of the parsing heuristics themselves — the parser
/// only enforces the global CP bounds — but a cheap second opinion for
/// callers that have both fields.
pub fn verify(name: &str, cp: u32) -> Verdict {
    match species::lookup(name) {
        None => Verdict::UnknownSpecies,
        Some(entry) if cp <= entry.max_cp => Verdict::Plausible,
        Some(entry) => Verdict::ImplausibleCp { max_cp: entry.max_cp },
    }
}
