pub mod species;
pub mod verify;

pub use species::{family_members, lookup, SpeciesEntry, SPECIES_TABLE};
pub use verify::{verify, Verdict};
