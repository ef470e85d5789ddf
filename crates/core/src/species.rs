use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the read-only species reference table.
///
/// `max_cp` is the highest Combat Point value a legitimately powered-up
/// specimen of this species can show on the detail screen (roughly the
/// level 50/51 ceiling). It is deliberately generous — the table exists to
/// catch wildly implausible scans, not to police edge cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Candy family the species belongs to (evolution line share one).
    pub family: &'static str,
    pub max_cp: u32,
}

impl fmt::Display for SpeciesEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} family, max CP {})", self.name, self.family, self.max_cp)
    }
}

pub const SPECIES_TABLE: &[SpeciesEntry] = &[
    // Charmander family
    SpeciesEntry { id: "charmander", name: "Charmander", family: "Charmander", max_cp: 1150 },
    SpeciesEntry { id: "charmeleon", name: "Charmeleon", family: "Charmander", max_cp: 1950 },
    SpeciesEntry { id: "charizard", name: "Charizard", family: "Charmander", max_cp: 3300 },
    // Gible family
    SpeciesEntry { id: "gible", name: "Gible", family: "Gible", max_cp: 1300 },
    SpeciesEntry { id: "gabite", name: "Gabite", family: "Gible", max_cp: 2000 },
    SpeciesEntry { id: "garchomp", name: "Garchomp", family: "Gible", max_cp: 4500 },
    // Dratini family
    SpeciesEntry { id: "dratini", name: "Dratini", family: "Dratini", max_cp: 1200 },
    SpeciesEntry { id: "dragonair", name: "Dragonair", family: "Dratini", max_cp: 2100 },
    SpeciesEntry { id: "dragonite", name: "Dragonite", family: "Dratini", max_cp: 4300 },
    // Beldum family
    SpeciesEntry { id: "beldum", name: "Beldum", family: "Beldum", max_cp: 1100 },
    SpeciesEntry { id: "metang", name: "Metang", family: "Beldum", max_cp: 2000 },
    SpeciesEntry { id: "metagross", name: "Metagross", family: "Beldum", max_cp: 4300 },
    // Slakoth family
    SpeciesEntry { id: "slakoth", name: "Slakoth", family: "Slakoth", max_cp: 1200 },
    SpeciesEntry { id: "vigoroth", name: "Vigoroth", family: "Slakoth", max_cp: 2250 },
    SpeciesEntry { id: "slaking", name: "Slaking", family: "Slakoth", max_cp: 5050 },
    // Scatterbug family
    SpeciesEntry { id: "scatterbug", name: "Scatterbug", family: "Scatterbug", max_cp: 600 },
    SpeciesEntry { id: "spewpa", name: "Spewpa", family: "Scatterbug", max_cp: 850 },
    SpeciesEntry { id: "vivillon", name: "Vivillon", family: "Scatterbug", max_cp: 2100 },
    // Legendaries — each carries its own candy family
    SpeciesEntry { id: "rayquaza", name: "Rayquaza", family: "Rayquaza", max_cp: 4400 },
    SpeciesEntry { id: "necrozma", name: "Necrozma", family: "Necrozma", max_cp: 4600 },
    SpeciesEntry { id: "kyogre", name: "Kyogre", family: "Kyogre", max_cp: 4700 },
    SpeciesEntry { id: "groudon", name: "Groudon", family: "Groudon", max_cp: 4700 },
    SpeciesEntry { id: "mewtwo", name: "Mewtwo", family: "Mewtwo", max_cp: 4800 },
    SpeciesEntry { id: "lugia", name: "Lugia", family: "Lugia", max_cp: 4200 },
    SpeciesEntry { id: "ho-oh", name: "Ho-Oh", family: "Ho-Oh", max_cp: 4400 },
    SpeciesEntry { id: "dialga", name: "Dialga", family: "Dialga", max_cp: 4600 },
    SpeciesEntry { id: "palkia", name: "Palkia", family: "Palkia", max_cp: 4600 },
    SpeciesEntry { id: "giratina", name: "Giratina", family: "Giratina", max_cp: 4200 },
    SpeciesEntry { id: "reshiram", name: "Reshiram", family: "Reshiram", max_cp: 4600 },
    SpeciesEntry { id: "zekrom", name: "Zekrom", family: "Zekrom", max_cp: 4600 },
    SpeciesEntry { id: "kyurem", name: "Kyurem", family: "Kyurem", max_cp: 4100 },
    SpeciesEntry { id: "xerneas", name: "Xerneas", family: "Xerneas", max_cp: 4300 },
    SpeciesEntry { id: "yveltal", name: "Yveltal", family: "Yveltal", max_cp: 4300 },
    SpeciesEntry { id: "solgaleo", name: "Solgaleo", family: "Cosmog", max_cp: 4600 },
    SpeciesEntry { id: "lunala", name: "Lunala", family: "Cosmog", max_cp: 4600 },
];

/// Case-insensitive lookup by display name. OCR output is trimmed but
/// otherwise expected to already be letter-cleaned by the extractor.
pub fn lookup(name: &str) -> Option<&'static SpeciesEntry> {
    let needle = name.trim();
    SPECIES_TABLE
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(needle))
}

/// All species sharing a candy family, in table order.
pub fn family_members(family: &str) -> impl Iterator<Item = &'static SpeciesEntry> + '_ {
    let family = family.to_ascii_lowercase();
    SPECIES_TABLE
        .iter()
        .filter(move |e| e.family.to_ascii_lowercase() == family)
}
