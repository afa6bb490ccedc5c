//! Domain entities

mod character;
mod creation;

pub use character::{
    apply_character_update, extract_character_name, first_int, parse_sheet_stats, Character,
    CharacterUpdate, SheetStats,
};
pub use creation::{
    CareerMethod, CreationData, CreationState, RaceMethod, StatsMethod, XpLedger,
};
