//! Playable races and their creation-time lookup tables

use serde::{Deserialize, Serialize};

use super::Characteristics;

/// XP awarded for letting the dice pick the race.
pub const RANDOM_RACE_BONUS_XP: i32 = 20;

/// One of the five playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Human,
    Halfling,
    Dwarf,
    HighElf,
    WoodElf,
}

impl Race {
    pub const ALL: [Race; 5] = [
        Race::Human,
        Race::Halfling,
        Race::Dwarf,
        Race::HighElf,
        Race::WoodElf,
    ];

    pub fn russian_name(&self) -> &'static str {
        match self {
            Race::Human => "Человек",
            Race::Halfling => "Полурослик",
            Race::Dwarf => "Гном",
            Race::HighElf => "Высший эльф",
            Race::WoodElf => "Лесной эльф",
        }
    }

    /// Resolve a d100 roll to a race: 1-90 human, 91-94 halfling,
    /// 95-98 dwarf, 99 high elf, 100 wood elf.
    pub fn from_roll(roll: u32) -> Race {
        match roll {
            0..=90 => Race::Human,
            91..=94 => Race::Halfling,
            95..=98 => Race::Dwarf,
            99 => Race::HighElf,
            _ => Race::WoodElf,
        }
    }

    /// Resolve menu input: a 1-5 digit or a Russian race name token.
    pub fn from_input(input: &str) -> Option<Race> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "1" | "человек" => Some(Race::Human),
            "2" | "полурослик" => Some(Race::Halfling),
            "3" | "гном" => Some(Race::Dwarf),
            "4" | "высший эльф" | "эльф" => Some(Race::HighElf),
            "5" | "лесной эльф" => Some(Race::WoodElf),
            _ => None,
        }
    }

    /// Base characteristic values applied when the race is chosen.
    pub fn base_characteristics(&self) -> Characteristics {
        match self {
            Race::Human => Characteristics::new(30, 30, 20, 20, 30, 30, 30, 30, 30, 30),
            Race::Halfling => Characteristics::new(20, 30, 10, 20, 30, 40, 30, 30, 30, 40),
            Race::Dwarf => Characteristics::new(40, 30, 30, 40, 20, 20, 30, 20, 40, 20),
            Race::HighElf => Characteristics::new(40, 40, 20, 20, 40, 40, 40, 40, 30, 30),
            Race::WoodElf => Characteristics::new(30, 30, 20, 20, 40, 40, 30, 30, 30, 30),
        }
    }

    /// Flat bonus added to every 2d10+10 characteristic roll.
    pub fn stat_roll_bonus(&self) -> i32 {
        match self {
            Race::Halfling => 20,
            Race::HighElf => 40,
            _ => 30,
        }
    }

    /// (fate, resilience) pair; fortune and resolve copy these at creation.
    pub fn fate_resilience(&self) -> (i32, i32) {
        match self {
            Race::Human => (2, 1),
            Race::Halfling | Race::Dwarf => (0, 2),
            Race::HighElf | Race::WoodElf => (0, 0),
        }
    }

    pub fn movement(&self) -> i32 {
        match self {
            Race::Human => 4,
            Race::Halfling | Race::Dwarf => 3,
            Race::HighElf | Race::WoodElf => 5,
        }
    }

    /// Minimum adult age the 2d10 appearance roll is added to.
    pub fn base_age(&self) -> i32 {
        match self {
            Race::Human => 18,
            Race::Halfling => 30,
            Race::Dwarf => 40,
            Race::HighElf => 100,
            Race::WoodElf => 50,
        }
    }
}

impl std::fmt::Display for Race {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.russian_name())
    }
}
