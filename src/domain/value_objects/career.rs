//! Career classes and the placeholder career tables
//!
//! The full WFRP career tables span dozens of entries per class; these are
//! the abbreviated three-per-class tables the game master engine ships with.

use serde::{Deserialize, Serialize};

/// XP awarded for accepting the first career roll as-is.
pub const FIRST_ROLL_CAREER_XP: i32 = 50;
/// XP awarded for choosing among three career rolls.
pub const THREE_ROLLS_CAREER_XP: i32 = 25;

/// One of the eight career classes a d100 roll buckets into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CareerClass {
    Academic,
    Burgher,
    Courtier,
    Peasant,
    Ranger,
    Artisan,
    Scholar,
    Warrior,
}

impl CareerClass {
    pub const ALL: [CareerClass; 8] = [
        CareerClass::Academic,
        CareerClass::Burgher,
        CareerClass::Courtier,
        CareerClass::Peasant,
        CareerClass::Ranger,
        CareerClass::Artisan,
        CareerClass::Scholar,
        CareerClass::Warrior,
    ];

    pub fn russian_name(&self) -> &'static str {
        match self {
            CareerClass::Academic => "Академик",
            CareerClass::Burgher => "Буржуа",
            CareerClass::Courtier => "Придворный",
            CareerClass::Peasant => "Крестьянин",
            CareerClass::Ranger => "Рейнджер",
            CareerClass::Artisan => "Ремесленник",
            CareerClass::Scholar => "Учёный",
            CareerClass::Warrior => "Воин",
        }
    }

    /// Careers available within the class.
    pub fn careers(&self) -> [&'static str; 3] {
        match self {
            CareerClass::Academic => ["Ученик", "Писарь", "Алхимик"],
            CareerClass::Burgher => ["Торговец", "Ремесленник", "Подмастерье"],
            CareerClass::Courtier => ["Слуга", "Оруженосец", "Менестрель"],
            CareerClass::Peasant => ["Поденщик", "Крепостной", "Пастух"],
            CareerClass::Ranger => ["Охотник", "Следопыт", "Разведчик"],
            CareerClass::Artisan => ["Кузнец", "Плотник", "Ткач"],
            CareerClass::Scholar => ["Астролог", "Целитель", "Пилот"],
            CareerClass::Warrior => ["Стражник", "Наёмник", "Охранник"],
        }
    }

    /// Bucket a d100 roll into a class: 12 values per class, rolls past the
    /// last bucket clamp into it.
    pub fn from_roll(roll: u32) -> CareerClass {
        let idx = ((roll.saturating_sub(1)) / 12) as usize;
        *CareerClass::ALL
            .get(idx)
            .unwrap_or(&CareerClass::ALL[CareerClass::ALL.len() - 1])
    }
}

impl std::fmt::Display for CareerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.russian_name())
    }
}

/// A career resolved from a d100 roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolledCareer {
    pub class: CareerClass,
    pub career: &'static str,
    pub roll: u32,
}

impl std::fmt::Display for RolledCareer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.class, self.career)
    }
}

/// Match free-text manual career selection against the catalog,
/// case-insensitively.
pub fn find_career(input: &str) -> Option<(CareerClass, &'static str)> {
    let normalized = input.trim().to_lowercase();
    for class in CareerClass::ALL {
        for career in class.careers() {
            if career.to_lowercase() == normalized {
                return Some((class, career));
            }
        }
    }
    None
}

/// Formatted catalog of every class and its careers, for the manual-choice
/// menu.
pub fn career_catalog() -> String {
    let mut out = String::new();
    for class in CareerClass::ALL {
        out.push_str(&format!(
            "{}: {}\n",
            class.russian_name(),
            class.careers().join(", ")
        ));
    }
    out
}
