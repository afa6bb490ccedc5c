//! The ten primary WFRP characteristics and their Russian display codes

use serde::{Deserialize, Serialize};

/// One of the ten primary characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    WeaponSkill,
    BallisticSkill,
    Strength,
    Toughness,
    Initiative,
    Agility,
    Dexterity,
    Intelligence,
    Willpower,
    Fellowship,
}

impl Characteristic {
    pub const ALL: [Characteristic; 10] = [
        Characteristic::WeaponSkill,
        Characteristic::BallisticSkill,
        Characteristic::Strength,
        Characteristic::Toughness,
        Characteristic::Initiative,
        Characteristic::Agility,
        Characteristic::Dexterity,
        Characteristic::Intelligence,
        Characteristic::Willpower,
        Characteristic::Fellowship,
    ];

    /// English short code as used on character sheets ("WS", "BS", ...).
    pub fn code(&self) -> &'static str {
        match self {
            Characteristic::WeaponSkill => "WS",
            Characteristic::BallisticSkill => "BS",
            Characteristic::Strength => "S",
            Characteristic::Toughness => "T",
            Characteristic::Initiative => "I",
            Characteristic::Agility => "Ag",
            Characteristic::Dexterity => "Dex",
            Characteristic::Intelligence => "Int",
            Characteristic::Willpower => "WP",
            Characteristic::Fellowship => "Fel",
        }
    }

    /// Russian short code used in player-facing text. Not every
    /// characteristic has one; those fall back to the English code.
    pub fn russian_code(&self) -> &'static str {
        match self {
            Characteristic::WeaponSkill => "ББ",
            Characteristic::BallisticSkill => "ДБ",
            Characteristic::Strength => "СС",
            Characteristic::Toughness => "К",
            Characteristic::Initiative => "И",
            Characteristic::Agility => "Л",
            Characteristic::Willpower => "О",
            Characteristic::Fellowship => "СТ",
            Characteristic::Dexterity => "Dex",
            Characteristic::Intelligence => "Int",
        }
    }

    /// Full Russian name for the Russian short codes.
    pub fn russian_full_name(&self) -> &'static str {
        match self {
            Characteristic::WeaponSkill => "Боевая Пригодность",
            Characteristic::BallisticSkill => "Дистанция Боя",
            Characteristic::Strength => "Сила",
            Characteristic::Toughness => "Классовая",
            Characteristic::Initiative => "Инициатива",
            Characteristic::Agility => "Ловкость",
            Characteristic::Willpower => "Общение",
            Characteristic::Fellowship => "Стойкость",
            Characteristic::Dexterity => "Ловкость рук",
            Characteristic::Intelligence => "Интеллект",
        }
    }
}

/// A full set of primary characteristic values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    pub ws: i32,
    pub bs: i32,
    pub s: i32,
    pub t: i32,
    pub i: i32,
    pub ag: i32,
    pub dex: i32,
    pub int: i32,
    pub wp: i32,
    pub fel: i32,
}

impl Characteristics {
    pub const fn new(
        ws: i32,
        bs: i32,
        s: i32,
        t: i32,
        i: i32,
        ag: i32,
        dex: i32,
        int: i32,
        wp: i32,
        fel: i32,
    ) -> Self {
        Self {
            ws,
            bs,
            s,
            t,
            i,
            ag,
            dex,
            int,
            wp,
            fel,
        }
    }

    pub fn get(&self, characteristic: Characteristic) -> i32 {
        match characteristic {
            Characteristic::WeaponSkill => self.ws,
            Characteristic::BallisticSkill => self.bs,
            Characteristic::Strength => self.s,
            Characteristic::Toughness => self.t,
            Characteristic::Initiative => self.i,
            Characteristic::Agility => self.ag,
            Characteristic::Dexterity => self.dex,
            Characteristic::Intelligence => self.int,
            Characteristic::Willpower => self.wp,
            Characteristic::Fellowship => self.fel,
        }
    }

    pub fn set(&mut self, characteristic: Characteristic, value: i32) {
        match characteristic {
            Characteristic::WeaponSkill => self.ws = value,
            Characteristic::BallisticSkill => self.bs = value,
            Characteristic::Strength => self.s = value,
            Characteristic::Toughness => self.t = value,
            Characteristic::Initiative => self.i = value,
            Characteristic::Agility => self.ag = value,
            Characteristic::Dexterity => self.dex = value,
            Characteristic::Intelligence => self.int = value,
            Characteristic::Willpower => self.wp = value,
            Characteristic::Fellowship => self.fel = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_cover_all_characteristics() {
        let mut stats = Characteristics::default();
        for (idx, c) in Characteristic::ALL.iter().enumerate() {
            stats.set(*c, idx as i32 + 1);
        }
        for (idx, c) in Characteristic::ALL.iter().enumerate() {
            assert_eq!(stats.get(*c), idx as i32 + 1);
        }
    }

    #[test]
    fn russian_codes_match_sheet_legend() {
        assert_eq!(Characteristic::WeaponSkill.russian_code(), "ББ");
        assert_eq!(Characteristic::Toughness.russian_code(), "К");
        assert_eq!(Characteristic::Fellowship.russian_code(), "СТ");
        // No Russian code exists for Dex/Int; the English one is used.
        assert_eq!(Characteristic::Dexterity.russian_code(), "Dex");
    }
}
