//! Character-creation working data and its ordered workflow states

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::value_objects::{CareerClass, Characteristics, Race};

/// Ordered steps of the character-creation workflow. Transitions are
/// monotonic and forward-only; the Q&A side channel never moves the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreationState {
    Name,
    Race,
    Career,
    Stats,
    Skills,
    Talents,
    Gear,
    Appearance,
    Personality,
    Review,
    Save,
    Complete,
}

impl CreationState {
    /// Audit-trail file stem for the step, or None for terminal states.
    pub fn step_file_name(&self) -> Option<&'static str> {
        match self {
            CreationState::Name => Some("01_name"),
            CreationState::Race => Some("02_race"),
            CreationState::Career => Some("03_career"),
            CreationState::Stats => Some("04_stats"),
            CreationState::Skills => Some("05_skills"),
            CreationState::Talents => Some("06_talents"),
            CreationState::Gear => Some("07_gear"),
            CreationState::Appearance => Some("08_appearance"),
            CreationState::Personality => Some("09_personality"),
            CreationState::Review => Some("10_review"),
            CreationState::Save | CreationState::Complete => None,
        }
    }
}

/// How the stats step was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsMethod {
    RandomNoSwap,
    RandomSwap,
    Manual,
}

/// How the career step was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CareerMethod {
    FirstRoll,
    ThreeRolls,
    Manual,
}

/// How the race step was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceMethod {
    Manual,
    Random,
}

/// Creation-time experience ledger. The running total is always the sum of
/// the per-source awards, so the ledger cannot drift out of balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLedger {
    pub from_race: i32,
    pub from_stats: i32,
    pub from_career: i32,
    pub spent: i32,
}

impl XpLedger {
    pub fn total(&self) -> i32 {
        self.from_race + self.from_stats + self.from_career
    }

    pub fn available(&self) -> i32 {
        self.total() - self.spent
    }
}

/// Everything gathered while building a character. Created empty when the
/// workflow starts and mutated exclusively by the per-state handlers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreationData {
    pub name: String,
    pub race: Option<Race>,
    pub class: Option<CareerClass>,
    pub career: String,
    pub career_rank: String,
    pub status: String,
    pub status_level: i32,

    pub characteristics: Characteristics,

    // Derived secondary stats
    pub hp: i32,
    pub fate: i32,
    pub fortune: i32,
    pub resilience: i32,
    pub resolve: i32,
    pub movement: i32,

    pub skills: HashMap<String, i32>,
    pub talents: Vec<String>,
    /// item -> source (race, career, class)
    pub gear: HashMap<String, String>,
    pub money: i32,

    // Appearance
    pub age: i32,
    pub height: String,
    pub hair_color: String,
    pub eye_color: String,

    // Personality
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub background: String,
    pub motivation: String,

    pub xp: XpLedger,

    pub stats_method: Option<StatsMethod>,
    pub career_method: Option<CareerMethod>,
    pub race_method: Option<RaceMethod>,
}

impl CreationData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn race_name(&self) -> &str {
        self.race.map(|r| r.russian_name()).unwrap_or("—")
    }

    pub fn class_name(&self) -> &str {
        self.class.map(|c| c.russian_name()).unwrap_or("—")
    }

    /// Derive HP, fate/fortune, resilience/resolve and movement from the
    /// rolled characteristics and the race tables.
    pub fn derive_secondary_stats(&mut self) {
        let c = &self.characteristics;
        self.hp = c.s / 10 + 2 * (c.t / 10) + c.wp / 10;

        if let Some(race) = self.race {
            let (fate, resilience) = race.fate_resilience();
            self.fate = fate;
            self.resilience = resilience;
            self.fortune = fate;
            self.resolve = resilience;
            self.movement = race.movement();
        } else {
            self.movement = 4;
        }
    }

    /// Short characteristics block used in step replies.
    pub fn stats_summary(&self) -> String {
        let c = &self.characteristics;
        format!(
            "ББ: {}, ДБ: {}, СС: {}, К: {}\nИ: {}, Л: {}, О: {}, СТ: {}\n\nHP: {} | Судьба: {} | Упорство: {} | Движение: {}",
            c.ws, c.bs, c.s, c.t, c.i, c.ag, c.wp, c.fel,
            self.hp, self.fate, self.resilience, self.movement
        )
    }

    /// Full review shown at the Review step.
    pub fn review_summary(&self) -> String {
        let c = &self.characteristics;
        format!(
            "📋 ПРОВЕРЬ ПЕРСОНАЖА:\n\n\
             **Имя:** {}\n\
             **Раса:** {} (+{} XP)\n\
             **Карьера:** {} → {} (+{} XP)\n\n\
             **Характеристики:**\n\
             ББ: {}, ДБ: {}, СС: {}, К: {}\n\
             И: {}, Л: {}, О: {}, СТ: {}\n\n\
             **Вторичные:**\n\
             HP: {} | Судьба: {} | Движение: {}\n\n\
             **Внешность:**\n\
             Возраст: {} | Рост: {}\n\
             Волосы: {} | Глаза: {}\n\n\
             **Характер:**\n\
             Сильные: {}\n\
             Слабые: {}\n\n\
             **Опыт:** {} всего\n\n\
             Напиши \"да\" для сохранения или \"нет\" для отмены.",
            self.name,
            self.race_name(),
            self.xp.from_race,
            self.class_name(),
            self.career,
            self.xp.from_career,
            c.ws,
            c.bs,
            c.s,
            c.t,
            c.i,
            c.ag,
            c.wp,
            c.fel,
            self.hp,
            self.fate,
            self.movement,
            self.age,
            self.height,
            self.hair_color,
            self.eye_color,
            self.strengths.join(", "),
            self.weaknesses.join(", "),
            self.xp.total()
        )
    }

    /// Render the final persisted markdown record.
    pub fn to_markdown(&self) -> String {
        let c = &self.characteristics;
        format!(
            "# {}\n\n\
             **Дата создания:** {}  \n\
             **Раса:** {}  \n\
             **Карьера:** {}  \n\
             **Статус:** {} {}\n\n\
             ---\n\n\
             ## ХАРАКТЕРИСТИКИ\n\n\
             | Характеристика | Значение | Бонус |\n\
             |---|---|---|\n\
             | ББ (Боевая Пригодность) | {} | {} |\n\
             | ДБ (Дистанция Боя) | {} | {} |\n\
             | СС (Сила) | {} | {} |\n\
             | К (Классовая/Выносливость) | {} | {} |\n\
             | И (Инициатива) | {} | {} |\n\
             | Л (Ловкость) | {} | {} |\n\
             | О (Общение) | {} | {} |\n\
             | СТ (Стойкость) | {} | {} |\n\n\
             **Раны:** {}  \n\
             **Движение:** {}\n\n\
             ---\n\n\
             ## ОПЫТ\n\n\
             | Источник | XP |\n\
             |---|---|\n\
             | Раса | {} |\n\
             | Характеристики | {} |\n\
             | Карьера | {} |\n\
             | **Итого** | {} |\n\n\
             ---\n\n\
             ## ВНЕШНОСТЬ\n\n\
             - Возраст: {}\n\
             - Рост: {}\n\
             - Волосы: {}\n\
             - Глаза: {}\n\n\
             ---\n\n\
             ## ХАРАКТЕР\n\n\
             **Сильные стороны:** {}  \n\
             **Слабые стороны:** {}  \n\
             **Прошлое:** {}\n\n\
             ---\n\n\
             **ПЕРСОНАЖ ГОТОВ К ИГРЕ!**\n",
            self.name,
            Utc::now().format("%Y-%m-%d"),
            self.race_name(),
            self.career,
            self.status,
            self.status_level,
            c.ws,
            c.ws / 10,
            c.bs,
            c.bs / 10,
            c.s,
            c.s / 10,
            c.t,
            c.t / 10,
            c.i,
            c.i / 10,
            c.ag,
            c.ag / 10,
            c.wp,
            c.wp / 10,
            c.fel,
            c.fel / 10,
            self.hp,
            self.movement,
            self.xp.from_race,
            self.xp.from_stats,
            self.xp.from_career,
            self.xp.total(),
            self.age,
            self.height,
            self.hair_color,
            self.eye_color,
            self.strengths.join(", "),
            self.weaknesses.join(", "),
            self.background,
        )
    }
}
