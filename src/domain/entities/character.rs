//! Player characters and the bounds-checked sheet update machinery
//!
//! The markdown sheet is the source of truth for a character; updates are
//! applied as textual find/replace against known markers rather than a full
//! markdown parse. Missed markers are silent false negatives and acceptable.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CharacterId;

const SKILLS_HEADER: &str = "## Навыки";
const CONDITIONS_HEADER: &str = "## Состояния";
const CONDITIONS_MARKER: &str = "### Психологические состояния";

/// A character held by a game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Path of the persisted markdown card.
    pub card_path: PathBuf,
    /// Full sheet content; the markdown source of truth.
    pub sheet: String,
    pub last_update: DateTime<Utc>,
}

impl Character {
    pub fn new(name: impl Into<String>, card_path: PathBuf, sheet: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            card_path,
            sheet: sheet.into(),
            last_update: Utc::now(),
        }
    }
}

/// Characteristics and resources parsed back out of a markdown sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetStats {
    pub name: String,
    pub ws: i32,
    pub bs: i32,
    pub s: i32,
    pub ag: i32,
    pub int: i32,
    pub wp: i32,
    pub fel: i32,
    pub current_hp: i32,
    pub max_hp: i32,
    pub xp: i32,
}

/// Extract the character name from the "# Имя:" header line.
pub fn extract_character_name(sheet: &str) -> Option<String> {
    for line in sheet.lines() {
        if let Some(rest) = line.strip_prefix("# Имя:") {
            return Some(rest.trim().to_string());
        }
        if let Some(rest) = line.strip_prefix("# Имя ") {
            return Some(rest.trim().to_string());
        }
    }
    None
}

/// Best-effort line scan of a sheet for characteristics, HP and XP.
///
/// An "HP: N" (or "Здоровье: N") line sets both current and max HP to N;
/// sheets do not carry a separate current-HP marker.
pub fn parse_sheet_stats(sheet: &str) -> SheetStats {
    let mut stats = SheetStats {
        name: extract_character_name(sheet).unwrap_or_else(|| "Unknown".to_string()),
        ..SheetStats::default()
    };

    for line in sheet.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_start_matches(['*', '-', ' ']).trim();
        let Some(value) = first_int(value) else {
            continue;
        };

        match key {
            "WS" | "ББ" => stats.ws = value,
            "BS" | "ДБ" => stats.bs = value,
            "S" | "СС" => stats.s = value,
            "Ag" | "Л" => stats.ag = value,
            "Int" => stats.int = value,
            "WP" | "О" => stats.wp = value,
            "Fel" | "СТ" => stats.fel = value,
            "HP" | "Здоровье" => {
                stats.max_hp = value;
                stats.current_hp = value;
            }
            "XP" | "Опыт" => stats.xp = value,
            _ => {}
        }
    }

    stats
}

/// First integer appearing in a piece of text, if any.
pub fn first_int(text: &str) -> Option<i32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse().ok()
}

/// Structured deltas extracted from one narrative turn. Produced by the
/// update parser, applied to every sheet in the session, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterUpdate {
    /// Damage (negative) or healing (positive).
    pub hp_change: i32,
    /// Permanent maximum-HP change.
    pub max_hp_change: i32,
    /// Experience gained; never negative by construction of the parser.
    pub xp_change: i32,
    /// Characteristic deltas keyed by sheet code ("WS", "ББ", ...).
    pub stat_changes: HashMap<String, i32>,
    pub skills_added: Vec<String>,
    pub conditions_added: Vec<String>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.hp_change == 0
            && self.max_hp_change == 0
            && self.xp_change == 0
            && self.stat_changes.is_empty()
            && self.skills_added.is_empty()
            && self.conditions_added.is_empty()
    }
}

/// Apply an update to a sheet, returning the new sheet and human-readable
/// warnings describing what changed.
///
/// HP results clamp to [0, max]; characteristic results clamp to [0, 100].
/// XP deltas are validated non-negative upstream, not here. Every successful
/// apply stamps an "updated at" footer.
pub fn apply_character_update(sheet: &str, update: &CharacterUpdate) -> (String, Vec<String>) {
    let mut warnings = Vec::new();
    let stats = parse_sheet_stats(sheet);
    let mut updated = sheet.to_string();

    if update.hp_change != 0 {
        updated = apply_hp_change(&updated, update.hp_change, &stats);
        if update.hp_change < 0 {
            warnings.push(format!("Character took {} damage", -update.hp_change));
        } else {
            warnings.push(format!("Character healed {} HP", update.hp_change));
        }
    }

    if update.xp_change != 0 {
        updated = apply_xp_change(&updated, update.xp_change, &stats);
        warnings.push(format!("Character gained {} XP", update.xp_change));
    }

    for (stat, change) in &update.stat_changes {
        updated = apply_stat_change(&updated, stat, *change);
        warnings.push(format!("{} changed by {}", stat, change));
    }

    for skill in &update.skills_added {
        updated = append_under_header(&updated, SKILLS_HEADER, None, skill);
        warnings.push(format!("Added skill: {}", skill));
    }

    for condition in &update.conditions_added {
        updated = append_under_header(
            &updated,
            CONDITIONS_HEADER,
            Some(CONDITIONS_MARKER),
            condition,
        );
        warnings.push(format!("Condition added: {}", condition));
    }

    updated.push_str(&format!(
        "\n\n*(Обновлено: {})*",
        Utc::now().format("%H:%M:%S")
    ));

    (updated, warnings)
}

fn apply_hp_change(sheet: &str, change: i32, stats: &SheetStats) -> String {
    let mut new_hp = stats.current_hp + change;
    if new_hp < 0 {
        new_hp = 0;
    } else if stats.max_hp > 0 && new_hp > stats.max_hp {
        new_hp = stats.max_hp;
    }

    sheet
        .replace(
            &format!("HP: {}", stats.current_hp),
            &format!("HP: {}", new_hp),
        )
        .replace(
            &format!("Здоровье: {}", stats.current_hp),
            &format!("Здоровье: {}", new_hp),
        )
}

fn apply_xp_change(sheet: &str, change: i32, stats: &SheetStats) -> String {
    let new_xp = stats.xp + change;
    sheet
        .replace(&format!("XP: {}", stats.xp), &format!("XP: {}", new_xp))
        .replace(
            &format!("Опыт: {}", stats.xp),
            &format!("Опыт: {}", new_xp),
        )
}

fn apply_stat_change(sheet: &str, stat: &str, change: i32) -> String {
    let marker = format!("{}:", stat);
    let Some(idx) = sheet.find(&marker) else {
        return sheet.to_string();
    };
    let Some(current) = first_int(&sheet[idx + marker.len()..]) else {
        return sheet.to_string();
    };

    let new_value = (current + change).clamp(0, 100);
    sheet.replace(
        &format!("{} {}", marker, current),
        &format!("{} {}", marker, new_value),
    )
}

/// Append "- item" under a section header, creating the header (and an
/// optional sub-marker) at the end of the sheet when absent.
fn append_under_header(sheet: &str, header: &str, marker: Option<&str>, item: &str) -> String {
    if let Some(idx) = sheet.find(header) {
        let insert_at = match marker {
            Some(marker) => match sheet[idx..].find(marker) {
                Some(rel) => idx + rel + marker.len(),
                None => idx + header.len(),
            },
            None => idx + header.len(),
        };
        let mut out = String::with_capacity(sheet.len() + item.len() + 4);
        out.push_str(&sheet[..insert_at]);
        out.push_str(&format!("\n- {}", item));
        out.push_str(&sheet[insert_at..]);
        out
    } else {
        let mut out = sheet.to_string();
        out.push_str(&format!("\n\n{}", header));
        if let Some(marker) = marker {
            out.push_str(&format!("\n\n{}", marker));
        }
        out.push_str(&format!("\n- {}", item));
        out
    }
}
