//! Best-effort extraction of character deltas from narrator text
//!
//! The narrator writes free prose; this scan looks for keyword windows in
//! Russian and English and pulls the first number out of matching lines.
//! False negatives are expected and fine. Unparseable text yields an empty
//! update - the turn never fails here.

use crate::domain::entities::{first_int, CharacterUpdate};

/// Parse one narrative response into structured deltas.
pub fn parse_character_update(response: &str) -> CharacterUpdate {
    let mut update = CharacterUpdate::default();

    for line in response.lines() {
        let lower = line.trim().to_lowercase();

        // XP first: "получил опыт" would otherwise also hit the bare
        // "получил" damage window.
        if lower.contains("получил опыт") || lower.contains("gained xp") {
            if let Some(xp) = first_int(line) {
                update.xp_change += xp;
            }
        } else if (lower.contains("получил") && lower.contains("урон"))
            || lower.contains("took damage")
        {
            if let Some(damage) = first_int(line) {
                update.hp_change -= damage;
            }
        }

        if lower.contains("вылечен") || lower.contains("healed") {
            if let Some(healing) = first_int(line) {
                update.hp_change += healing;
            }
        }

        if lower.contains("навык") || lower.contains("skill") {
            if let Some(skill) = extract_skill_name(line) {
                update.skills_added.push(skill);
            }
        }

        if lower.contains("ранение") || lower.contains("wound") {
            push_unique(&mut update.conditions_added, "Wounded");
        }
        if lower.contains("кровотечение") || lower.contains("bleeding") {
            push_unique(&mut update.conditions_added, "Bleeding");
        }
        if lower.contains("крит") || lower.contains("critical") {
            push_unique(&mut update.conditions_added, "Critical Wound");
        }
    }

    update
}

fn push_unique(conditions: &mut Vec<String>, condition: &str) {
    if !conditions.iter().any(|c| c == condition) {
        conditions.push(condition.to_string());
    }
}

/// Pull a skill name out of a line mentioning one: the first word after the
/// skill keyword that is longer than two characters and not punctuation.
fn extract_skill_name(line: &str) -> Option<String> {
    let lower = line.to_lowercase();
    let keyword_end = lower
        .find("навык")
        .map(|i| i + "навык".len())
        .or_else(|| lower.find("skill").map(|i| i + "skill".len()))?;

    line[keyword_end..]
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|word| word.chars().count() > 2)
        .map(|word| word.to_string())
}
