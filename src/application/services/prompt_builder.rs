//! Prompt assembly for narrative turns
//!
//! Pure composition of system framing, campaign context, character sheets,
//! rule references and the turn input. No network, no mutable shared state;
//! `build_game_prompt` is safe to call from any task.

use crate::domain::value_objects::GameInput;

/// Builds the full game-master prompt for one turn.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    campaign: String,
    scenario: Option<String>,
    rules: Vec<String>,
}

impl PromptBuilder {
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            scenario: None,
            rules: Vec::new(),
        }
    }

    pub fn set_scenario(&mut self, scenario: impl Into<String>) {
        self.scenario = Some(scenario.into());
    }

    pub fn add_rule(&mut self, rule: impl Into<String>) {
        self.rules.push(rule.into());
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Compose the complete prompt for a turn over the given input and the
    /// sheets of every character in play.
    pub fn build_game_prompt(&self, input: &GameInput, character_sheets: &[String]) -> String {
        let mut prompt = String::new();

        prompt.push_str("--- СИСТЕМА: WARHAMMER FANTASY ROLEPLAY 4E ---\n\n");
        prompt.push_str("Ты - Game Master (Гейм Мастер) для игры в WFRP 4e. ");
        prompt.push_str("Твоя задача - вести интересную и атмосферную игру, ");
        prompt.push_str("строго соблюдая правила WFRP 4th Edition.\n\n");

        if !self.campaign.is_empty() {
            prompt.push_str(&format!("--- КАМПАНИЯ: {} ---\n\n", self.campaign));
        }

        if let Some(scenario) = &self.scenario {
            prompt.push_str(&format!("СЦЕНАРИЙ:\n{}\n\n", scenario));
        }

        if !character_sheets.is_empty() {
            prompt.push_str("--- АКТИВНЫЕ ПЕРСОНАЖИ ИГРОКОВ ---\n\n");
            for (i, sheet) in character_sheets.iter().enumerate() {
                if i > 0 {
                    prompt.push_str("\n---\n\n");
                }
                prompt.push_str(sheet);
            }
            prompt.push_str("\n--- КОНЕЦ ПЕРСОНАЖЕЙ ---\n\n");
        }

        if !self.rules.is_empty() {
            prompt.push_str("--- ПРАВИЛА ---\n");
            prompt.push_str("Важно строго следовать правилам WFRP 4e. ");
            prompt.push_str("Для проверки механик используй:\n");
            for rule in &self.rules {
                prompt.push_str(&format!("  • {}\n", rule));
            }
            prompt.push_str("--- КОНЕЦ ПРАВИЛ ---\n\n");
        }

        prompt.push_str("--- ВВОД ИГРОКА ---\n");
        prompt.push_str(&format!("Источник: {}\n", input.source));
        prompt.push_str(&format!("Содержание: {}\n", input.content));
        prompt.push_str(&format!(
            "Время: {}\n",
            input.timestamp.format("%H:%M:%S")
        ));

        if !input.metadata.is_empty() {
            prompt.push_str("Метаданные:\n");
            let mut keys: Vec<_> = input.metadata.keys().collect();
            keys.sort();
            for key in keys {
                prompt.push_str(&format!("  • {}: {}\n", key, input.metadata[key]));
            }
        }

        prompt.push_str("--- КОНЕЦ ВВОДА ---\n\n");

        prompt.push_str("--- ИНСТРУКЦИЯ ---\n");
        prompt.push_str("Отвечай как Game Master. Веди игру атмосферно и интересно. ");
        prompt.push_str("При описании действий требуй проверок по правилам WFRP 4e. ");
        prompt.push_str(
            "Если игрок пытается выполнить действие, требуй соответствующей проверки \
             (Бой, Навык, Характеристика). ",
        );
        prompt.push_str(
            "Соблюдай все правила WFRP 4e, включая модификаторы, сложность и последствия \
             провала/успеха.\n",
        );
        prompt.push_str("--- КОНЕЦ ИНСТРУКЦИИ ---\n\n");

        prompt.push_str("GM RESPONSE:");

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_every_section_in_order() {
        let mut builder = PromptBuilder::new("Враг внутри");
        builder.set_scenario("Партия прибывает в Альтдорф.");
        builder.add_rule("Skill checks use d100");

        let input = GameInput::player("Иду в таверну").with_metadata("player_id", "42");
        let sheets = vec!["# Имя: Гюнтер".to_string(), "# Имя: Эльза".to_string()];
        let prompt = builder.build_game_prompt(&input, &sheets);

        assert!(prompt.contains("WARHAMMER FANTASY ROLEPLAY 4E"));
        assert!(prompt.contains("КАМПАНИЯ: Враг внутри"));
        assert!(prompt.contains("СЦЕНАРИЙ:\nПартия прибывает в Альтдорф."));
        assert!(prompt.contains("# Имя: Гюнтер"));
        assert!(prompt.contains("# Имя: Эльза"));
        assert!(prompt.contains("Skill checks use d100"));
        assert!(prompt.contains("Содержание: Иду в таверну"));
        assert!(prompt.contains("player_id: 42"));
        assert!(prompt.ends_with("GM RESPONSE:"));

        let campaign_idx = prompt.find("КАМПАНИЯ").unwrap();
        let sheets_idx = prompt.find("АКТИВНЫЕ ПЕРСОНАЖИ").unwrap();
        let input_idx = prompt.find("ВВОД ИГРОКА").unwrap();
        assert!(campaign_idx < sheets_idx && sheets_idx < input_idx);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let builder = PromptBuilder::new("");
        let prompt = builder.build_game_prompt(&GameInput::player("ау"), &[]);
        assert!(!prompt.contains("КАМПАНИЯ"));
        assert!(!prompt.contains("СЦЕНАРИЙ"));
        assert!(!prompt.contains("АКТИВНЫЕ ПЕРСОНАЖИ"));
        assert!(!prompt.contains("ПРАВИЛА ---"));
    }
}
