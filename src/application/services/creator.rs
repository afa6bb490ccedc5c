//! Character-creation workflow
//!
//! A per-conversation state machine that walks the player through the
//! ordered build steps. Input is classified first (§ classifier): rules
//! questions and the name-generation command are side channels that never
//! advance the state. Dice and the LLM are injected so every transition is
//! deterministic under test.

use std::sync::Arc;

use crate::application::ports::outbound::{CharacterStorePort, LlmPort, StoreError};
use crate::application::services::classifier::{InputClass, InputClassifier, KeywordClassifier};
use crate::application::services::dice::{DiceRoller, ThreadRngDice};
use crate::domain::entities::{CareerMethod, CreationData, CreationState, RaceMethod, StatsMethod};
use crate::domain::value_objects::{
    career_catalog, find_career, CareerClass, Characteristic, Race, RolledCareer,
    FIRST_ROLL_CAREER_XP, RANDOM_RACE_BONUS_XP, THREE_ROLLS_CAREER_XP,
};

const HAIR_COLORS: [&str; 6] = ["чёрные", "каштановые", "русые", "рыжие", "седые", "белые"];
const EYE_COLORS: [&str; 5] = ["карие", "голубые", "зелёные", "серые", "чёрные"];

const LLM_UNAVAILABLE: &str =
    "Извини, LLM сейчас недоступен. Напиши имя персонажа вручную.";

/// Result of feeding one input into the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub message: String,
    /// Whether the workflow state advanced as a result of this input.
    pub advanced: bool,
}

impl StepOutcome {
    fn advanced(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            advanced: true,
        }
    }

    fn stay(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            advanced: false,
        }
    }
}

/// Sub-step bookkeeping inside the Career state.
#[derive(Debug, Clone)]
enum CareerPending {
    /// Three careers were rolled; waiting for a 1-3 pick.
    ThreeRolls([RolledCareer; 3]),
    /// Waiting for a career name from the catalog.
    Manual,
}

/// The character-creation state machine for one conversation.
///
/// Not internally synchronized; the owning registry serializes access per
/// conversation id.
pub struct CharacterCreator {
    state: CreationState,
    data: CreationData,
    classifier: Box<dyn InputClassifier>,
    dice: Box<dyn DiceRoller>,
    llm: Option<Arc<dyn LlmPort>>,
    store: Option<Arc<dyn CharacterStorePort>>,
    career_pending: Option<CareerPending>,
    cancelled: bool,
}

impl CharacterCreator {
    pub fn new() -> Self {
        Self {
            state: CreationState::Name,
            data: CreationData::new(),
            classifier: Box::new(KeywordClassifier),
            dice: Box::new(ThreadRngDice),
            llm: None,
            store: None,
            career_pending: None,
            cancelled: false,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmPort>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CharacterStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_dice(mut self, dice: Box<dyn DiceRoller>) -> Self {
        self.dice = dice;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn InputClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    pub fn data(&self) -> &CreationData {
        &self.data
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, CreationState::Save | CreationState::Complete)
    }

    /// True once the player declined the final review. The creator is spent;
    /// nothing was persisted.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: CreationState) {
        self.state = state;
    }

    /// Localized instructional text for the current step.
    pub fn prompt(&self) -> String {
        match self.state {
            CreationState::Name => "Как тебя зовут, герой? Напиши имя персонажа.\n\n\
                 💡 Подсказки:\n\
                 • Просто напиши имя (например: Иван, Мария)\n\
                 • Напиши \"сгенери имя\" или \"сгенери сам\" - я придумаю имя сам"
                .to_string(),
            CreationState::Race => "Выбери расу:\n\
                 1. Человек (+0 XP)\n\
                 2. Полурослик (+0 XP)\n\
                 3. Гном (+0 XP)\n\
                 4. Высший эльф (+0 XP)\n\
                 5. Лесной эльф (+0 XP)\n\n\
                 Или напиши \"бросить\" - случайный выбор (d100) +20 XP"
                .to_string(),
            CreationState::Career => "Выбери способ выбора карьеры:\n\
                 1. Первый бросок принять (+50 XP)\n\
                 2. Три броска - выбрать одну (+25 XP)\n\
                 3. Выбрать самому (+0 XP)\n\n\
                 Напиши номер варианта."
                .to_string(),
            CreationState::Stats => "Выбери способ генерации характеристик:\n\
                 1. Случайные без перестановок (+50 XP)\n\
                 2. Случайные с перестановкой (+25 XP)\n\
                 3. Ручное распределение 100 пунктов (0 XP)\n\n\
                 Напиши номер варианта.\n\
                 Примечание: минимум 4, максимум 18 на характеристику."
                .to_string(),
            CreationState::Skills => "Теперь выберем навыки.\n\n\
                 От расы ты получаешь:\n\
                 - 3 навыка с +5 шагами развития\n\
                 - 3 навыка с +3 шагами развития\n\n\
                 От карьеры получаешь 40 шагов развития (распределить между 8 навыками).\n\n\
                 Напиши \"далее\" когда будешь готов к следующему шагу."
                .to_string(),
            CreationState::Talents => "Выбери таланты.\n\n\
                 От расы и карьеры ты получаешь таланты (перечислены в правилах).\n\n\
                 Напиши \"далее\" для продолжения."
                .to_string(),
            CreationState::Gear => "Снаряжение.\n\n\
                 От класса: базовые предметы (кинжал, кошелёк, одежда, еда на 1 день)\n\
                 От карьеры: все предметы из строчки \"Имущество\" первой ступени\n\
                 Деньги: рассчитываются по статусу\n\n\
                 Напиши \"далее\" для продолжения."
                .to_string(),
            CreationState::Appearance => "Определим внешность.\n\n\
                 Используй 2d10 (НЕ 1d100!):\n\
                 - Волосы: бросок по таблице волос твоей расы\n\
                 - Глаза: бросок по таблице глаз\n\
                 - Рост: формула зависит от расы\n\
                 - Возраст: минимальный возраст расы + 2d10\n\n\
                 Напиши \"далее\" для броска."
                .to_string(),
            CreationState::Personality => "Оживим персонажа!\n\n\
                 Напиши:\n\
                 1. Две-три сильные стороны характера (через запятую)\n\
                 2. Две-три слабые стороны (через запятую)\n\
                 3. Кратко: Откуда персонаж и чем занимался до этого?"
                .to_string(),
            CreationState::Review => self.data.review_summary(),
            CreationState::Save => "Сохраняю персонажа...".to_string(),
            CreationState::Complete => "Персонаж сохранён! Игра начинается!".to_string(),
        }
    }

    /// Feed one piece of player input into the workflow.
    pub async fn process_input(&mut self, input: &str) -> StepOutcome {
        self.audit_step(input).await;

        match self.classifier.classify(input, self.state) {
            InputClass::GenerateCommand => return self.generate_name().await,
            InputClass::Question => return self.answer_question(input).await,
            InputClass::Answer => {}
        }

        match self.state {
            CreationState::Name => self.process_name(input).await,
            CreationState::Race => self.process_race(input),
            CreationState::Career => self.process_career(input),
            CreationState::Stats => self.process_stats(input),
            CreationState::Skills => {
                self.state = CreationState::Talents;
                StepOutcome::advanced(format!(
                    "Таланты:\nТаланты от расы и карьеры:\n(будут добавлены автоматически из правил)\n\n{}",
                    "Напиши \"далее\" для продолжения."
                ))
            }
            CreationState::Talents => {
                self.state = CreationState::Gear;
                StepOutcome::advanced(format!(
                    "Снаряжение:\nДеньги: {} (по статусу {} {})\n\nСнаряжение будет добавлено из правил карьеры.\n\nНапиши \"далее\" для продолжения.",
                    self.data.money, self.data.status, self.data.status_level
                ))
            }
            CreationState::Gear => {
                self.state = CreationState::Appearance;
                StepOutcome::advanced(self.prompt())
            }
            CreationState::Appearance => self.process_appearance(),
            CreationState::Personality => self.process_personality(input),
            CreationState::Review => self.process_review(input),
            CreationState::Save | CreationState::Complete => {
                StepOutcome::stay("Персонаж сохранён! Игра начинается!")
            }
        }
    }

    /// Render and persist the final character record. Only meaningful once
    /// the review was confirmed.
    pub async fn save_to_file(&mut self) -> Result<std::path::PathBuf, StoreError> {
        let store = self.store.as_ref().ok_or_else(|| {
            StoreError::NotFound("character store is not configured".to_string())
        })?;
        let path = store
            .save_final_sheet(&self.data.name, &self.data.to_markdown())
            .await?;
        self.state = CreationState::Complete;
        tracing::info!(name = %self.data.name, path = %path.display(), "character saved");
        Ok(path)
    }

    // --- side channels -----------------------------------------------------

    async fn generate_name(&mut self) -> StepOutcome {
        let Some(llm) = &self.llm else {
            return StepOutcome::stay(LLM_UNAVAILABLE);
        };

        let prompt = "Сгенерируй одно имя персонажа для Warhammer Fantasy Roleplay \
                      (человек, средневековый сеттинг Империи).\n\
                      Верни только имя, без пояснений, без кавычек, без форматирования, \
                      без звездочек.";

        match llm.generate(prompt, &[]).await {
            Ok(raw) => {
                let name = sanitize_generated_name(&raw);
                tracing::debug!(raw = %raw, clean = %name, "generated character name");
                self.data.name = name.clone();
                StepOutcome::stay(format!(
                    "Сгенерировано имя: {}\n\nЭто имя подходит? Напиши 'да' чтобы принять или другое имя.",
                    name
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "name generation failed");
                StepOutcome::stay(
                    "Извини, не получилось сгенерировать имя. API LLM недоступен. \
                     Напиши имя вручную.",
                )
            }
        }
    }

    async fn answer_question(&mut self, question: &str) -> StepOutcome {
        let Some(llm) = &self.llm else {
            return StepOutcome::stay(
                "Извини, LLM сейчас недоступен. Попробуй задать вопрос позже.",
            );
        };

        let prompt = format!(
            "{}\n\n\
             Ты Game Master в Warhammer Fantasy Roleplay 4th Edition.\n\
             Отвечай на вопрос игрока о правилах создания персонажа.\n\
             Ответь кратко и по существу на русском языке.\n\n\
             Вопрос: {}\n\n\
             Ответ:",
            self.wfrp_prompt_for_state(),
            question
        );

        match llm.generate(&prompt, &[]).await {
            Ok(raw) => {
                let answer = raw.replace("**", "*").replace('_', " ");
                StepOutcome::stay(format!(
                    "📚 *Пояснение:*\n\n{}\n\n---\n\n💡 *К текущему шагу:*\n\n{}\n\nНапиши свой ответ или задай ещё вопрос.",
                    answer,
                    self.prompt()
                ))
            }
            Err(e) => StepOutcome::stay(format!(
                "Извини, произошла ошибка при запросе к LLM: {}\n\nПопробуй ещё раз или спроси по-другому.",
                e
            )),
        }
    }

    /// Per-state framing prepended to side-channel questions.
    fn wfrp_prompt_for_state(&self) -> &'static str {
        match self.state {
            CreationState::Race => {
                "Объясни, как выбрать расу в WFRP 4E. Какие расы доступны и какие дают бонусы?"
            }
            CreationState::Career => {
                "Объясни, как выбрать карьеру в WFRP 4E. Что такое классы карьер и как они влияют на персонажа?"
            }
            CreationState::Stats => {
                "Объясни систему характеристик WFRP 4E: Боевая Пригодность (ББ), Дистанция Боя (ДБ), \
                 Сила (СС), Инициатива (И), Ловкость (Л), Общение (О), Стойкость (СТ), Классовая (К). \
                 Как они влияют на персонажа и как распределять очки?"
            }
            CreationState::Skills => {
                "Объясни систему навыков в WFRP 4E. Как выбираются навыки от расы и карьеры?"
            }
            CreationState::Talents => {
                "Объясни систему талантов в WFRP 4E. Как получаются таланты?"
            }
            CreationState::Gear => {
                "Объясни систему снаряжения в WFRP 4E. Как выбирается начальное снаряжение?"
            }
            CreationState::Appearance => {
                "Объясни, как генерируется внешность персонажа в WFRP 4E (возраст, рост, волосы, глаза)."
            }
            _ => "Расскажи подробнее о создании персонажа в WFRP 4E.",
        }
    }

    // --- state handlers ----------------------------------------------------

    async fn process_name(&mut self, input: &str) -> StepOutcome {
        let normalized = input.trim().to_lowercase();

        // Confirm a previously generated name.
        if matches!(normalized.as_str(), "да" | "yes" | "y") {
            if !self.data.name.is_empty() {
                self.state = CreationState::Race;
                return StepOutcome::advanced(self.prompt());
            }
            return StepOutcome::stay("Имя не задано. Напиши имя персонажа.");
        }

        // Reject a previously generated name.
        if normalized == "нет" {
            self.data.name.clear();
            return StepOutcome::stay(
                "Хорошо, имя отклонено. Напиши имя персонажа или \"сгенери имя\".",
            );
        }

        // Ask for another generated one.
        if normalized.contains("друг") || matches!(normalized.as_str(), "ещё" | "еще") {
            return self.generate_name().await;
        }

        if input.trim().chars().count() < 2 {
            return StepOutcome::stay(
                "Имя слишком короткое. Напиши имя персонажа (минимум 2 буквы).",
            );
        }

        self.data.name = input.trim().to_string();
        self.state = CreationState::Race;
        StepOutcome::advanced(self.prompt())
    }

    fn process_race(&mut self, input: &str) -> StepOutcome {
        let normalized = input.trim().to_lowercase();

        if matches!(normalized.as_str(), "бросить" | "roll" | "random") {
            let roll = self.dice.d100();
            let race = Race::from_roll(roll);
            self.data.race = Some(race);
            self.data.race_method = Some(RaceMethod::Random);
            self.data.xp.from_race = RANDOM_RACE_BONUS_XP;
            self.data.characteristics = race.base_characteristics();
            self.state = CreationState::Career;
            return StepOutcome::advanced(format!(
                "(d100 = {}) → {}!\n+{} XP (всего: {})\n\n{}",
                roll,
                race,
                RANDOM_RACE_BONUS_XP,
                self.data.xp.total(),
                self.prompt()
            ));
        }

        if let Some(race) = Race::from_input(input) {
            self.data.race = Some(race);
            self.data.race_method = Some(RaceMethod::Manual);
            self.data.characteristics = race.base_characteristics();
            self.state = CreationState::Career;
            return StepOutcome::advanced(format!("Выбрал: {}\n\n{}", race, self.prompt()));
        }

        StepOutcome::stay(
            "Не понял выбор. Напиши номер (1-5), расу или 'бросить' для случайного выбора.",
        )
    }

    fn process_career(&mut self, input: &str) -> StepOutcome {
        // Pending pick among three rolled careers.
        if let Some(CareerPending::ThreeRolls(options)) = self.career_pending.clone() {
            if let Ok(choice) = input.trim().parse::<usize>() {
                if (1..=3).contains(&choice) {
                    let picked = options[choice - 1];
                    self.apply_career(picked.class, picked.career);
                    self.data.career_method = Some(CareerMethod::ThreeRolls);
                    self.data.xp.from_career = THREE_ROLLS_CAREER_XP;
                    self.career_pending = None;
                    self.state = CreationState::Stats;
                    return StepOutcome::advanced(format!(
                        "Карьера: {} → {}\n+ {} XP (всего: {})\n\n{}",
                        picked.class,
                        picked.career,
                        THREE_ROLLS_CAREER_XP,
                        self.data.xp.total(),
                        self.prompt()
                    ));
                }
            }
            return StepOutcome::stay("Напиши номер варианта (1-3).");
        }

        // Pending manual selection from the catalog.
        if matches!(self.career_pending, Some(CareerPending::Manual)) {
            if let Some((class, career)) = find_career(input) {
                self.apply_career(class, career);
                self.data.career_method = Some(CareerMethod::Manual);
                self.career_pending = None;
                self.state = CreationState::Stats;
                return StepOutcome::advanced(format!(
                    "Карьера: {} → {}\n\n{}",
                    class,
                    career,
                    self.prompt()
                ));
            }
            return StepOutcome::stay("Не нашёл такую карьеру. Напиши название из списка.");
        }

        let Ok(choice) = input.trim().parse::<u32>() else {
            return StepOutcome::stay("Напиши номер варианта (1-3).");
        };

        match choice {
            1 => {
                let rolled = self.roll_career();
                self.apply_career(rolled.class, rolled.career);
                self.data.career_method = Some(CareerMethod::FirstRoll);
                self.data.xp.from_career = FIRST_ROLL_CAREER_XP;
                self.state = CreationState::Stats;
                StepOutcome::advanced(format!(
                    "Карьера: {} → {} (d100={})\n+ {} XP (всего: {})\n\n{}",
                    rolled.class,
                    rolled.career,
                    rolled.roll,
                    FIRST_ROLL_CAREER_XP,
                    self.data.xp.total(),
                    self.prompt()
                ))
            }
            2 => {
                let options = [self.roll_career(), self.roll_career(), self.roll_career()];
                let mut msg = String::from("Бросили три раза:\n");
                for (i, option) in options.iter().enumerate() {
                    msg.push_str(&format!("{}. {} (d100={})\n", i + 1, option, option.roll));
                }
                msg.push_str("\nКакую выбираешь? Напиши номер (1-3).");
                self.career_pending = Some(CareerPending::ThreeRolls(options));
                StepOutcome::stay(msg)
            }
            3 => {
                self.career_pending = Some(CareerPending::Manual);
                StepOutcome::stay(format!(
                    "Выбери карьеру из списка (напиши название):\n{}",
                    career_catalog()
                ))
            }
            _ => StepOutcome::stay("Напиши номер варианта (1-3)."),
        }
    }

    fn roll_career(&mut self) -> RolledCareer {
        let roll = self.dice.d100();
        let class = CareerClass::from_roll(roll);
        let careers = class.careers();
        let career = careers[self.dice.range(careers.len() as u32) as usize];
        RolledCareer { class, career, roll }
    }

    fn apply_career(&mut self, class: CareerClass, career: &str) {
        self.data.class = Some(class);
        self.data.career = career.to_string();
        self.data.career_rank = "Ранг 1".to_string();
        self.data.status = "Медный".to_string();
        self.data.status_level = 1;
    }

    fn process_stats(&mut self, input: &str) -> StepOutcome {
        let Ok(choice) = input.trim().parse::<u32>() else {
            return StepOutcome::stay("Напиши номер варианта (1-3).");
        };

        match choice {
            1 => {
                self.data.stats_method = Some(StatsMethod::RandomNoSwap);
                self.data.xp.from_stats = 50;
            }
            2 => {
                self.data.stats_method = Some(StatsMethod::RandomSwap);
                self.data.xp.from_stats = 25;
            }
            3 => {
                self.data.stats_method = Some(StatsMethod::Manual);
                self.data.xp.from_stats = 0;
                self.state = CreationState::Skills;
                return StepOutcome::advanced(
                    "Распредели 100 пунктов между 10 характеристиками \
                     (минимум 4, максимум 18 на каждую).\n\n\
                     Формат: WS=XX BS=XX S=XX T=XX I=XX Ag=XX Dex=XX Int=XX WP=XX Fel=XX",
                );
            }
            _ => return StepOutcome::stay("Напиши номер варианта (1-3)."),
        }

        self.roll_stats();
        self.data.derive_secondary_stats();
        self.data.money = (self.dice.d10() + self.dice.d10()) as i32 + 2 * self.data.status_level;
        self.state = CreationState::Skills;

        StepOutcome::advanced(format!(
            "Характеристики (бросок 2d10+10 + бонус расы):\n{}\n\n+ {} XP (всего: {})\n\n{}",
            self.data.stats_summary(),
            self.data.xp.from_stats,
            self.data.xp.total(),
            self.prompt()
        ))
    }

    /// Roll every characteristic as 2d10+10 plus the race's flat bonus.
    fn roll_stats(&mut self) {
        let bonus = self
            .data
            .race
            .map(|r| r.stat_roll_bonus())
            .unwrap_or(30);

        for characteristic in Characteristic::ALL {
            let roll = self.dice.d10() + self.dice.d10() + 10;
            self.data
                .characteristics
                .set(characteristic, roll as i32 + bonus);
        }
    }

    fn process_appearance(&mut self) -> StepOutcome {
        // d20 against 6- and 5-entry tables: rolls past the end clamp to the
        // last entry. Inherited range mismatch, kept as-is.
        let hair_roll = (self.dice.d20() as usize).min(HAIR_COLORS.len());
        let eye_roll = (self.dice.d20() as usize).min(EYE_COLORS.len());
        self.data.hair_color = HAIR_COLORS[hair_roll - 1].to_string();
        self.data.eye_color = EYE_COLORS[eye_roll - 1].to_string();

        let base_age = self.data.race.map(|r| r.base_age()).unwrap_or(18);
        self.data.age = base_age + (self.dice.d10() + self.dice.d10()) as i32 + 2;
        self.data.height = format!("{} см", 150 + self.dice.range(40));

        self.state = CreationState::Personality;
        StepOutcome::advanced(format!(
            "Внешность:\n- Волосы: {}\n- Глаза: {}\n- Рост: {}\n- Возраст: {}\n\n{}",
            self.data.hair_color,
            self.data.eye_color,
            self.data.height,
            self.data.age,
            self.prompt()
        ))
    }

    fn process_personality(&mut self, input: &str) -> StepOutcome {
        let mut lines = input.lines();
        if let Some(line) = lines.next() {
            self.data.strengths = split_list(line);
        }
        if let Some(line) = lines.next() {
            self.data.weaknesses = split_list(line);
        }
        if let Some(line) = lines.next() {
            self.data.background = line.trim().to_string();
        }
        self.data.motivation = "Стать искателем приключений".to_string();

        self.state = CreationState::Review;
        StepOutcome::advanced(self.prompt())
    }

    fn process_review(&mut self, input: &str) -> StepOutcome {
        let normalized = input.trim().to_lowercase();
        if matches!(normalized.as_str(), "да" | "yes" | "1") {
            self.state = CreationState::Save;
            return StepOutcome::advanced("Сохраняю персонажа...");
        }
        self.cancelled = true;
        StepOutcome::stay("Сохранение отменено. Напиши /newchar для начала заново.")
    }

    // --- audit trail -------------------------------------------------------

    /// Persist the raw input and a data snapshot for the current step.
    /// Side effect only; failures are logged and never fail the step.
    async fn audit_step(&self, input: &str) {
        let Some(store) = &self.store else { return };
        let Some(step) = self.state.step_file_name() else {
            return;
        };

        let content = format!(
            "# Шаг: {}\nВремя: {}\n\nВвод: {}\n\n\n## Данные персонажа:\n- Имя: {}\n- Раса: {}\n- Карьера: {}\n",
            step,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
            input,
            self.data.name,
            self.data.race_name(),
            self.data.career,
        );

        let character = if self.data.name.is_empty() {
            "new_character"
        } else {
            &self.data.name
        };

        if let Err(e) = store.append_creation_step(character, step, &content).await {
            tracing::warn!(error = %e, step, "failed to write creation audit step");
        }
    }
}

impl Default for CharacterCreator {
    fn default() -> Self {
        Self::new()
    }
}

fn split_list(line: &str) -> Vec<String> {
    line.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Strip markdown emphasis and quoting the LLM tends to wrap names in.
fn sanitize_generated_name(raw: &str) -> String {
    raw.trim()
        .replace("**", "")
        .replace('*', "")
        .replace('_', "")
        .trim_matches(['"', '«', '»', '-', ' '])
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::outbound::LlmError;
    use crate::application::services::dice::SequenceDice;
    use crate::domain::entities::Character;
    use crate::domain::value_objects::{ChatId, PlayerId};

    struct StubLlm {
        reply: String,
    }

    #[async_trait]
    impl LlmPort for StubLlm {
        async fn generate(&self, _: &str, _: &[String]) -> Result<String, LlmError> {
            Ok(self.reply.clone())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<(String, String)>>,
        steps: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CharacterStorePort for MemoryStore {
        async fn load_character(
            &self,
            _: &PlayerId,
            card: &str,
        ) -> Result<Character, StoreError> {
            Err(StoreError::NotFound(card.to_string()))
        }

        async fn save_character(&self, _: &Character) -> Result<(), StoreError> {
            Ok(())
        }

        async fn save_final_sheet(
            &self,
            name: &str,
            markdown: &str,
        ) -> Result<PathBuf, StoreError> {
            self.saved
                .lock()
                .unwrap()
                .push((name.to_string(), markdown.to_string()));
            Ok(PathBuf::from(format!("character_{}.md", name)))
        }

        async fn append_creation_step(
            &self,
            _: &str,
            step: &str,
            _: &str,
        ) -> Result<(), StoreError> {
            self.steps.lock().unwrap().push(step.to_string());
            Ok(())
        }

        async fn load_campaign_scenario(&self, _: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn append_history(&self, _: ChatId, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn creator_with_dice(values: Vec<u32>) -> CharacterCreator {
        CharacterCreator::new().with_dice(Box::new(SequenceDice::new(values)))
    }

    #[tokio::test]
    async fn name_answer_advances_to_race() {
        let mut creator = CharacterCreator::new();
        let outcome = creator.process_input("Иван").await;
        assert!(outcome.advanced);
        assert!(outcome.message.contains("Выбери расу"));
        assert_eq!(creator.data().name, "Иван");
        assert_eq!(creator.state(), CreationState::Race);
    }

    #[tokio::test]
    async fn short_name_reprompts_without_transition() {
        let mut creator = CharacterCreator::new();
        let outcome = creator.process_input("Я").await;
        assert!(!outcome.advanced);
        assert!(outcome.message.contains("слишком короткое"));
        assert_eq!(creator.state(), CreationState::Name);
    }

    #[tokio::test]
    async fn questions_never_change_state_in_any_step() {
        let llm = Arc::new(StubLlm {
            reply: "Это правило работает так.".to_string(),
        });
        for state in [
            CreationState::Name,
            CreationState::Race,
            CreationState::Career,
            CreationState::Stats,
            CreationState::Skills,
            CreationState::Talents,
            CreationState::Gear,
            CreationState::Appearance,
            CreationState::Personality,
            CreationState::Review,
        ] {
            let mut creator = CharacterCreator::new().with_llm(llm.clone());
            creator.force_state(state);
            let outcome = creator.process_input("Что такое ББ?").await;
            assert!(!outcome.advanced);
            assert_eq!(creator.state(), state, "state {state:?} must not move");
            assert!(outcome.message.contains("Пояснение"));
        }
    }

    #[tokio::test]
    async fn generate_name_stores_result_and_awaits_confirmation() {
        let llm = Arc::new(StubLlm {
            reply: "**Альдрик**".to_string(),
        });
        let mut creator = CharacterCreator::new().with_llm(llm);

        let outcome = creator.process_input("сгенери имя").await;
        assert!(!outcome.advanced);
        assert_eq!(creator.state(), CreationState::Name);
        assert_eq!(creator.data().name, "Альдрик");
        assert!(outcome.message.contains("Это имя подходит?"));

        let outcome = creator.process_input("да").await;
        assert!(outcome.advanced);
        assert_eq!(creator.state(), CreationState::Race);
    }

    #[tokio::test]
    async fn generate_name_without_llm_degrades_gracefully() {
        let mut creator = CharacterCreator::new();
        let outcome = creator.process_input("сгенери имя").await;
        assert!(!outcome.advanced);
        assert!(outcome.message.contains("недоступен"));
        assert_eq!(creator.state(), CreationState::Name);
    }

    #[tokio::test]
    async fn rejecting_generated_name_clears_it() {
        let llm = Arc::new(StubLlm {
            reply: "Альдрик".to_string(),
        });
        let mut creator = CharacterCreator::new().with_llm(llm);
        creator.process_input("сгенери имя").await;
        let outcome = creator.process_input("нет").await;
        assert!(!outcome.advanced);
        assert!(creator.data().name.is_empty());
        assert_eq!(creator.state(), CreationState::Name);
    }

    #[tokio::test]
    async fn race_roll_50_yields_human_with_bonus_xp() {
        let mut creator = creator_with_dice(vec![50]);
        creator.process_input("Иван").await;
        let outcome = creator.process_input("бросить").await;
        assert!(outcome.advanced);
        assert_eq!(creator.data().race, Some(Race::Human));
        assert_eq!(creator.data().xp.from_race, 20);
        assert_eq!(creator.data().xp.total(), 20);
        assert_eq!(creator.state(), CreationState::Career);
        assert!(outcome.message.contains("(d100 = 50)"));
        assert!(outcome.message.contains("Человек"));
    }

    #[tokio::test]
    async fn race_roll_97_yields_dwarf_and_100_wood_elf() {
        let mut creator = creator_with_dice(vec![97]);
        creator.process_input("Иван").await;
        creator.process_input("бросить").await;
        assert_eq!(creator.data().race, Some(Race::Dwarf));

        let mut creator = creator_with_dice(vec![100]);
        creator.process_input("Иван").await;
        creator.process_input("бросить").await;
        assert_eq!(creator.data().race, Some(Race::WoodElf));
    }

    #[tokio::test]
    async fn manual_race_pick_awards_no_bonus_xp() {
        let mut creator = CharacterCreator::new();
        creator.process_input("Иван").await;
        let outcome = creator.process_input("3").await;
        assert!(outcome.advanced);
        assert_eq!(creator.data().race, Some(Race::Dwarf));
        assert_eq!(creator.data().xp.from_race, 0);
        // Base characteristics applied from the race table.
        assert_eq!(creator.data().characteristics.ws, 40);
        assert_eq!(creator.data().characteristics.t, 40);
    }

    #[tokio::test]
    async fn unknown_race_input_reprompts() {
        let mut creator = CharacterCreator::new();
        creator.process_input("Иван").await;
        let outcome = creator.process_input("орк").await;
        assert!(!outcome.advanced);
        assert_eq!(creator.state(), CreationState::Race);
    }

    #[tokio::test]
    async fn first_roll_career_awards_fifty_xp() {
        // d100=40 -> class bucket 4 (Крестьянин); pick index 2 -> Пастух.
        let mut creator = creator_with_dice(vec![40, 2]);
        creator.process_input("Иван").await;
        creator.process_input("1").await; // race: Человек
        let outcome = creator.process_input("1").await;
        assert!(outcome.advanced);
        assert_eq!(creator.data().class, Some(CareerClass::Peasant));
        assert_eq!(creator.data().career, "Пастух");
        assert_eq!(creator.data().xp.from_career, 50);
        assert_eq!(creator.data().status_level, 1);
        assert_eq!(creator.state(), CreationState::Stats);
    }

    #[tokio::test]
    async fn three_rolls_career_waits_for_the_pick() {
        // Rolls 10/30/50 with picks 0/1/2 inside each class triple.
        let mut creator = creator_with_dice(vec![10, 0, 30, 1, 50, 2]);
        creator.process_input("Иван").await;
        creator.process_input("1").await;

        let outcome = creator.process_input("2").await;
        assert!(!outcome.advanced);
        assert!(outcome.message.contains("Бросили три раза"));
        assert_eq!(creator.state(), CreationState::Career);

        let outcome = creator.process_input("2").await;
        assert!(outcome.advanced);
        assert_eq!(creator.data().xp.from_career, 25);
        assert_eq!(creator.state(), CreationState::Stats);
        // Roll 30 buckets into Придворный, pick 1 -> Оруженосец.
        assert_eq!(creator.data().class, Some(CareerClass::Courtier));
        assert_eq!(creator.data().career, "Оруженосец");
    }

    #[tokio::test]
    async fn manual_career_matches_catalog_names() {
        let mut creator = CharacterCreator::new();
        creator.process_input("Иван").await;
        creator.process_input("1").await;

        let outcome = creator.process_input("3").await;
        assert!(!outcome.advanced);
        assert!(outcome.message.contains("Выбери карьеру"));

        let outcome = creator.process_input("Кузнец").await;
        assert!(outcome.advanced);
        assert_eq!(creator.data().career, "Кузнец");
        assert_eq!(creator.data().xp.from_career, 0);
        assert_eq!(creator.state(), CreationState::Stats);
    }

    #[tokio::test]
    async fn random_stats_derive_secondary_values() {
        // Every d10 resolves to 5: each characteristic = 5+5+10+30 = 50.
        let mut creator = creator_with_dice(vec![5]);
        creator.process_input("Иван").await;
        creator.process_input("1").await; // Человек
        creator.process_input("3").await; // career: manual
        creator.process_input("Стражник").await;

        let outcome = creator.process_input("1").await;
        assert!(outcome.advanced);
        let data = creator.data();
        assert_eq!(data.characteristics.ws, 50);
        assert_eq!(data.characteristics.fel, 50);
        // HP = S/10 + 2*(T/10) + WP/10 = 5 + 10 + 5
        assert_eq!(data.hp, 20);
        assert_eq!(data.fate, 2);
        assert_eq!(data.movement, 4);
        // Money = 2d10 + 2*status level = 5+5+2
        assert_eq!(data.money, 12);
        assert_eq!(data.xp.from_stats, 50);
        assert_eq!(creator.state(), CreationState::Skills);
    }

    #[tokio::test]
    async fn manual_stats_keep_the_documented_format_note() {
        let mut creator = CharacterCreator::new();
        creator.process_input("Иван").await;
        creator.process_input("1").await;
        creator.process_input("3").await;
        creator.process_input("Стражник").await;

        let outcome = creator.process_input("3").await;
        assert!(outcome.advanced);
        // The documented point allocation is internally inconsistent
        // (10 x 18 > 100); it is preserved verbatim, not corrected.
        assert!(outcome.message.contains("100 пунктов"));
        assert!(outcome.message.contains("максимум 18"));
        assert_eq!(creator.data().xp.from_stats, 0);
        assert_eq!(creator.state(), CreationState::Skills);
    }

    #[tokio::test]
    async fn full_walkthrough_reaches_save_with_balanced_ledger() {
        let store = Arc::new(MemoryStore::default());
        // SequenceDice repeats 50: d100s are 50, d10s clamp to 10, d20s to 20.
        let mut creator = creator_with_dice(vec![50]).with_store(store.clone());

        creator.process_input("Иван").await;
        creator.process_input("бросить").await; // Человек, +20
        creator.process_input("1").await; // карьера по первому броску, +50
        creator.process_input("1").await; // случайные характеристики, +50
        assert_eq!(creator.state(), CreationState::Skills);

        creator.process_input("далее").await;
        assert_eq!(creator.state(), CreationState::Talents);
        creator.process_input("далее").await;
        assert_eq!(creator.state(), CreationState::Gear);
        creator.process_input("далее").await;
        assert_eq!(creator.state(), CreationState::Appearance);

        let outcome = creator.process_input("далее").await;
        assert_eq!(creator.state(), CreationState::Personality);
        // d20 rolls of 20 clamp into the 6- and 5-entry tables.
        assert_eq!(creator.data().hair_color, "белые");
        assert_eq!(creator.data().eye_color, "чёрные");
        // Age = 18 + 10 + 10 + 2, height = 150 + (50 % 40).
        assert_eq!(creator.data().age, 40);
        assert_eq!(creator.data().height, "160 см");
        assert!(outcome.message.contains("Внешность"));

        let outcome = creator
            .process_input("храбрый, честный\nвспыльчивый\nБывший стражник из Альтдорфа")
            .await;
        assert_eq!(creator.state(), CreationState::Review);
        assert!(outcome.message.contains("ПРОВЕРЬ ПЕРСОНАЖА"));
        assert_eq!(creator.data().strengths, vec!["храбрый", "честный"]);
        assert_eq!(creator.data().background, "Бывший стражник из Альтдорфа");

        // The ledger stays balanced at every boundary by construction.
        assert_eq!(creator.data().xp.total(), 120);
        assert_eq!(
            creator.data().xp.total(),
            creator.data().xp.from_race
                + creator.data().xp.from_stats
                + creator.data().xp.from_career
        );

        let outcome = creator.process_input("да").await;
        assert!(outcome.advanced);
        assert_eq!(creator.state(), CreationState::Save);
        assert!(creator.is_complete());
        assert!(outcome.message.contains("Сохраняю"));

        creator.save_to_file().await.unwrap();
        assert_eq!(creator.state(), CreationState::Complete);
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "Иван");
        assert!(saved[0].1.contains("ПЕРСОНАЖ ГОТОВ К ИГРЕ!"));

        // Audit steps were appended along the way.
        assert!(store.steps.lock().unwrap().contains(&"01_name".to_string()));
        assert!(store
            .steps
            .lock()
            .unwrap()
            .contains(&"10_review".to_string()));
    }

    #[tokio::test]
    async fn declining_the_review_cancels_without_saving() {
        let store = Arc::new(MemoryStore::default());
        let mut creator = creator_with_dice(vec![50]).with_store(store.clone());
        creator.process_input("Иван").await;
        creator.process_input("1").await;
        creator.process_input("3").await;
        creator.process_input("Охотник").await;
        creator.process_input("1").await;
        creator.process_input("далее").await;
        creator.process_input("далее").await;
        creator.process_input("далее").await;
        creator.process_input("далее").await;
        creator.process_input("смелый\nупрямый\nохотился в лесах").await;
        assert_eq!(creator.state(), CreationState::Review);

        let outcome = creator.process_input("передумал").await;
        assert!(!outcome.advanced);
        assert!(creator.is_cancelled());
        assert!(!creator.is_complete());
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn generated_names_are_sanitized() {
        assert_eq!(sanitize_generated_name("  **Альдрик**  "), "Альдрик");
        assert_eq!(sanitize_generated_name("«Карл»"), "Карл");
        assert_eq!(sanitize_generated_name("_Ганс_"), "Ганс");
    }
}
