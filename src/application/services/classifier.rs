//! Heuristic classification of free-text player input
//!
//! The classifier runs before any state-specific parsing, so a legitimate
//! state answer that happens to contain "?" (or another marker) is routed to
//! the question channel. That precedence - GenerateCommand, then Question,
//! then Answer - is inherited behavior and must not change.

use crate::domain::entities::CreationState;

/// What a piece of player input means for the creation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    /// A side-channel rules question; answered without touching state.
    Question,
    /// A name-generation command; only recognized in the Name state.
    GenerateCommand,
    /// A regular answer advancing the state machine.
    Answer,
}

/// Swappable classification strategy. The default is keyword matching; a
/// regex or model-based classifier can replace it without touching the
/// state-transition code.
pub trait InputClassifier: Send + Sync {
    fn classify(&self, input: &str, state: CreationState) -> InputClass;
}

/// Russian interrogative markers; any case-insensitive substring match makes
/// the input a question, regardless of state.
const QUESTION_MARKERS: [&str; 9] = [
    "?",
    "как",
    "что такое",
    "объясни",
    "расскажи",
    "подробней",
    "помоги",
    "сможешь",
    "можешь",
];

/// Exact aliases of the name-generation command.
const GENERATE_ALIASES: [&str; 4] = ["сгенери имя", "сгенери сам", "generate name", "generate"];

/// Default keyword-based classifier.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl InputClassifier for KeywordClassifier {
    fn classify(&self, input: &str, state: CreationState) -> InputClass {
        let normalized = input.trim().to_lowercase();

        if state == CreationState::Name
            && (normalized.contains("сгенери")
                || GENERATE_ALIASES.contains(&normalized.as_str()))
        {
            return InputClass::GenerateCommand;
        }

        if QUESTION_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            return InputClass::Question;
        }

        InputClass::Answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(input: &str, state: CreationState) -> InputClass {
        KeywordClassifier.classify(input, state)
    }

    #[test]
    fn question_markers_match_in_any_state() {
        for state in [
            CreationState::Name,
            CreationState::Race,
            CreationState::Stats,
            CreationState::Review,
        ] {
            assert_eq!(classify("что такое ББ?", state), InputClass::Question);
            assert_eq!(classify("объясни правила", state), InputClass::Question);
            assert_eq!(classify("ПОМОГИ", state), InputClass::Question);
        }
    }

    #[test]
    fn generate_command_only_in_name_state() {
        assert_eq!(
            classify("сгенери имя", CreationState::Name),
            InputClass::GenerateCommand
        );
        assert_eq!(
            classify("сгенери сам", CreationState::Name),
            InputClass::GenerateCommand
        );
        // Outside the Name state the same text is not a command; it falls
        // through to the question/answer rules.
        assert_eq!(
            classify("сгенери имя", CreationState::Race),
            InputClass::Answer
        );
    }

    #[test]
    fn generate_wins_over_question_in_name_state() {
        assert_eq!(
            classify("сгенери имя?", CreationState::Name),
            InputClass::GenerateCommand
        );
    }

    #[test]
    fn plain_answers_pass_through() {
        assert_eq!(classify("Иван", CreationState::Name), InputClass::Answer);
        assert_eq!(classify("3", CreationState::Race), InputClass::Answer);
        assert_eq!(classify("бросить", CreationState::Race), InputClass::Answer);
    }

    #[test]
    fn answer_containing_a_marker_misroutes_to_question() {
        // Inherited precedence: a state answer with "?" is treated as a
        // question and must not advance the machine.
        assert_eq!(classify("Иван?", CreationState::Name), InputClass::Question);
    }
}
