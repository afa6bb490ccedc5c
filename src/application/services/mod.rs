//! Application services

mod classifier;
mod creator;
mod dice;
mod prompt_builder;
mod registry;
mod rule_checker;
mod session;
mod update_parser;

pub use classifier::{InputClass, InputClassifier, KeywordClassifier};
pub use creator::{CharacterCreator, StepOutcome};
pub use dice::{DiceRoller, SequenceDice, ThreadRngDice};
pub use prompt_builder::PromptBuilder;
pub use registry::{CreatorRegistry, CreatorReply, RegistryError, SessionRegistry};
pub use rule_checker::RuleChecker;
pub use session::{GameSession, SessionConfig, SessionError, SessionState};
pub use update_parser::parse_character_update;
