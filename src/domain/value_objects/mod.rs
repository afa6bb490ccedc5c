//! Value objects shared across the domain

mod career;
mod characteristics;
mod game_io;
mod ids;
mod race;

pub use career::{
    career_catalog, find_career, CareerClass, RolledCareer, FIRST_ROLL_CAREER_XP,
    THREE_ROLLS_CAREER_XP,
};
pub use characteristics::{Characteristic, Characteristics};
pub use game_io::{GameInput, GameOutput, InputSource};
pub use ids::{CharacterId, ChatId, PlayerId};
pub use race::{Race, RANDOM_RACE_BONUS_XP};
