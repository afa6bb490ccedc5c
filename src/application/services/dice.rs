//! Injectable dice rolling
//!
//! Every random table in the creation workflow rolls through this trait so
//! tests can pin the dice.

use rand::Rng;

/// Source of dice rolls and uniform picks.
pub trait DiceRoller: Send {
    /// Roll one die, returning a value in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;

    /// Uniform value in `0..upper`.
    fn range(&mut self, upper: u32) -> u32;

    fn d100(&mut self) -> u32 {
        self.roll(100)
    }

    fn d20(&mut self) -> u32 {
        self.roll(20)
    }

    fn d10(&mut self) -> u32 {
        self.roll(10)
    }
}

/// Production roller backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct ThreadRngDice;

impl DiceRoller for ThreadRngDice {
    fn roll(&mut self, sides: u32) -> u32 {
        rand::thread_rng().gen_range(1..=sides)
    }

    fn range(&mut self, upper: u32) -> u32 {
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Deterministic roller that replays a fixed sequence. Panics when the
/// sequence runs dry, which in a test is the failure you want.
#[derive(Debug)]
pub struct SequenceDice {
    values: Vec<u32>,
    next: usize,
}

impl SequenceDice {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, next: 0 }
    }

    fn take(&mut self) -> u32 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

impl DiceRoller for SequenceDice {
    fn roll(&mut self, sides: u32) -> u32 {
        self.take().min(sides)
    }

    fn range(&mut self, upper: u32) -> u32 {
        self.take() % upper
    }
}
