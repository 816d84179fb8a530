use crate::chess::Color;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

#[cfg(test)]
use proptest::prelude::*;

/// The strength of the computer opponent.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(#[cfg_attr(test, strategy(Level::MIN..=Level::MAX))] u8);

impl Level {
    /// The weakest [`Level`].
    pub const MIN: u8 = 1;

    /// The strongest [`Level`].
    pub const MAX: u8 = 8;

    /// Constructs a [`Level`] if within range.
    pub fn new(level: u8) -> Result<Self, LevelOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Level(level))
        } else {
            Err(LevelOutOfRange(level))
        }
    }

    /// This level as a number.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level(3)
    }
}

/// The reason why a number is not a valid [`Level`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "level {} is out of the range 1..=8", _0)]
pub struct LevelOutOfRange(#[error(not(source))] pub u8);

impl TryFrom<u8> for Level {
    type Error = LevelOutOfRange;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Level::new(level)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

/// The time control of a game.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields)]
pub struct Clock {
    /// The initial time on each player's clock.
    #[cfg_attr(test, strategy((60u64..10800).prop_map(Duration::from_secs)))]
    #[serde(with = "humantime_serde")]
    pub limit: Duration,

    /// The time added to a player's clock after each move.
    #[cfg_attr(test, strategy((0u64..180).prop_map(Duration::from_secs)))]
    #[serde(with = "humantime_serde")]
    pub increment: Duration,
}

impl Default for Clock {
    fn default() -> Self {
        Clock {
            limit: Duration::from_secs(600),
            increment: Duration::ZERO,
        }
    }
}

/// Configuration for a game of Atomic chess against the computer.
#[derive(Debug, Default, Display, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields)]
pub struct Challenge {
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub clock: Clock,
    #[serde(default)]
    pub color: Color,
}

impl Challenge {
    /// The form fields sent when creating the challenge.
    pub fn form(&self) -> [(&'static str, String); 5] {
        [
            ("level", self.level.to_string()),
            ("clock.limit", self.clock.limit.as_secs().to_string()),
            ("clock.increment", self.clock.increment.as_secs().to_string()),
            ("variant", "atomic".into()),
            ("color", self.color.to_string()),
        ]
    }
}

/// The reason why parsing [`Challenge`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse challenge configuration")]
pub struct ParseChallengeError(ron::de::SpannedError);

impl FromStr for Challenge {
    type Err = ParseChallengeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}
