use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported game variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    Quiplash3,
    JokeBoat,
    BlatherRound,
    JobJob,
}

impl Game {
    pub const ALL: [Game; 4] = [
        Game::Quiplash3,
        Game::JokeBoat,
        Game::BlatherRound,
        Game::JobJob,
    ];
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown game '{0}' (expected quiplash3, jokeboat, blather or jobjob)")]
pub struct UnknownGame(pub String);

impl FromStr for Game {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "quiplash" | "quiplash3" => Ok(Game::Quiplash3),
            "jokeboat" => Ok(Game::JokeBoat),
            "blather" | "blatherround" => Ok(Game::BlatherRound),
            "jobjob" => Ok(Game::JobJob),
            _ => Err(UnknownGame(s.to_string())),
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Game::Quiplash3 => "Quiplash 3",
            Game::JokeBoat => "Joke Boat",
            Game::BlatherRound => "Blather Round",
            Game::JobJob => "Job Job",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_facing_spellings() {
        assert_eq!("quiplash3".parse::<Game>().unwrap(), Game::Quiplash3);
        assert_eq!("Quiplash 3".parse::<Game>().unwrap(), Game::Quiplash3);
        assert_eq!("joke-boat".parse::<Game>().unwrap(), Game::JokeBoat);
        assert_eq!("Blather Round".parse::<Game>().unwrap(), Game::BlatherRound);
        assert_eq!("blather".parse::<Game>().unwrap(), Game::BlatherRound);
        assert_eq!("JobJob".parse::<Game>().unwrap(), Game::JobJob);
    }

    #[test]
    fn rejects_unknown() {
        assert!("trivia murder party".parse::<Game>().is_err());
    }
}
