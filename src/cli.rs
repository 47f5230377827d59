use clap::Parser;

use jitb_core_types::Game;

/// Autonomous jackbox.tv player bot driven by a chat model.
#[derive(Parser, Debug)]
#[command(name = "jitb", version, about)]
pub struct Cli {
    /// Room code shown on the game screen.
    #[arg(long)]
    pub room: String,

    /// Screen name to join with.
    #[arg(long)]
    pub user: String,

    /// Play this game instead of auto-detecting from the first screen.
    #[arg(long)]
    pub game: Option<Game>,

    /// Also write a debug log file into the system temp directory.
    #[arg(long)]
    pub debug: bool,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    pub headful: bool,

    /// Chat model name override.
    #[arg(long)]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_flags() {
        let cli = Cli::parse_from(["jitb", "--room", "ABCD", "--user", "BOTTY"]);
        assert_eq!(cli.room, "ABCD");
        assert_eq!(cli.user, "BOTTY");
        assert!(cli.game.is_none());
        assert!(!cli.debug);

        let cli = Cli::parse_from([
            "jitb", "--room", "ABCD", "--user", "BOTTY", "--game", "quiplash3", "--debug",
        ]);
        assert_eq!(cli.game, Some(Game::Quiplash3));
        assert!(cli.debug);
    }

    #[test]
    fn rejects_unknown_game() {
        let parsed = Cli::try_parse_from([
            "jitb", "--room", "ABCD", "--user", "BOTTY", "--game", "chess",
        ]);
        assert!(parsed.is_err());
    }
}
