use std::io::{self, BufRead, Write};
use std::str::FromStr;
use anyhow::Result;
use colored::*;

use crate::config::Config;
use crate::core::{
    Action, ActivityCatalog, Age, DurationBucket, FinderError, Interest, Location, NavEvent,
    PlayerRegistry, Preferences, Screen, Session, SuggestionRequester,
};

pub async fn handle_play(config: Config, provider: Option<String>, model: Option<String>) -> Result<()> {
    let requester = config.suggestion_requester(provider.as_deref(), model.as_deref());
    let session = Session::new(PlayerRegistry::new(config.players.clone()));

    let stdin = io::stdin();
    let mut shell = ShellMode::new(requester, stdin.lock(), io::stdout());
    let session = shell.run(session).await?;

    tracing::info!(session = %session.id(), "session ended");
    Ok(())
}

/// One parsed line of input for the active screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    Search,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(session: &Session, input: &str) -> Command {
    let input = input.trim();
    let word = input.to_lowercase();

    match word.as_str() {
        "help" | "?" | "/help" => return Command::Help,
        "quit" | "exit" | "q" | "/quit" | "/exit" => return Command::Quit,
        _ => {}
    }

    let command = match (session.screen(), word.as_str()) {
        (Screen::Welcome, _) => select_player(session, input).map(Action::SelectPlayer).map(Command::Act),

        (Screen::MainMenu, "1" | "find") => Some(Command::Act(Action::FindActivity)),
        (Screen::MainMenu, "2" | "scoreboard" | "scores") => Some(Command::Act(Action::ViewScoreboard)),
        (Screen::MainMenu, "3" | "home") => Some(Command::Act(Action::ReturnHome)),

        (Screen::ActivitySearch, "1" | "find" | "search") => Some(Command::Search),
        (Screen::ActivitySearch, "2" | "back" | "b") => Some(Command::Act(Action::GoBack)),

        (Screen::ActivityReveal, "1" | "done" | "complete") => Some(Command::Act(Action::MarkComplete)),
        (Screen::ActivityReveal, "2" | "another" | "again") => Some(Command::Act(Action::SearchAgain)),
        (Screen::ActivityReveal, "3" | "back" | "menu" | "b") => Some(Command::Act(Action::GoBack)),

        (Screen::Scoreboard, "1" | "back" | "b") => Some(Command::Act(Action::GoBack)),

        _ => None,
    };

    command.unwrap_or_else(|| Command::Unknown(input.to_string()))
}

/// Resolves a 1-based roster index or a case-insensitive name.
fn select_player(session: &Session, input: &str) -> Option<String> {
    let players = session.registry().players();
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| players.get(i))
            .map(|p| p.name.clone());
    }
    players
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(input))
        .map(|p| p.name.clone())
}

/// Accepts either a 1-based menu index into `options` or the option's name.
pub fn parse_choice<T>(input: &str, options: &[T]) -> std::result::Result<T, FinderError>
where
    T: FromStr<Err = FinderError> + Copy,
{
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(index) => index
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .copied()
            .ok_or_else(|| FinderError::InvalidPreference(format!("pick a number from 1 to {}", options.len()))),
        Err(_) => input.parse(),
    }
}

pub fn parse_interests(input: &str) -> std::result::Result<Vec<Interest>, FinderError> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| parse_choice(part, &Interest::ALL))
        .collect()
}

pub struct ShellMode<R, W> {
    requester: SuggestionRequester,
    catalog: ActivityCatalog,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ShellMode<R, W> {
    pub fn new(requester: SuggestionRequester, input: R, output: W) -> Self {
        ShellMode {
            requester,
            catalog: ActivityCatalog::builtin(),
            input,
            output,
        }
    }

    /// Drives the session until `quit` or end of input and hands it back.
    pub async fn run(&mut self, mut session: Session) -> Result<Session> {
        writeln!(self.output, "{}", "🎨 Family Fun Finder 🎉".magenta().bold())?;
        writeln!(self.output, "{}", "Type 'help' for commands, 'quit' to leave".dimmed())?;

        loop {
            self.render(&session)?;

            let Some(line) = self.read_line("> ")? else {
                writeln!(self.output, "\n{}", "Bye! Have fun!".cyan())?;
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&session, &line) {
                Command::Quit => {
                    writeln!(self.output, "{}", "Bye! Have fun!".cyan())?;
                    break;
                }
                Command::Help => self.show_help(session.screen())?,
                Command::Unknown(text) => {
                    writeln!(self.output, "{}: {}", "Unknown choice".red().bold(), text)?;
                }
                Command::Act(action) => {
                    let (next, event) = session.apply(action);
                    session = next;
                    self.report(&event)?;
                }
                Command::Search => {
                    let (next, input_ended) = self.search(session).await?;
                    session = next;
                    if input_ended {
                        break;
                    }
                }
            }
        }

        Ok(session)
    }

    fn render(&mut self, session: &Session) -> Result<()> {
        writeln!(self.output)?;
        match session.screen() {
            Screen::Welcome => {
                writeln!(self.output, "{}", "Welcome! Who's ready for some fun?".cyan().bold())?;
                for (i, player) in session.registry().players().iter().enumerate() {
                    writeln!(
                        self.output,
                        "  {}. {} {}  {}",
                        i + 1,
                        player.avatar,
                        player.name.bold(),
                        format!("Points: {}", player.points).dimmed()
                    )?;
                }
            }
            Screen::MainMenu => {
                if let Some(player) = session.current_player() {
                    writeln!(self.output, "{}", format!("Hey {}! 👋", player.name).cyan().bold())?;
                    writeln!(self.output, "{}", format!("Your Points: {}", player.points).yellow())?;
                }
                writeln!(self.output, "  1. 🎲 Find Something Fun!")?;
                writeln!(self.output, "  2. 📊 View Scoreboard")?;
                writeln!(self.output, "  3. 🏠 Back to Home")?;
            }
            Screen::ActivitySearch => {
                let name = session.current_player_name().unwrap_or("friend");
                writeln!(
                    self.output,
                    "{}",
                    format!("What kind of activity are you looking for, {}?", name).cyan().bold()
                )?;
                if let Some(notice) = self.requester.configuration_notice() {
                    writeln!(self.output, "{} {}", "⚠️  Suggestions are unavailable:".yellow().bold(), notice)?;
                } else {
                    writeln!(self.output, "  1. Find Activity!")?;
                }
                writeln!(self.output, "  2. Back")?;
            }
            Screen::ActivityReveal => {
                let name = session.current_player_name().unwrap_or("you");
                writeln!(self.output, "{}", format!("Perfect Activity for {}! 🎉", name).cyan().bold())?;
                if let Some(activity) = session.current_activity() {
                    writeln!(self.output)?;
                    for line in activity.suggestion.lines() {
                        writeln!(self.output, "  {}", line)?;
                    }
                    writeln!(self.output)?;
                    writeln!(
                        self.output,
                        "{}",
                        format!("You can earn {} points by completing this activity!", activity.points).bold()
                    )?;
                }
                writeln!(self.output, "  1. ✅ I completed it!")?;
                writeln!(self.output, "  2. 🔄 Show me something else")?;
                writeln!(self.output, "  3. 🏠 Back to Menu")?;
            }
            Screen::Scoreboard => {
                writeln!(self.output, "{}", "🏆 Scoreboard 🏆".yellow().bold())?;
                for entry in session.registry().scoreboard() {
                    writeln!(
                        self.output,
                        "  {} {:<10} {:>5} pts   {}",
                        entry.medal.emoji(),
                        entry.player.name,
                        entry.player.points,
                        format!("Activities completed: {}", entry.player.activities_completed.len()).dimmed()
                    )?;
                }
                writeln!(self.output, "  1. Back")?;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn report(&mut self, event: &NavEvent) -> Result<()> {
        match event {
            NavEvent::Completed { points, total, .. } => {
                writeln!(
                    self.output,
                    "{}",
                    format!("Awesome! You earned {} points! 🎊 (total: {})", points, total).green().bold()
                )?;
            }
            NavEvent::Ignored => {
                writeln!(self.output, "{}", "That doesn't do anything here.".dimmed())?;
            }
            NavEvent::Moved { .. } => {}
        }
        Ok(())
    }

    /// Collects preferences and asks for a suggestion. The flag is set when
    /// input ended midway through the questions.
    async fn search(&mut self, session: Session) -> Result<(Session, bool)> {
        if let Some(notice) = self.requester.configuration_notice() {
            let message = FinderError::NotConfigured(notice.to_string());
            writeln!(self.output, "{}", message.to_string().yellow())?;
            return Ok((session, false));
        }

        let Some(prefs) = self.collect_preferences()? else {
            return Ok((session, true));
        };

        writeln!(self.output, "{}", "Finding the perfect activity...".dimmed())?;
        self.output.flush()?;

        let (session, result) = session.submit_search(&self.requester, &prefs).await;
        if let Err(e) = result {
            writeln!(self.output, "{}", e.to_string().red())?;
            if matches!(e, FinderError::Request(_)) {
                self.show_catalog_hints(&prefs)?;
            }
        }
        Ok((session, false))
    }

    fn show_catalog_hints(&mut self, prefs: &Preferences) -> Result<()> {
        let normalized = prefs.normalize();
        let hints = self.catalog.matching(&normalized);
        if hints.is_empty() {
            return Ok(());
        }
        writeln!(self.output, "{}", "While you wait, maybe try one of these:".cyan())?;
        for activity in hints {
            writeln!(self.output, "  • {} - {}", activity.name.bold(), activity.description)?;
        }
        Ok(())
    }

    fn collect_preferences(&mut self) -> Result<Option<Preferences>> {
        let location_menu = numbered(Location::ALL.iter().map(|l| l.to_string()));
        let Some(location) = self.ask_until(
            &format!("Where do you want to play? {} [Either]: ", location_menu),
            |answer| {
                if answer.is_empty() {
                    Ok(Location::Either)
                } else {
                    parse_choice(answer, &Location::ALL)
                }
            },
        )?
        else {
            return Ok(None);
        };

        let duration_menu = numbered(DurationBucket::ALL.iter().map(|d| d.label().to_string()));
        let Some(duration) = self.ask_until(
            &format!("How much time do you have? {} [Any]: ", duration_menu),
            |answer| {
                if answer.is_empty() {
                    Ok(DurationBucket::Any)
                } else {
                    parse_choice(answer, &DurationBucket::ALL)
                }
            },
        )?
        else {
            return Ok(None);
        };

        let interest_menu = numbered(Interest::ALL.iter().map(|i| i.to_string()));
        let Some(interests) = self.ask_until(
            &format!("What are you interested in? {} (comma separated, optional): ", interest_menu),
            parse_interests,
        )?
        else {
            return Ok(None);
        };

        let Some(age) = self.ask_until("Age (3-13, optional): ", |answer| {
            if answer.is_empty() {
                Ok(None)
            } else {
                answer.parse::<Age>().map(Some)
            }
        })?
        else {
            return Ok(None);
        };

        let Some(statement) = self.read_line("Tell me how you're feeling or what you want to do: ")? else {
            return Ok(None);
        };

        let mut prefs = Preferences::new(location, duration)
            .with_interests(interests)
            .with_statement(statement.trim());
        prefs.age = age;
        Ok(Some(prefs))
    }

    /// Re-asks until `parse` accepts the answer. `None` on end of input.
    fn ask_until<T, F>(&mut self, question: &str, parse: F) -> Result<Option<T>>
    where
        F: Fn(&str) -> std::result::Result<T, FinderError>,
    {
        loop {
            let Some(answer) = self.read_line(question)? else {
                return Ok(None);
            };
            match parse(answer.trim()) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "{}", e.to_string().red())?,
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt.green().bold())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn show_help(&mut self, screen: Screen) -> Result<()> {
        writeln!(self.output, "\n{}", "Family Fun Finder Commands".cyan().bold())?;
        writeln!(self.output, "  {} - Show this help", "help".green())?;
        writeln!(self.output, "  {} - Leave the game", "quit".green())?;

        let hint = match screen {
            Screen::Welcome => "Type a player's number or name to start",
            Screen::MainMenu => "1 / find, 2 / scoreboard, 3 / home",
            Screen::ActivitySearch => "1 / find to search, 2 / back",
            Screen::ActivityReveal => "1 / done, 2 / another, 3 / back",
            Screen::Scoreboard => "1 / back",
        };
        writeln!(self.output, "  {}", hint.yellow())?;
        Ok(())
    }
}

fn numbered(labels: impl Iterator<Item = String>) -> String {
    labels
        .enumerate()
        .map(|(i, label)| format!("{}={}", i + 1, label))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::suggestion::tests::StubGenerator;
    use std::io::Cursor;

    fn on_screen(actions: Vec<Action>) -> Session {
        actions.into_iter().fold(Session::default(), |s, a| s.apply(a).0)
    }

    async fn play(requester: SuggestionRequester, script: &str) -> (Session, String) {
        colored::control::set_override(false);
        let mut output = Vec::new();
        let session = {
            let mut shell = ShellMode::new(requester, Cursor::new(script.to_string()), &mut output);
            shell.run(Session::default()).await.unwrap()
        };
        (session, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_command_per_screen() {
        let welcome = Session::default();
        assert_eq!(
            parse_command(&welcome, "2"),
            Command::Act(Action::SelectPlayer("Eliot".to_string()))
        );
        assert_eq!(
            parse_command(&welcome, "olivia"),
            Command::Act(Action::SelectPlayer("Olivia".to_string()))
        );
        assert!(matches!(parse_command(&welcome, "9"), Command::Unknown(_)));
        assert_eq!(parse_command(&welcome, "QUIT"), Command::Quit);

        let menu = on_screen(vec![Action::SelectPlayer("Levi".to_string())]);
        assert_eq!(parse_command(&menu, "1"), Command::Act(Action::FindActivity));
        assert_eq!(parse_command(&menu, "scores"), Command::Act(Action::ViewScoreboard));
        assert_eq!(parse_command(&menu, "home"), Command::Act(Action::ReturnHome));

        let search = on_screen(vec![Action::SelectPlayer("Levi".to_string()), Action::FindActivity]);
        assert_eq!(parse_command(&search, "find"), Command::Search);
        assert_eq!(parse_command(&search, "b"), Command::Act(Action::GoBack));
        assert_eq!(parse_command(&search, "?"), Command::Help);
    }

    #[test]
    fn test_parse_choice_and_interests() {
        assert_eq!(parse_choice("2", &Location::ALL).unwrap(), Location::Outdoor);
        assert_eq!(parse_choice("indoor", &Location::ALL).unwrap(), Location::Indoor);
        assert!(parse_choice("0", &Location::ALL).is_err());
        assert!(parse_choice("4", &Location::ALL).is_err());

        assert_eq!(
            parse_interests("art, 8 nature").unwrap(),
            vec![Interest::Art, Interest::Music, Interest::Nature]
        );
        assert!(parse_interests("").unwrap().is_empty());
        assert!(parse_interests("art, knitting").is_err());
    }

    #[tokio::test]
    async fn test_full_round_awards_points() {
        let script = "\
2
1
1
1
1
art
8
I want to paint

1
1
3
2
1
quit
";
        let requester = SuggestionRequester::new(StubGenerator::replying("Rainbow Rock Painting!"));
        let (session, output) = play(requester, script).await;

        assert_eq!(session.screen(), Screen::MainMenu);
        assert_eq!(session.registry().get("Eliot").unwrap().points, 50);
        assert!(output.contains("Perfect Activity for Eliot!"));
        assert!(output.contains("Rainbow Rock Painting!"));
        assert!(output.contains("You earned 25 points! 🎊 (total: 25)"));
        assert!(output.contains("You earned 25 points! 🎊 (total: 50)"));
        assert!(output.contains("🏆 Scoreboard 🏆"));
        assert!(output.contains("🥇 Eliot"));
    }

    #[tokio::test]
    async fn test_request_error_stays_on_search_with_hints() {
        let script = "1\n1\n1\n2\n3\n\n\n\n";
        let requester = SuggestionRequester::new(StubGenerator::failing("quota exceeded"));
        let (session, output) = play(requester, script).await;

        assert_eq!(session.screen(), Screen::ActivitySearch);
        assert!(session.current_activity().is_none());
        assert!(output.contains("Oops! Something went wrong: quota exceeded"));
        assert!(output.contains("Capture the Flag"));
        assert!(!output.contains("LEGO Tower Challenge"));
    }

    #[tokio::test]
    async fn test_not_configured_disables_search() {
        let requester = SuggestionRequester::not_configured("GEMINI_API_KEY is not set");
        let (session, output) = play(requester, "4\n1\nfind\n").await;

        assert_eq!(session.screen(), Screen::ActivitySearch);
        assert!(output.contains("Suggestions are unavailable: GEMINI_API_KEY is not set"));
        assert!(output.contains("Suggestions are not configured"));
        assert!(!output.contains("Where do you want to play?"));
    }

    #[tokio::test]
    async fn test_invalid_answers_are_asked_again() {
        let script = "3\n1\n1\nsomewhere\n1\nforever\n\n\n20\n\n\n";
        let requester = SuggestionRequester::new(StubGenerator::replying("Blanket fort"));
        let (session, output) = play(requester, script).await;

        assert!(output.contains("unknown location 'somewhere'"));
        assert!(output.contains("unknown duration 'forever'"));
        assert!(output.contains("age must be between 3 and 13"));
        assert_eq!(session.screen(), Screen::ActivityReveal);
        assert_eq!(session.current_activity().unwrap().suggestion, "Blanket fort");
    }
}
