use anyhow::{anyhow, Result};
use colored::*;

use crate::ai_provider::AIProvider;
use crate::config::{mask_key, Config};
use crate::core::{Age, DurationBucket, Interest, Location, PlayerRegistry, Preferences};

pub use commands::{Args, Commands};

mod commands;

pub struct SuggestOptions {
    pub player: String,
    pub location: String,
    pub duration: String,
    pub interests: Vec<String>,
    pub age: Option<u8>,
    pub mood: String,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl SuggestOptions {
    pub fn preferences(&self) -> Result<Preferences> {
        let location: Location = self.location.parse()?;
        let duration: DurationBucket = self.duration.parse()?;
        let interests = self
            .interests
            .iter()
            .map(|i| i.parse::<Interest>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut prefs = Preferences::new(location, duration)
            .with_interests(interests)
            .with_statement(self.mood.clone());
        if let Some(years) = self.age {
            prefs = prefs.with_age(Age::new(years)?);
        }
        Ok(prefs)
    }
}

pub async fn handle_suggest(config: Config, options: SuggestOptions) -> Result<()> {
    let registry = PlayerRegistry::new(config.players.clone());
    let player = registry
        .get(&options.player)
        .or_else(|| {
            registry
                .players()
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(&options.player))
        })
        .ok_or_else(|| anyhow!("Unknown player: {}", options.player))?;

    let prefs = options.preferences()?;
    let requester = config.suggestion_requester(options.provider.as_deref(), options.model.as_deref());

    println!("{}", "Finding the perfect activity...".dimmed());
    let suggestion = requester.request(&player.name, &prefs).await?;

    println!("\n{}", format!("Perfect Activity for {}! 🎉", player.name).cyan().bold());
    println!("{}", suggestion.suggestion);
    println!(
        "\n{}",
        format!("You can earn {} points by completing this activity!", suggestion.points).bold()
    );
    Ok(())
}

pub fn handle_config(config: &Config) -> Result<()> {
    println!("{}", "Family Fun Finder configuration".cyan().bold());
    println!("Config file: {}", config.config_file().display());
    println!("Default provider: {}", config.default_provider);
    println!("Request timeout: {}s", config.timeout_secs);

    println!("\n{}", "Providers:".yellow().bold());
    let mut names: Vec<_> = config.providers.keys().collect();
    names.sort();
    for name in names {
        let provider = &config.providers[name];
        let key = provider
            .api_key
            .as_deref()
            .map(mask_key)
            .unwrap_or_else(|| "-".to_string());
        let status = match config.get_ai_config(Some(name.as_str()), None) {
            Ok(_) => "ready".green(),
            Err(e) if e.is_not_configured() => "missing credential".yellow(),
            Err(_) => "invalid".red(),
        };
        let env_hint = name
            .parse::<AIProvider>()
            .ok()
            .and_then(|p| p.api_key_env())
            .unwrap_or("-");
        println!(
            "  {:<8} model={:<18} host={:<28} key={} ({}) [{}]",
            name,
            provider.default_model,
            provider.host.as_deref().unwrap_or("-"),
            key,
            env_hint,
            status
        );
    }

    println!("\n{}", "Players:".yellow().bold());
    for player in PlayerRegistry::new(config.players.clone()).players() {
        println!("  {} {}", player.avatar, player.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A freshly written config with every credential cleared.
    fn keyless_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();
        for provider in config.providers.values_mut() {
            provider.api_key = None;
        }
        config.default_provider = "gemini".to_string();
        config
    }

    fn options() -> SuggestOptions {
        SuggestOptions {
            player: "Eliot".to_string(),
            location: "outdoor".to_string(),
            duration: "quick".to_string(),
            interests: vec!["nature".to_string()],
            age: Some(6),
            mood: "sunny day!".to_string(),
            provider: None,
            model: None,
        }
    }

    #[test]
    fn test_options_to_preferences() {
        let prefs = options().preferences().unwrap();
        assert_eq!(prefs.location, Location::Outdoor);
        assert_eq!(prefs.duration, DurationBucket::Quick);
        assert_eq!(prefs.interests, vec![Interest::Nature]);
        assert_eq!(prefs.age.map(|a| a.years()), Some(6));
        assert_eq!(prefs.statement, "sunny day!");
    }

    #[test]
    fn test_bad_options_rejected() {
        let mut bad_age = options();
        bad_age.age = Some(30);
        assert!(bad_age.preferences().is_err());

        let mut bad_interest = options();
        bad_interest.interests.push("knitting".to_string());
        assert!(bad_interest.preferences().is_err());
    }

    #[tokio::test]
    async fn test_suggest_unknown_player_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = options();
        opts.player = "Mallory".to_string();

        let err = handle_suggest(keyless_config(&temp_dir), opts).await.unwrap_err();
        assert!(err.to_string().contains("Unknown player: Mallory"));
    }

    #[tokio::test]
    async fn test_suggest_without_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = options();
        opts.player = "eliot".to_string();

        let err = handle_suggest(keyless_config(&temp_dir), opts).await.unwrap_err();
        let finder = err.downcast_ref::<crate::core::FinderError>().unwrap();
        assert!(finder.is_not_configured());
    }
}
