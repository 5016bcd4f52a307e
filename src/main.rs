use anyhow::Result;
use clap::Parser;

use funfinder::cli::{self, Args, Commands, SuggestOptions};
use funfinder::config::Config;
use funfinder::{logging, shell};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = Config::new(args.data_dir)?;

    match args.command.unwrap_or(Commands::Play { provider: None, model: None }) {
        Commands::Play { provider, model } => {
            shell::handle_play(config, provider, model).await?;
        }
        Commands::Suggest { player, location, duration, interests, age, mood, provider, model } => {
            let options = SuggestOptions {
                player,
                location,
                duration,
                interests,
                age,
                mood,
                provider,
                model,
            };
            cli::handle_suggest(config, options).await?;
        }
        Commands::Config => {
            cli::handle_config(&config)?;
        }
    }

    Ok(())
}
