use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "funfinder")]
#[command(about = "Family Fun Finder: find something fun to do and earn points")]
pub struct Args {
    /// Directory holding config.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive game (default)
    Play {
        /// Text generator backend (gemini, openai, ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model name for the backend
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask for one suggestion and print it
    Suggest {
        /// Player name from the roster
        #[arg(long)]
        player: String,
        /// Indoor, Outdoor or Either
        #[arg(long, default_value = "either")]
        location: String,
        /// Quick, Medium, Long, Epic or Any
        #[arg(long, default_value = "any")]
        duration: String,
        /// Interest tag, repeatable
        #[arg(long = "interest")]
        interests: Vec<String>,
        /// Age between 3 and 13
        #[arg(long)]
        age: Option<u8>,
        /// How you're feeling or what you want to do
        #[arg(long, default_value = "")]
        mood: String,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Show the resolved configuration
    Config,
}
