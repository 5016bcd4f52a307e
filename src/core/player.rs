use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FinderError, Result};
use super::suggestion::ActivitySuggestion;

/// Completed-activity summaries keep at most this many characters.
pub const SUMMARY_MAX_CHARS: usize = 100;

/// Name and avatar for one registry slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub avatar: String,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        PlayerProfile {
            name: name.into(),
            avatar: avatar.into(),
        }
    }
}

pub fn default_roster() -> Vec<PlayerProfile> {
    vec![
        PlayerProfile::new("Gabriel", "🦁"),
        PlayerProfile::new("Eliot", "🐼"),
        PlayerProfile::new("Levi", "🦄"),
        PlayerProfile::new("Olivia", "🐉"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedActivity {
    pub summary: String,
    pub points: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub avatar: String,
    pub points: u32,
    pub activities_completed: Vec<CompletedActivity>,
}

impl Player {
    pub fn new(profile: PlayerProfile) -> Self {
        Player {
            name: profile.name,
            avatar: profile.avatar,
            points: 0,
            activities_completed: Vec::new(),
        }
    }
}

/// Fixed set of players for one session, in roster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        PlayerRegistry::new(default_roster())
    }
}

impl PlayerRegistry {
    /// Builds a registry with every player at zero points. Blank and
    /// repeated names are skipped; an empty roster falls back to the default.
    pub fn new(roster: Vec<PlayerProfile>) -> Self {
        let mut players: Vec<Player> = Vec::with_capacity(roster.len());
        for profile in roster {
            let name = profile.name.trim();
            if name.is_empty() || players.iter().any(|p| p.name == name) {
                tracing::warn!(name = %profile.name, "skipping invalid roster entry");
                continue;
            }
            players.push(Player::new(PlayerProfile::new(name, profile.avatar)));
        }

        if players.is_empty() {
            return PlayerRegistry::default();
        }
        PlayerRegistry { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Credits `activity.points` to the player and records a short summary.
    pub fn complete(&mut self, name: &str, activity: &ActivitySuggestion) -> Result<&Player> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| FinderError::UnknownPlayer(name.to_string()))?;

        player.points = player.points.saturating_add(activity.points);
        player.activities_completed.push(CompletedActivity {
            summary: summarize(&activity.suggestion),
            points: activity.points,
            completed_at: Utc::now(),
        });

        tracing::info!(
            player = %player.name,
            awarded = activity.points,
            total = player.points,
            "activity completed"
        );
        Ok(player)
    }

    /// Players by points, highest first; ties keep roster order.
    pub fn rank(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.points.cmp(&a.points));
        ranked
    }

    pub fn scoreboard(&self) -> Vec<ScoreboardEntry<'_>> {
        self.rank()
            .into_iter()
            .enumerate()
            .map(|(position, player)| ScoreboardEntry {
                position,
                medal: Medal::for_position(position),
                player,
            })
            .collect()
    }
}

fn summarize(text: &str) -> String {
    text.trim().chars().take(SUMMARY_MAX_CHARS).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    Star,
}

impl Medal {
    pub fn for_position(position: usize) -> Self {
        match position {
            0 => Medal::Gold,
            1 => Medal::Silver,
            2 => Medal::Bronze,
            _ => Medal::Star,
        }
    }

    pub fn emoji(&self) -> &str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
            Medal::Star => "⭐",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreboardEntry<'a> {
    pub position: usize,
    pub medal: Medal,
    pub player: &'a Player,
}
