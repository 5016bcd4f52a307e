use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::FinderError;

pub const DEFAULT_STATEMENT: &str = "I'm bored! Give me something fun!";
pub const ANY_INTEREST: &str = "anything fun";
pub const MIN_AGE: u8 = 3;
pub const MAX_AGE: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Location {
    Indoor,
    Outdoor,
    #[default]
    Either,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Indoor, Location::Outdoor, Location::Either];
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Indoor => write!(f, "Indoor"),
            Location::Outdoor => write!(f, "Outdoor"),
            Location::Either => write!(f, "Either"),
        }
    }
}

impl std::str::FromStr for Location {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indoor" | "inside" => Ok(Location::Indoor),
            "outdoor" | "outside" => Ok(Location::Outdoor),
            "either" | "any" | "" => Ok(Location::Either),
            _ => Err(FinderError::InvalidPreference(format!("unknown location '{}'", s))),
        }
    }
}

/// Time buckets, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DurationBucket {
    Quick,
    Medium,
    Long,
    Epic,
    #[default]
    Any,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 5] = [
        DurationBucket::Quick,
        DurationBucket::Medium,
        DurationBucket::Long,
        DurationBucket::Epic,
        DurationBucket::Any,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DurationBucket::Quick => "Quick (5-15 min)",
            DurationBucket::Medium => "Medium (15-30 min)",
            DurationBucket::Long => "Long (30-60 min)",
            DurationBucket::Epic => "Epic (1+ hours)",
            DurationBucket::Any => "Any",
        }
    }
}

impl fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DurationBucket {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        // Accept the bare word or the full label, e.g. "Quick (5-15 min)".
        let word = lowered.split_whitespace().next().unwrap_or("");
        match word {
            "quick" => Ok(DurationBucket::Quick),
            "medium" => Ok(DurationBucket::Medium),
            "long" => Ok(DurationBucket::Long),
            "epic" => Ok(DurationBucket::Epic),
            "any" | "" => Ok(DurationBucket::Any),
            _ => Err(FinderError::InvalidPreference(format!("unknown duration '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Building,
    Creative,
    Games,
    Art,
    Sports,
    Nature,
    Cooking,
    Music,
}

impl Interest {
    pub const ALL: [Interest; 8] = [
        Interest::Building,
        Interest::Creative,
        Interest::Games,
        Interest::Art,
        Interest::Sports,
        Interest::Nature,
        Interest::Cooking,
        Interest::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Building => "building",
            Interest::Creative => "creative",
            Interest::Games => "games",
            Interest::Art => "art",
            Interest::Sports => "sports",
            Interest::Nature => "nature",
            Interest::Cooking => "cooking",
            Interest::Music => "music",
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interest {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Interest::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| FinderError::InvalidPreference(format!("unknown interest '{}'", s)))
    }
}

/// Child's age, kept inside the range the picker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Age(u8);

impl Age {
    pub fn new(years: u8) -> Result<Self, FinderError> {
        if (MIN_AGE..=MAX_AGE).contains(&years) {
            Ok(Age(years))
        } else {
            Err(FinderError::InvalidPreference(format!(
                "age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, years
            )))
        }
    }

    pub fn years(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Age {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let years: u8 = s
            .trim()
            .parse()
            .map_err(|_| FinderError::InvalidPreference(format!("age '{}' is not a number", s)))?;
        Age::new(years)
    }
}

/// Raw filters as the user entered them for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub location: Location,
    pub duration: DurationBucket,
    pub interests: Vec<Interest>,
    pub statement: String,
    pub age: Option<Age>,
}

impl Preferences {
    pub fn new(location: Location, duration: DurationBucket) -> Self {
        Preferences {
            location,
            duration,
            ..Default::default()
        }
    }

    pub fn with_interests(mut self, interests: impl IntoIterator<Item = Interest>) -> Self {
        for interest in interests {
            if !self.interests.contains(&interest) {
                self.interests.push(interest);
            }
        }
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn with_age(mut self, age: Age) -> Self {
        self.age = Some(age);
        self
    }

    pub fn normalize(&self) -> NormalizedPreferences {
        normalize(self)
    }
}

/// Preferences with every default substituted, ready for prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPreferences {
    pub location: Location,
    pub duration: DurationBucket,
    pub interests: Vec<Interest>,
    pub interests_phrase: String,
    pub statement: String,
    pub age: Option<Age>,
}

pub fn normalize(prefs: &Preferences) -> NormalizedPreferences {
    let statement = prefs.statement.trim();
    let statement = if statement.is_empty() {
        DEFAULT_STATEMENT.to_string()
    } else {
        statement.to_string()
    };

    let interests_phrase = if prefs.interests.is_empty() {
        ANY_INTEREST.to_string()
    } else {
        prefs
            .interests
            .iter()
            .map(Interest::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    NormalizedPreferences {
        location: prefs.location,
        duration: prefs.duration,
        interests: prefs.interests.clone(),
        interests_phrase,
        statement,
        age: prefs.age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_preferences_get_defaults() {
        let normalized = normalize(&Preferences::default());
        assert_eq!(normalized.interests_phrase, "anything fun");
        assert_eq!(normalized.statement, DEFAULT_STATEMENT);
        assert!(normalized.age.is_none());
    }

    #[test]
    fn test_whitespace_statement_is_replaced() {
        let prefs = Preferences::default().with_statement("   \t ");
        assert_eq!(prefs.normalize().statement, DEFAULT_STATEMENT);
    }

    #[test]
    fn test_interests_joined_in_selection_order() {
        let prefs = Preferences::default()
            .with_interests([Interest::Music, Interest::Art, Interest::Music]);
        assert_eq!(prefs.interests, vec![Interest::Music, Interest::Art]);
        assert_eq!(prefs.normalize().interests_phrase, "music, art");
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!("OUTDOOR".parse::<Location>().unwrap(), Location::Outdoor);
        assert_eq!("Quick (5-15 min)".parse::<DurationBucket>().unwrap(), DurationBucket::Quick);
        assert_eq!("epic".parse::<DurationBucket>().unwrap(), DurationBucket::Epic);
        assert_eq!(" Nature ".parse::<Interest>().unwrap(), Interest::Nature);
        assert!("underwater".parse::<Location>().is_err());
        assert!("knitting".parse::<Interest>().is_err());
    }

    #[test]
    fn test_age_bounds() {
        assert!(Age::new(3).is_ok());
        assert!(Age::new(13).is_ok());
        assert!(Age::new(2).is_err());
        assert!("14".parse::<Age>().is_err());
        assert!("eight".parse::<Age>().is_err());
    }

    #[test]
    fn test_duration_labels_are_ordered() {
        let labels: Vec<_> = DurationBucket::ALL.iter().map(|d| d.label()).collect();
        assert_eq!(labels[0], "Quick (5-15 min)");
        assert_eq!(labels[4], "Any");
        assert!(DurationBucket::Quick < DurationBucket::Epic);
    }
}
