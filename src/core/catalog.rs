use serde::{Deserialize, Serialize};

use super::preferences::{DurationBucket, Interest, Location, NormalizedPreferences};

/// A hand-picked activity shipped with the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogActivity {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub duration: DurationBucket,
    pub location: Location,
    pub points: u32,
    pub age_min: u8,
    pub age_max: u8,
    pub interests: Vec<Interest>,
}

impl CatalogActivity {
    /// True when nothing in `prefs` rules this activity out.
    pub fn fits(&self, prefs: &NormalizedPreferences) -> bool {
        let location_ok = match prefs.location {
            Location::Either => true,
            wanted => self.location == wanted || self.location == Location::Either,
        };
        let duration_ok = prefs.duration == DurationBucket::Any || self.duration == prefs.duration;
        let interests_ok = prefs.interests.is_empty()
            || prefs.interests.iter().any(|i| self.interests.contains(i));
        let age_ok = prefs
            .age
            .map_or(true, |age| (self.age_min..=self.age_max).contains(&age.years()));

        location_ok && duration_ok && interests_ok && age_ok
    }
}

#[derive(Debug, Clone)]
pub struct ActivityCatalog {
    activities: Vec<CatalogActivity>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        ActivityCatalog::builtin()
    }
}

impl ActivityCatalog {
    pub fn new(activities: Vec<CatalogActivity>) -> Self {
        ActivityCatalog { activities }
    }

    pub fn builtin() -> Self {
        ActivityCatalog::new(vec![
            CatalogActivity {
                id: 101,
                name: "LEGO Tower Challenge".to_string(),
                description: "Build the tallest tower you can without it falling!".to_string(),
                category: "lego".to_string(),
                duration: DurationBucket::Quick,
                location: Location::Indoor,
                points: 15,
                age_min: 3,
                age_max: 13,
                interests: vec![Interest::Building, Interest::Creative],
            },
            CatalogActivity {
                id: 201,
                name: "Paper Snowflake Decorations".to_string(),
                description: "Create beautiful snowflakes to hang around the house!".to_string(),
                category: "creative".to_string(),
                duration: DurationBucket::Medium,
                location: Location::Indoor,
                points: 25,
                age_min: 5,
                age_max: 13,
                interests: vec![Interest::Art, Interest::Creative],
            },
            CatalogActivity {
                id: 601,
                name: "Capture the Flag".to_string(),
                description: "Play the classic outdoor team game!".to_string(),
                category: "games".to_string(),
                duration: DurationBucket::Long,
                location: Location::Outdoor,
                points: 35,
                age_min: 7,
                age_max: 13,
                interests: vec![Interest::Games, Interest::Sports],
            },
        ])
    }

    pub fn activities(&self) -> &[CatalogActivity] {
        &self.activities
    }

    pub fn matching(&self, prefs: &NormalizedPreferences) -> Vec<&CatalogActivity> {
        self.activities.iter().filter(|a| a.fits(prefs)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preferences::{Age, Preferences};

    fn names(found: Vec<&CatalogActivity>) -> Vec<&str> {
        found.into_iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_no_filters_matches_everything() {
        let catalog = ActivityCatalog::builtin();
        let found = catalog.matching(&Preferences::default().normalize());
        assert_eq!(found.len(), catalog.activities().len());
    }

    #[test]
    fn test_location_and_duration_filter() {
        let catalog = ActivityCatalog::builtin();
        let prefs = Preferences::new(Location::Indoor, DurationBucket::Medium).normalize();
        assert_eq!(names(catalog.matching(&prefs)), vec!["Paper Snowflake Decorations"]);

        let prefs = Preferences::new(Location::Outdoor, DurationBucket::Quick).normalize();
        assert!(catalog.matching(&prefs).is_empty());
    }

    #[test]
    fn test_interest_and_age_filter() {
        let catalog = ActivityCatalog::builtin();
        let prefs = Preferences::default()
            .with_interests([Interest::Games])
            .normalize();
        assert_eq!(names(catalog.matching(&prefs)), vec!["Capture the Flag"]);

        let prefs = Preferences::default()
            .with_interests([Interest::Creative])
            .with_age(Age::new(4).unwrap())
            .normalize();
        assert_eq!(names(catalog.matching(&prefs)), vec!["LEGO Tower Challenge"]);
    }
}
