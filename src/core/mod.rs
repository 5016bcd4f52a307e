pub mod catalog;
pub mod error;
pub mod player;
pub mod preferences;
pub mod session;
pub mod suggestion;

pub use catalog::{ActivityCatalog, CatalogActivity};
pub use error::{FinderError, Result};
pub use player::{Medal, Player, PlayerProfile, PlayerRegistry, ScoreboardEntry};
pub use preferences::{Age, DurationBucket, Interest, Location, NormalizedPreferences, Preferences};
pub use session::{Action, NavEvent, Screen, Session};
pub use suggestion::{ActivitySuggestion, SuggestionRequester, TextGenerator, SUGGESTION_POINTS};
