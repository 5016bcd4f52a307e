use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::{FinderError, Result};
use super::player::{Player, PlayerRegistry};
use super::preferences::Preferences;
use super::suggestion::{ActivitySuggestion, SuggestionRequester};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Welcome,
    MainMenu,
    ActivitySearch,
    ActivityReveal,
    Scoreboard,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Welcome => write!(f, "welcome"),
            Screen::MainMenu => write!(f, "main_menu"),
            Screen::ActivitySearch => write!(f, "activity_search"),
            Screen::ActivityReveal => write!(f, "activity_reveal"),
            Screen::Scoreboard => write!(f, "scoreboard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectPlayer(String),
    FindActivity,
    ViewScoreboard,
    ReturnHome,
    SuggestionReady(ActivitySuggestion),
    SearchAgain,
    MarkComplete,
    GoBack,
}

/// What a transition did, for the presentation layer to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Moved { from: Screen, to: Screen },
    Completed { player: String, points: u32, total: u32 },
    Ignored,
}

/// One user's state: who is playing, which screen, what was suggested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
    registry: PlayerRegistry,
    current_player: Option<String>,
    screen: Screen,
    current_activity: Option<ActivitySuggestion>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(PlayerRegistry::default())
    }
}

impl Session {
    pub fn new(registry: PlayerRegistry) -> Self {
        let session = Session {
            id: Uuid::new_v4(),
            registry,
            current_player: None,
            screen: Screen::Welcome,
            current_activity: None,
        };
        tracing::info!(session = %session.id, "session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player
            .as_deref()
            .and_then(|name| self.registry.get(name))
    }

    pub fn current_player_name(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    pub fn current_activity(&self) -> Option<&ActivitySuggestion> {
        self.current_activity.as_ref()
    }

    /// Applies one action. Pairs outside the navigation table leave the
    /// session untouched and report `NavEvent::Ignored`.
    pub fn apply(self, action: Action) -> (Session, NavEvent) {
        let from = self.screen;
        let (session, event) = transition(self, action);
        match &event {
            NavEvent::Ignored => tracing::debug!(screen = %from, "action ignored"),
            NavEvent::Moved { from, to } => {
                tracing::debug!(session = %session.id, %from, %to, "screen changed")
            }
            _ => {}
        }
        (session, event)
    }

    /// Runs a search from the search screen. On failure the session comes
    /// back unchanged alongside the error.
    pub async fn submit_search(
        self,
        requester: &SuggestionRequester,
        prefs: &Preferences,
    ) -> (Session, Result<NavEvent>) {
        if self.screen != Screen::ActivitySearch {
            return (self, Ok(NavEvent::Ignored));
        }
        let player = match self.current_player.clone() {
            Some(player) => player,
            None => return (self, Ok(NavEvent::Ignored)),
        };

        match requester.request(&player, prefs).await {
            Ok(suggestion) => {
                let (session, event) = self.apply(Action::SuggestionReady(suggestion));
                (session, Ok(event))
            }
            Err(e) => (self, Err(e)),
        }
    }
}

fn moved(mut session: Session, to: Screen) -> (Session, NavEvent) {
    let from = session.screen;
    session.screen = to;
    if to != Screen::ActivityReveal {
        session.current_activity = None;
    }
    (session, NavEvent::Moved { from, to })
}

pub fn transition(mut session: Session, action: Action) -> (Session, NavEvent) {
    match (session.screen, action) {
        (Screen::Welcome, Action::SelectPlayer(name)) => {
            if !session.registry.contains(&name) {
                return (session, NavEvent::Ignored);
            }
            session.current_player = Some(name);
            moved(session, Screen::MainMenu)
        }

        (Screen::MainMenu, Action::FindActivity) => moved(session, Screen::ActivitySearch),
        (Screen::MainMenu, Action::ViewScoreboard) => moved(session, Screen::Scoreboard),
        (Screen::MainMenu, Action::ReturnHome) => {
            session.current_player = None;
            moved(session, Screen::Welcome)
        }

        (Screen::ActivitySearch, Action::SuggestionReady(suggestion)) => {
            session.current_activity = Some(suggestion);
            moved(session, Screen::ActivityReveal)
        }
        (Screen::ActivitySearch, Action::GoBack) => moved(session, Screen::MainMenu),

        (Screen::ActivityReveal, Action::SearchAgain) => moved(session, Screen::ActivitySearch),
        (Screen::ActivityReveal, Action::GoBack) => moved(session, Screen::MainMenu),
        (Screen::ActivityReveal, Action::MarkComplete) => {
            let event = complete_current(&mut session);
            (session, event)
        }

        (Screen::Scoreboard, Action::GoBack) => {
            let to = if session.current_player.is_some() {
                Screen::MainMenu
            } else {
                Screen::Welcome
            };
            moved(session, to)
        }

        (_, _) => (session, NavEvent::Ignored),
    }
}

fn complete_current(session: &mut Session) -> NavEvent {
    let (Some(player), Some(activity)) = (session.current_player.clone(), session.current_activity.as_ref()) else {
        return NavEvent::Ignored;
    };

    // Every press awards again; the reveal screen stays put.
    match session.registry.complete(&player, activity) {
        Ok(updated) => {
            let total = updated.points;
            NavEvent::Completed {
                points: activity.points,
                player,
                total,
            }
        }
        Err(FinderError::UnknownPlayer(name)) => {
            tracing::warn!(player = %name, "current player missing from registry");
            NavEvent::Ignored
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not record completion");
            NavEvent::Ignored
        }
    }
}
