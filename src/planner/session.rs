//! Conversation state, transcript messages and the per-user session.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::planner::controller::TripController;
use crate::planner::error::{PlannerError, PlannerResult};
use crate::planner::itinerary::ItineraryDay;
use crate::providers::{Location, Place, WeatherDay};

/// First bot message of every session.
pub const GREETING: &str = "Hi! I'm your travel planner. Where would you like to go?";

/// Where the dialogue currently stands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    /// Waiting for a destination to geocode.
    AwaitingDestination,
    /// Destination resolved, waiting for the trip length.
    AwaitingDayCount {
        /// Destination as the user typed it.
        destination: String,
        /// Where the destination resolved to.
        location: Location,
    },
}

impl ConversationState {
    /// Stable state name for logs and API responses.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AwaitingDestination => "awaiting_destination",
            Self::AwaitingDayCount { .. } => "awaiting_day_count",
        }
    }

    /// Resolved location of the pending destination, if any.
    #[must_use]
    pub const fn pending_location(&self) -> Option<Location> {
        match self {
            Self::AwaitingDestination => None,
            Self::AwaitingDayCount { location, .. } => Some(*location),
        }
    }
}

/// Everything fetched and composed for one trip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TripPlan {
    /// Sights and attractions near the destination.
    pub attractions: Vec<Place>,
    /// Restaurants and fast food near the destination.
    pub food: Vec<Place>,
    /// One entry per trip day.
    pub itinerary: Vec<ItineraryDay>,
    /// One forecast per trip day, when available.
    pub weather: Vec<WeatherDay>,
}

/// A transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message text.
    pub text: String,
    /// Whether the planner (rather than the user) sent it.
    pub is_bot: bool,
    /// Attractions bundled with a trip plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attractions: Option<Vec<Place>>,
    /// Food venues bundled with a trip plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<Vec<Place>>,
    /// Day-by-day itinerary bundled with a trip plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Vec<ItineraryDay>>,
    /// Forecast bundled with a trip plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Vec<WeatherDay>>,
}

impl Message {
    /// A plain message typed by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(text.into(), false)
    }

    /// A plain message from the planner.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self::plain(text.into(), true)
    }

    /// A planner message carrying a complete trip plan.
    #[must_use]
    pub fn trip(text: impl Into<String>, plan: TripPlan) -> Self {
        Self {
            text: text.into(),
            is_bot: true,
            attractions: Some(plan.attractions),
            food: Some(plan.food),
            itinerary: Some(plan.itinerary),
            weather: Some(plan.weather),
        }
    }

    const fn plain(text: String, is_bot: bool) -> Self {
        Self {
            text,
            is_bot,
            attractions: None,
            food: None,
            itinerary: None,
            weather: None,
        }
    }

    /// Render the message and any bundled results as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.text.clone();

        if let Some(attractions) = &self.attractions {
            render_places(&mut out, "Attractions", attractions);
        }
        if let Some(food) = &self.food {
            render_places(&mut out, "Food", food);
        }
        if let Some(itinerary) = &self.itinerary {
            out.push_str("\n\nItinerary:");
            for (i, day) in itinerary.iter().enumerate() {
                let _ = write!(out, "\n  Day {}", i + 1);
                for line in day.lines() {
                    let _ = write!(out, "\n    {line}");
                }
            }
        }
        if let Some(weather) = &self.weather {
            out.push_str("\n\nWeather:");
            if weather.is_empty() {
                out.push_str("\n  (forecast unavailable)");
            }
            for day in weather {
                let _ = write!(
                    out,
                    "\n  {}: {}, {:.1}°C, {}% humidity",
                    day.date, day.condition, day.temp, day.humidity
                );
            }
        }

        out
    }
}

fn render_places(out: &mut String, heading: &str, places: &[Place]) {
    let _ = write!(out, "\n\n{heading}:");
    if places.is_empty() {
        out.push_str("\n  (none found)");
    }
    for place in places {
        if place.formatted.is_empty() {
            let _ = write!(out, "\n  - {}", place.name);
        } else {
            let _ = write!(out, "\n  - {} ({})", place.name, place.formatted);
        }
    }
}

/// One user's conversation: dialogue state plus append-only transcript.
#[derive(Clone, Debug)]
pub struct Session {
    id: Uuid,
    state: ConversationState,
    transcript: Vec<Message>,
    map_places: Vec<Place>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a session with a fresh id and the greeting message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConversationState::AwaitingDestination,
            transcript: vec![Message::bot(GREETING)],
            map_places: Vec::new(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current dialogue state.
    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Full transcript, oldest first.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Places from the last successful trip, for map markers.
    #[must_use]
    pub fn map_places(&self) -> &[Place] {
        &self.map_places
    }

    /// Messages appended at or after transcript index `start`.
    #[must_use]
    pub fn messages_since(&self, start: usize) -> &[Message] {
        self.transcript.get(start..).unwrap_or_default()
    }

    /// Drop the conversation and start over with a new greeting.
    pub fn reset(&mut self) {
        self.state = ConversationState::AwaitingDestination;
        self.transcript = vec![Message::bot(GREETING)];
        self.map_places.clear();
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub(crate) fn set_state(&mut self, state: ConversationState) {
        self.state = state;
    }

    pub(crate) fn set_map_places(&mut self, places: Vec<Place>) {
        self.map_places = places;
    }
}

/// Outcome of one submission: the resulting state and the appended messages.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Turn {
    /// State after the submission.
    #[serde(flatten)]
    pub state: ConversationState,
    /// User message and bot reply, empty for blank input.
    pub messages: Vec<Message>,
}

/// A session guarded against concurrent submissions.
///
/// Only one submission may be processed at a time; a second one arriving
/// while the first is in flight is rejected with [`PlannerError::Busy`]
/// rather than queued.
#[derive(Debug, Default)]
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    /// Wrap a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Apply one user submission and return what it appended.
    ///
    /// # Errors
    /// Returns [`PlannerError::Busy`] if another submission is in flight.
    pub async fn submit(&self, controller: &TripController, input: &str) -> PlannerResult<Turn> {
        let mut session = self.inner.try_lock().map_err(|_| PlannerError::Busy)?;
        let messages = controller.submit(&mut session, input).await.to_vec();
        Ok(Turn {
            state: session.state().clone(),
            messages,
        })
    }

    /// Reset the wrapped session and return its new transcript.
    ///
    /// # Errors
    /// Returns [`PlannerError::Busy`] if a submission is in flight.
    pub fn reset(&self) -> PlannerResult<Vec<Message>> {
        let mut session = self.inner.try_lock().map_err(|_| PlannerError::Busy)?;
        session.reset();
        Ok(session.transcript().to_vec())
    }

    /// Clone the current session contents.
    ///
    /// # Errors
    /// Returns [`PlannerError::Busy`] while a submission is in flight.
    pub fn snapshot(&self) -> PlannerResult<Session> {
        self.inner
            .try_lock()
            .map(|guard| guard.clone())
            .map_err(|_| PlannerError::Busy)
    }
}
