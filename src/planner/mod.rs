//! Trip planning dialogue.
//!
//! - `itinerary`: pure day-by-day composition of fetched places
//! - `session`: dialogue state, transcript messages, in-flight guard
//! - `controller`: the two-step destination / trip-length driver

pub mod controller;
pub mod error;
pub mod itinerary;
pub mod session;

pub use controller::{MAX_TRIP_DAYS, TripController, parse_day_count};
pub use error::{PlannerError, PlannerResult};
pub use itinerary::{ItineraryDay, Slot, compose};
pub use session::{ConversationState, Message, Session, SharedSession, TripPlan, Turn};
