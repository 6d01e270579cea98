//! Two-step dialogue driver: destination first, then trip length.

use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::planner::error::PlannerResult;
use crate::planner::itinerary::compose;
use crate::planner::session::{ConversationState, Message, Session, TripPlan};
use crate::providers::{
    ATTRACTION_CATEGORIES, FOOD_CATEGORIES, Location, Place, ProviderConfig, TravelProviders,
};

/// Reply when the destination could not be geocoded.
pub const DESTINATION_NOT_FOUND: &str =
    "Sorry, I couldn't find that place. Could you try another destination?";
/// Longest trip that can be planned, matching the forecast horizon.
pub const MAX_TRIP_DAYS: u32 = 14;
/// Reply when the trip length is not a whole number between 1 and [`MAX_TRIP_DAYS`].
pub const INVALID_DAY_COUNT: &str =
    "Please enter a valid number of days (a whole number from 1 to 14).";
/// Reply when planning failed as a whole.
pub const PLANNING_FAILED: &str =
    "Something went wrong while planning your trip. Please try another destination.";

/// Sequences geocoding, place lookup, composition and forecasting in
/// response to user submissions.
pub struct TripController {
    providers: TravelProviders,
    attraction_categories: String,
    food_categories: String,
}

impl TripController {
    /// Create a controller with the default category filters.
    #[must_use]
    pub fn new(providers: TravelProviders) -> Self {
        Self {
            providers,
            attraction_categories: ATTRACTION_CATEGORIES.to_string(),
            food_categories: FOOD_CATEGORIES.to_string(),
        }
    }

    /// Create a controller backed by the HTTP providers.
    ///
    /// # Errors
    /// Returns an error if the providers cannot be built from `config`.
    pub fn from_config(config: &ProviderConfig) -> PlannerResult<Self> {
        let providers = TravelProviders::from_config(config)?;
        Ok(Self::new(providers).with_categories(
            config.attraction_categories.clone(),
            config.food_categories.clone(),
        ))
    }

    /// Override the attraction and food category filters.
    #[must_use]
    pub fn with_categories(mut self, attractions: String, food: String) -> Self {
        self.attraction_categories = attractions;
        self.food_categories = food;
        self
    }

    /// Apply one user submission to `session`.
    ///
    /// Appends the user's message and exactly one bot reply, and returns both.
    /// Blank input is ignored and returns an empty slice.
    pub async fn submit<'s>(&self, session: &'s mut Session, input: &str) -> &'s [Message] {
        let text = input.trim();
        let start = session.transcript().len();
        if text.is_empty() {
            return session.messages_since(start);
        }

        session.push(Message::user(text));

        match session.state().clone() {
            ConversationState::AwaitingDestination => {
                self.handle_destination(session, text).await;
            }
            ConversationState::AwaitingDayCount {
                destination,
                location,
            } => {
                self.handle_day_count(session, &destination, location, text)
                    .await;
            }
        }

        session.messages_since(start)
    }

    async fn handle_destination(&self, session: &mut Session, destination: &str) {
        let Some(location) = self.providers.geocoder.resolve(destination).await else {
            session.push(Message::bot(DESTINATION_NOT_FOUND));
            return;
        };

        info!("Resolved {destination} to {location}");
        session.push(Message::bot(format!(
            "Great choice! How many days will you spend in {destination}?"
        )));
        session.set_state(ConversationState::AwaitingDayCount {
            destination: destination.to_string(),
            location,
        });
    }

    async fn handle_day_count(
        &self,
        session: &mut Session,
        destination: &str,
        location: Location,
        input: &str,
    ) {
        let Some(days) = parse_day_count(input) else {
            session.push(Message::bot(INVALID_DAY_COUNT));
            return;
        };

        match self.plan_trip(location, days).await {
            Ok(plan) => {
                info!(
                    "Planned {days}-day trip to {destination}: {} attractions, {} food venues, {} forecast days",
                    plan.attractions.len(),
                    plan.food.len(),
                    plan.weather.len()
                );
                let markers = plan
                    .attractions
                    .iter()
                    .chain(&plan.food)
                    .cloned()
                    .collect();
                session.set_map_places(markers);
                session.push(Message::trip(
                    format!("Here's your {days}-day trip to {destination}!"),
                    plan,
                ));
            }
            Err(e) => {
                tracing::error!("Trip planning for {destination} failed: {e}");
                session.push(Message::bot(PLANNING_FAILED));
            }
        }

        session.set_state(ConversationState::AwaitingDestination);
    }

    /// Fetch places (both categories concurrently), compose, then forecast.
    async fn plan_trip(&self, location: Location, days: NonZeroU32) -> PlannerResult<TripPlan> {
        let attractions = self.spawn_place_lookup(location, &self.attraction_categories, days);
        let food = self.spawn_place_lookup(location, &self.food_categories, days);
        let abort_attractions = attractions.abort_handle();
        let abort_food = food.abort_handle();
        let (attractions, food) = match tokio::try_join!(attractions, food) {
            Ok(found) => found,
            Err(e) => {
                abort_attractions.abort();
                abort_food.abort();
                return Err(e.into());
            }
        };

        if attractions.is_empty() {
            warn!("No attractions found near {location}");
        }
        if food.is_empty() {
            warn!("No food venues found near {location}");
        }

        let itinerary = compose(&attractions, &food, days);
        let weather = self.providers.weather.forecast(location, days.get()).await;

        Ok(TripPlan {
            attractions,
            food,
            itinerary,
            weather,
        })
    }

    fn spawn_place_lookup(
        &self,
        location: Location,
        categories: &str,
        days: NonZeroU32,
    ) -> JoinHandle<Vec<Place>> {
        let places = Arc::clone(&self.providers.places);
        let categories = categories.to_string();
        tokio::spawn(async move { places.find(location, &categories, days.get()).await })
    }
}

/// Parse a trip length: ASCII digits only, from 1 to [`MAX_TRIP_DAYS`].
#[must_use]
pub fn parse_day_count(input: &str) -> Option<NonZeroU32> {
    let digits = input.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits
        .parse::<u32>()
        .ok()
        .filter(|days| *days <= MAX_TRIP_DAYS)
        .and_then(NonZeroU32::new)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Days, NaiveDate};
    use tokio::sync::{Notify, oneshot};
    use tokio::time::{Duration, timeout};

    use super::*;
    use crate::planner::PlannerError;
    use crate::planner::session::{SharedSession, Turn};
    use crate::providers::{Geocoder, PlaceFinder, ProviderFuture, WeatherDay, WeatherForecaster};

    #[derive(Default)]
    struct FakeGeocoder {
        known: HashMap<String, Location>,
        calls: AtomicUsize,
    }

    impl FakeGeocoder {
        fn with(mut self, name: &str, location: Location) -> Self {
            self.known.insert(name.to_lowercase(), location);
            self
        }
    }

    impl Geocoder for FakeGeocoder {
        fn resolve(&self, text: &str) -> ProviderFuture<'_, Option<Location>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let found = self.known.get(&text.to_lowercase()).copied();
            Box::pin(async move { found })
        }
    }

    #[derive(Default)]
    struct FakePlaces {
        requests: Mutex<Vec<(String, u32)>>,
    }

    impl FakePlaces {
        fn requests(&self) -> Vec<(String, u32)> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl PlaceFinder for FakePlaces {
        fn find(
            &self,
            _location: Location,
            categories: &str,
            days: u32,
        ) -> ProviderFuture<'_, Vec<Place>> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((categories.to_string(), days));
            }
            let prefix = if categories.starts_with("tourism") {
                "sight"
            } else {
                "eatery"
            };
            let places = (0..days * 5)
                .map(|i| Place::named(format!("{prefix}{i}"), format!("{prefix}-{i}")))
                .collect();
            Box::pin(async move { places })
        }
    }

    struct PanickingPlaces;

    #[allow(clippy::panic)]
    fn explode() -> Vec<Place> {
        panic!("places backend exploded")
    }

    impl PlaceFinder for PanickingPlaces {
        fn find(&self, _: Location, _: &str, _: u32) -> ProviderFuture<'_, Vec<Place>> {
            Box::pin(async { explode() })
        }
    }

    /// Panics on attractions; food lookups hang until dropped.
    struct HangingFood {
        dropped: Mutex<Option<oneshot::Sender<()>>>,
    }

    impl PlaceFinder for HangingFood {
        fn find(&self, _: Location, categories: &str, _: u32) -> ProviderFuture<'_, Vec<Place>> {
            if categories.starts_with("tourism") {
                return Box::pin(async { explode() });
            }
            let guard = self.dropped.lock().ok().and_then(|mut tx| tx.take());
            Box::pin(async move {
                let _guard = guard;
                std::future::pending::<()>().await;
                Vec::new()
            })
        }
    }

    /// Resolves every destination, but only once released.
    #[derive(Default)]
    struct GatedGeocoder {
        entered: Notify,
        release: Notify,
    }

    impl Geocoder for GatedGeocoder {
        fn resolve(&self, _text: &str) -> ProviderFuture<'_, Option<Location>> {
            Box::pin(async move {
                self.entered.notify_one();
                self.release.notified().await;
                Some(PARIS)
            })
        }
    }

    #[derive(Default)]
    struct FakeWeather {
        calls: AtomicUsize,
    }

    impl WeatherForecaster for FakeWeather {
        fn forecast(&self, _location: Location, days: u32) -> ProviderFuture<'_, Vec<WeatherDay>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
            let forecast = (0..u64::from(days))
                .map(|i| WeatherDay {
                    date: start.checked_add_days(Days::new(i)).unwrap_or(start),
                    condition: "Sunny".to_string(),
                    icon: "//cdn.weatherapi.com/weather/64x64/day/113.png".to_string(),
                    temp: 24.0,
                    humidity: 45,
                })
                .collect();
            Box::pin(async move { forecast })
        }
    }

    const PARIS: Location = Location::new(48.8566, 2.3522);

    struct Harness {
        geocoder: Arc<FakeGeocoder>,
        places: Arc<FakePlaces>,
        weather: Arc<FakeWeather>,
        controller: TripController,
    }

    fn harness() -> Harness {
        let geocoder = Arc::new(FakeGeocoder::default().with("Paris", PARIS));
        let places = Arc::new(FakePlaces::default());
        let weather = Arc::new(FakeWeather::default());
        let controller = TripController::new(TravelProviders::new(
            geocoder.clone(),
            places.clone(),
            weather.clone(),
        ));
        Harness {
            geocoder,
            places,
            weather,
            controller,
        }
    }

    fn bot_count(messages: &[Message]) -> usize {
        messages.iter().filter(|m| m.is_bot).count()
    }

    #[test]
    fn test_parse_day_count() {
        assert_eq!(parse_day_count("3").map(NonZeroU32::get), Some(3));
        assert_eq!(parse_day_count("  7 \n").map(NonZeroU32::get), Some(7));
        assert_eq!(parse_day_count("0"), None);
        assert_eq!(parse_day_count("-3"), None);
        assert_eq!(parse_day_count("+3"), None);
        assert_eq!(parse_day_count("abc"), None);
        assert_eq!(parse_day_count("2.5"), None);
        assert_eq!(parse_day_count(""), None);
        assert_eq!(parse_day_count("14").map(NonZeroU32::get), Some(MAX_TRIP_DAYS));
        assert_eq!(parse_day_count("15"), None);
        assert_eq!(parse_day_count("4294967295"), None);
        assert_eq!(parse_day_count("99999999999"), None);
    }

    #[tokio::test]
    async fn test_valid_destination_moves_to_day_count() {
        let h = harness();
        let mut session = Session::new();

        let new = h.controller.submit(&mut session, "Paris").await;
        assert_eq!(new.len(), 2);
        assert_eq!(bot_count(new), 1);
        assert!(new[1].text.contains("How many days"));

        assert_eq!(
            session.state(),
            &ConversationState::AwaitingDayCount {
                destination: "Paris".to_string(),
                location: PARIS,
            }
        );
        assert_eq!(session.state().pending_location(), Some(PARIS));
    }

    #[tokio::test]
    async fn test_unknown_destination_stays_put() {
        let h = harness();
        let mut session = Session::new();

        let new = h.controller.submit(&mut session, "Atlantis").await;
        assert_eq!(bot_count(new), 1);
        assert_eq!(new[1].text, DESTINATION_NOT_FOUND);
        assert_eq!(session.state(), &ConversationState::AwaitingDestination);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_day_counts_are_rejected_without_network() {
        let h = harness();
        let mut session = Session::new();
        h.controller.submit(&mut session, "Paris").await;
        let awaiting = session.state().clone();

        for input in ["0", "-3", "abc", "15", "4294967295"] {
            let new = h.controller.submit(&mut session, input).await;
            assert_eq!(bot_count(new), 1);
            assert_eq!(new[1].text, INVALID_DAY_COUNT);
            assert_eq!(session.state(), &awaiting);
        }

        assert!(h.places.requests().is_empty());
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_cycle_produces_one_bundled_message() {
        let h = harness();
        let mut session = Session::new();
        h.controller.submit(&mut session, "Paris").await;

        let new = h.controller.submit(&mut session, "3").await.to_vec();
        assert_eq!(bot_count(&new), 1);
        assert_eq!(session.state(), &ConversationState::AwaitingDestination);

        let reply = &new[1];
        assert!(reply.text.contains("Paris"));
        assert_eq!(reply.itinerary.as_ref().map(Vec::len), Some(3));
        assert_eq!(reply.attractions.as_ref().map(Vec::len), Some(15));
        assert_eq!(reply.food.as_ref().map(Vec::len), Some(15));
        assert_eq!(reply.weather.as_ref().map(Vec::len), Some(3));

        let day_one = reply
            .itinerary
            .as_ref()
            .and_then(|days| days.first())
            .map(|day| day.as_str().to_string())
            .unwrap_or_default();
        assert_eq!(
            day_one,
            "Morning: sight0\nLunch: eatery0\nAfternoon: sight1\nDinner: eatery1\nEvening: sight2"
        );

        let mut requests = h.places.requests();
        requests.sort();
        assert_eq!(
            requests,
            vec![
                (FOOD_CATEGORIES.to_string(), 3),
                (ATTRACTION_CATEGORIES.to_string(), 3),
            ]
        );
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.map_places().len(), 30);
    }

    #[tokio::test]
    async fn test_next_cycle_starts_after_plan() {
        let h = harness();
        let mut session = Session::new();
        h.controller.submit(&mut session, "Paris").await;
        h.controller.submit(&mut session, "1").await;

        let new = h.controller.submit(&mut session, "Paris").await;
        assert!(new[1].text.contains("How many days"));
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 2);
        assert!(!session.map_places().is_empty());
    }

    #[tokio::test]
    async fn test_provider_panic_is_reported_and_state_resets() {
        let geocoder = Arc::new(FakeGeocoder::default().with("Paris", PARIS));
        let weather = Arc::new(FakeWeather::default());
        let controller = TripController::new(TravelProviders::new(
            geocoder,
            Arc::new(PanickingPlaces),
            weather.clone(),
        ));
        let mut session = Session::new();
        controller.submit(&mut session, "Paris").await;

        let new = controller.submit(&mut session, "2").await;
        assert_eq!(bot_count(new), 1);
        assert_eq!(new[1].text, PLANNING_FAILED);
        assert_eq!(session.state(), &ConversationState::AwaitingDestination);
        assert!(session.map_places().is_empty());
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_cancels_sibling() {
        let (tx, rx) = oneshot::channel();
        let controller = TripController::new(TravelProviders::new(
            Arc::new(FakeGeocoder::default().with("Paris", PARIS)),
            Arc::new(HangingFood {
                dropped: Mutex::new(Some(tx)),
            }),
            Arc::new(FakeWeather::default()),
        ));
        let mut session = Session::new();
        controller.submit(&mut session, "Paris").await;

        let new = controller.submit(&mut session, "2").await;
        assert_eq!(new[1].text, PLANNING_FAILED);

        // The hanging food task is aborted, which drops its sender.
        let outcome = timeout(Duration::from_secs(5), rx).await;
        assert!(matches!(outcome, Ok(Err(_))));
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected_while_in_flight() {
        let geocoder = Arc::new(GatedGeocoder::default());
        let controller = Arc::new(TripController::new(TravelProviders::new(
            geocoder.clone(),
            Arc::new(FakePlaces::default()),
            Arc::new(FakeWeather::default()),
        )));
        let shared = Arc::new(SharedSession::new(Session::new()));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            let shared = Arc::clone(&shared);
            async move { shared.submit(&controller, "Paris").await }
        });
        geocoder.entered.notified().await;

        let rejected = shared.submit(&controller, "Rome").await;
        assert!(matches!(rejected, Err(PlannerError::Busy)));

        geocoder.release.notify_one();
        let accepted = first.await;
        assert!(matches!(
            accepted,
            Ok(Ok(Turn { state: ConversationState::AwaitingDayCount { .. }, .. }))
        ));

        let texts: Vec<String> = shared
            .snapshot()
            .map(|s| s.transcript().iter().map(|m| m.text.clone()).collect())
            .unwrap_or_default();
        assert_eq!(texts.len(), 3);
        assert!(!texts.iter().any(|t| t == "Rome"));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let h = harness();
        let mut session = Session::new();
        let new = h.controller.submit(&mut session, "   ").await;
        assert!(new.is_empty());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shared_session_submit_returns_new_messages() {
        let h = harness();
        let shared = SharedSession::new(Session::new());

        let first = shared.submit(&h.controller, "Paris").await;
        assert!(matches!(
            first,
            Ok(Turn { state: ConversationState::AwaitingDayCount { .. }, ref messages })
                if messages.len() == 2
        ));

        let second = shared.submit(&h.controller, "2").await;
        let itinerary_days = second
            .as_ref()
            .ok()
            .and_then(|t| t.messages.last())
            .and_then(|m| m.itinerary.as_ref())
            .map(Vec::len);
        assert_eq!(itinerary_days, Some(2));
        assert!(matches!(
            second.map(|t| t.state),
            Ok(ConversationState::AwaitingDestination)
        ));

        let snapshot = shared.snapshot().map(|s| s.transcript().len());
        assert!(matches!(snapshot, Ok(5)));
    }
}
