//! Day-by-day itinerary composition.
//!
//! Places are dealt out to days in input order. Each day gets at most three
//! attractions (morning, afternoon, evening) and draws lunch and dinner from
//! its share of food venues. Empty slots fall back to generic suggestions.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::providers::Place;

/// Upper bound on attraction or food slots drawn per day.
const MAX_PER_DAY: usize = 3;

/// One of the five fixed activity slots of a day.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slot {
    /// First attraction of the day.
    Morning,
    /// First food venue of the day.
    Lunch,
    /// Second attraction of the day.
    Afternoon,
    /// Second food venue of the day.
    Dinner,
    /// Third attraction of the day.
    Evening,
}

impl Slot {
    /// Slots in the order they appear in a day's plan.
    pub const ALL: [Self; 5] = [
        Self::Morning,
        Self::Lunch,
        Self::Afternoon,
        Self::Dinner,
        Self::Evening,
    ];

    /// Line prefix for this slot.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Lunch => "Lunch",
            Self::Afternoon => "Afternoon",
            Self::Dinner => "Dinner",
            Self::Evening => "Evening",
        }
    }

    /// Text used when no place is available for this slot.
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::Morning => "Explore local neighborhood",
            Self::Lunch => "Local street food",
            Self::Afternoon => "Relax at a nearby café or park",
            Self::Dinner => "Try a local restaurant",
            Self::Evening => "Take a walk or catch a local event",
        }
    }

    /// Position of this slot within the day's attraction or food share.
    const fn share_index(self) -> usize {
        match self {
            Self::Morning | Self::Lunch => 0,
            Self::Afternoon | Self::Dinner => 1,
            Self::Evening => 2,
        }
    }

    const fn is_meal(self) -> bool {
        matches!(self, Self::Lunch | Self::Dinner)
    }
}

/// The formatted plan for one day: five labeled lines, one per [`Slot`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryDay(String);

impl ItineraryDay {
    /// The formatted plan text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual `Label: activity` lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }
}

impl fmt::Display for ItineraryDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compose a plan of exactly `days` entries from fetched places.
///
/// Each day takes the next `min(3, ceil(len / days))` attractions and food
/// venues. Later days may receive nothing and then consist purely of
/// fallback text.
#[must_use]
pub fn compose(attractions: &[Place], food: &[Place], days: NonZeroU32) -> Vec<ItineraryDay> {
    let day_count = days.get() as usize;
    let per_day_attractions = share_size(attractions.len(), day_count);
    let per_day_food = share_size(food.len(), day_count);

    (0..day_count)
        .map(|day| {
            let sights = day_share(attractions, day, per_day_attractions);
            let meals = day_share(food, day, per_day_food);
            format_day(&sights, &meals)
        })
        .collect()
}

fn share_size(total: usize, days: usize) -> usize {
    total.div_ceil(days).min(MAX_PER_DAY)
}

fn day_share(places: &[Place], day: usize, per_day: usize) -> Vec<&Place> {
    places.iter().skip(day * per_day).take(per_day).collect()
}

fn format_day(sights: &[&Place], meals: &[&Place]) -> ItineraryDay {
    let lines: Vec<String> = Slot::ALL
        .iter()
        .map(|&slot| {
            let share = if slot.is_meal() { meals } else { sights };
            let activity = share
                .get(slot.share_index())
                .map_or_else(|| slot.fallback(), |place| place.name.as_str());
            format!("{}: {activity}", slot.label())
        })
        .collect();

    ItineraryDay(lines.join("\n"))
}
