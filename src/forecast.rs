use chrono::{DateTime, Days, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// number of forecasts in a freshly generated set.
pub const SEED_COUNT: usize = 5;
/// temperature range in celsius, upper bound excluded.
pub const TEMPERATURE_RANGE: std::ops::Range<i32> = -20..55;

pub const SUMMARIES: [&str; 10] = [
    "freezing",
    "bracing",
    "chilly",
    "cool",
    "mild",
    "warm",
    "balmy",
    "hot",
    "sweltering",
    "scorching",
];

// v1 always answered with capitalized words.
pub const SUMMARIES_V1: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub temperature_c: i32,
    pub summary: String,
}

/// body of a creation request, the id is assigned by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeatherForecast {
    pub date: DateTime<Utc>,
    pub temperature_c: i32,
    pub summary: String,
}

/// body of an edit request, id must match the one in the path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditWeatherForecast {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub temperature_c: i32,
    pub summary: String,
}

impl WeatherForecast {
    pub fn new(forecast: CreateWeatherForecast) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: forecast.date,
            temperature_c: forecast.temperature_c,
            summary: forecast.summary,
        }
    }
    /// replace every mutable field, the id stays the same.
    pub fn apply(&mut self, edit: EditWeatherForecast) {
        self.date = edit.date;
        self.temperature_c = edit.temperature_c;
        self.summary = edit.summary;
    }
}

/// one forecast per day starting tomorrow, random temperature and summary.
pub fn generate(now: DateTime<Utc>, summaries: &[&str]) -> Vec<WeatherForecast> {
    let mut rng = rand::rng();
    (1..=SEED_COUNT as u64)
        .map(|day| WeatherForecast {
            id: Uuid::new_v4(),
            date: now + Days::new(day),
            temperature_c: rng.random_range(TEMPERATURE_RANGE),
            summary: summaries[rng.random_range(0..summaries.len())].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use chrono::{Days, Utc};

    use super::{generate, SEED_COUNT, SUMMARIES, TEMPERATURE_RANGE};

    #[test]
    fn generated_set_is_bounded() {
        let now = Utc::now();
        let set = generate(now, &SUMMARIES);
        assert_eq!(set.len(), SEED_COUNT);
        for (i, forecast) in set.iter().enumerate() {
            assert_eq!(forecast.date, now + Days::new(i as u64 + 1));
            assert!(TEMPERATURE_RANGE.contains(&forecast.temperature_c));
            assert!(SUMMARIES.contains(&forecast.summary.as_str()));
            assert!(!forecast.id.is_nil());
        }
    }
    #[test]
    fn ids_are_unique() {
        let set = generate(Utc::now(), &SUMMARIES);
        let mut ids: Vec<_> = set.iter().map(|f| f.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), SEED_COUNT);
    }
}
