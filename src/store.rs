use std::{fmt::Debug, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::forecast::{
    generate, CreateWeatherForecast, EditWeatherForecast, WeatherForecast, SUMMARIES,
};

/// source of the current time, replaced by a manual clock in tests.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no weather forecast with id {0}")]
    NotFound(Uuid),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Debug)]
struct Populated {
    snapshot: Vec<WeatherForecast>,
    deadline: DateTime<Utc>,
}

/// the only place forecasts live. None until the first access or after expiration.
#[derive(Debug, Default)]
struct Slot(Option<Populated>);

impl Slot {
    /// return the live snapshot, generating a new one if absent or expired.
    /// The deadline is pushed back by `window` on every call.
    fn snapshot(&mut self, now: DateTime<Utc>, window: TimeDelta) -> &mut Vec<WeatherForecast> {
        if self.0.as_ref().is_some_and(|p| p.deadline <= now) {
            debug!("forecast snapshot expired");
            self.0 = None;
        }
        let populated = self.0.get_or_insert_with(|| {
            debug!("generating a new forecast snapshot");
            Populated {
                snapshot: generate(now, &SUMMARIES),
                deadline: now,
            }
        });
        populated.deadline = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        &mut populated.snapshot
    }
}

/// In memory store of weather forecasts with a sliding expiration.
/// Every operation holds the lock for its whole load/modify/store cycle.
#[derive(Debug)]
pub struct ForecastStore {
    slot: Mutex<Slot>,
    window: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl ForecastStore {
    pub fn new(expiration: Duration) -> Self {
        Self::with_clock(expiration, Arc::new(SystemClock))
    }
    pub fn with_clock(expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            window: TimeDelta::from_std(expiration).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }
    pub async fn list(&self) -> Vec<WeatherForecast> {
        let mut slot = self.slot.lock().await;
        slot.snapshot(self.clock.now(), self.window).clone()
    }
    pub async fn get(&self, id: Uuid) -> Result<WeatherForecast, StoreError> {
        if id.is_nil() {
            return Err(StoreError::BadRequest("empty id".to_string()));
        }
        let mut slot = self.slot.lock().await;
        slot.snapshot(self.clock.now(), self.window)
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
    pub async fn create(&self, forecast: CreateWeatherForecast) -> WeatherForecast {
        let forecast = WeatherForecast::new(forecast);
        let mut slot = self.slot.lock().await;
        slot.snapshot(self.clock.now(), self.window).push(forecast.clone());
        debug!("forecast {} created", forecast.id);
        forecast
    }
    /// the edited forecast keeps its position in the snapshot.
    pub async fn update(&self, id: Uuid, edit: EditWeatherForecast) -> Result<(), StoreError> {
        if id != edit.id {
            return Err(StoreError::BadRequest(format!(
                "path id {id} does not match body id {}",
                edit.id
            )));
        }
        let mut slot = self.slot.lock().await;
        let forecast = slot
            .snapshot(self.clock.now(), self.window)
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::NotFound(id))?;
        forecast.apply(edit);
        debug!("forecast {id} updated");
        Ok(())
    }
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().await;
        let snapshot = slot.snapshot(self.clock.now(), self.window);
        let index = snapshot
            .iter()
            .position(|f| f.id == id)
            .ok_or(StoreError::NotFound(id))?;
        snapshot.remove(index);
        debug!("forecast {id} deleted");
        Ok(())
    }
}
