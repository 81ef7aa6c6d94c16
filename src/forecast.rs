//! Daily forecast aggregation
//!
//! Folds the provider's 3-hourly samples into one entry per local calendar
//! day: temperature range, first description of the day and the mean wind
//! over samples that reported wind. Sunrise and sunset come from the current
//! conditions fetch and are stamped onto every day.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{DailyForecast, ForecastReport, format_wind_speed};
use crate::time_format::{format_clock, format_timezone, local_date, local_time_at};
use crate::weather::openweather::ForecastSample;
use crate::weather::{CurrentConditions, ForecastSeries};
use crate::{MausamError, Result};

/// Running totals for one local day
#[derive(Debug)]
struct DayAccumulator {
    date: String,
    temp_min: f64,
    temp_max: f64,
    weather: String,
    wind_sum: f64,
    wind_count: u32,
}

impl DayAccumulator {
    fn seed(date: String, sample: &ForecastSample, weather: String) -> Self {
        let wind = sample.wind_speed();
        Self {
            date,
            temp_min: sample.main.temp,
            temp_max: sample.main.temp,
            weather,
            wind_sum: wind.unwrap_or(0.0),
            wind_count: u32::from(wind.is_some()),
        }
    }

    fn add(&mut self, sample: &ForecastSample) {
        self.temp_min = self.temp_min.min(sample.main.temp);
        self.temp_max = self.temp_max.max(sample.main.temp);
        if let Some(speed) = sample.wind_speed() {
            self.wind_sum += speed;
            self.wind_count += 1;
        }
    }

    fn mean_wind(&self) -> Option<f64> {
        (self.wind_count > 0).then(|| self.wind_sum / f64::from(self.wind_count))
    }
}

/// Group samples by local date, in first-seen order
pub fn aggregate_daily(
    samples: &[ForecastSample],
    offset_seconds: i64,
    sunrise: &str,
    sunset: &str,
    local_time: &str,
) -> Result<Vec<DailyForecast>> {
    let mut days: Vec<DayAccumulator> = Vec::new();

    for sample in samples {
        let date = local_date(sample.dt, offset_seconds).ok_or_else(|| {
            MausamError::api(format!("Forecast sample has invalid timestamp {}", sample.dt))
        })?;

        match days.iter_mut().find(|day| day.date == date) {
            Some(day) => day.add(sample),
            None => {
                let weather = sample
                    .weather
                    .first()
                    .map(|condition| condition.description.clone())
                    .ok_or_else(|| {
                        MausamError::api(format!("Forecast sample {} has no conditions", sample.dt))
                    })?;
                days.push(DayAccumulator::seed(date, sample, weather));
            }
        }
    }

    debug!("Aggregated {} samples into {} days", samples.len(), days.len());

    Ok(days
        .into_iter()
        .map(|day| DailyForecast {
            wind_speed: format_wind_speed(day.mean_wind()),
            date: day.date,
            temp_min: day.temp_min,
            temp_max: day.temp_max,
            weather: day.weather,
            sunrise: sunrise.to_string(),
            sunset: sunset.to_string(),
            local_time: local_time.to_string(),
        })
        .collect())
}

/// Build the forecast report for a location.
///
/// `fallback_city`/`fallback_country` are used when the forecast payload
/// does not name the place.
pub fn build_report(
    series: &ForecastSeries,
    current: &CurrentConditions,
    fallback_city: String,
    fallback_country: Option<String>,
    now: DateTime<Utc>,
) -> Result<ForecastReport> {
    let offset = series.timezone();
    let sunrise = format_clock(current.sys.sunrise, offset);
    let sunset = format_clock(current.sys.sunset, offset);
    let local_time = local_time_at(now, offset);

    let forecast = aggregate_daily(&series.list, offset, &sunrise, &sunset, &local_time)?;

    let city = series
        .city
        .as_ref()
        .and_then(|city| city.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback_city);
    let country = series
        .city
        .as_ref()
        .and_then(|city| city.country.clone())
        .or(fallback_country);

    Ok(ForecastReport {
        city,
        country,
        timezone: format_timezone(offset),
        forecast,
    })
}
