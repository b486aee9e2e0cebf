//! Reducing forecast series to one sample per day.

use std::ops::RangeInclusive;

use chrono::{NaiveDate, Timelike};

use crate::model::{DailyForecast, ForecastSample};

/// Most days a daily outlook shows.
pub const MAX_DAYS: usize = 5;

/// Local hours treated as "around noon".
pub const NOON_WINDOW: RangeInclusive<u32> = 11..=13;

/// Picks one representative sample per calendar day from a dense
/// (3-hourly) series.
///
/// Dates come from each sample's local timestamp. The first sample inside
/// [`NOON_WINDOW`] represents its day; a day without one is represented by
/// its first sample. Output keeps scan order and stops at [`MAX_DAYS`]
/// distinct dates.
pub fn sample_daily(series: &[ForecastSample]) -> DailyForecast {
    // (date, index into series, inside noon window)
    let mut picks: Vec<(NaiveDate, usize, bool)> = Vec::with_capacity(MAX_DAYS);

    for (index, sample) in series.iter().enumerate() {
        let date = sample.timestamp.date_naive();
        let at_noon = NOON_WINDOW.contains(&sample.timestamp.hour());

        match picks.iter_mut().find(|(d, _, _)| *d == date) {
            Some(pick) => {
                if at_noon && !pick.2 {
                    *pick = (date, index, true);
                }
            }
            None => {
                if picks.len() == MAX_DAYS {
                    break;
                }
                picks.push((date, index, at_noon));
            }
        }
    }

    picks.into_iter().map(|(_, index, _)| series[index].clone()).collect()
}

/// Days 1 through 4 of a provider-aggregated daily series, skipping today.
pub fn skip_today(series: &[ForecastSample]) -> DailyForecast {
    series.iter().skip(1).take(4).cloned().collect()
}
