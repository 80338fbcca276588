use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::engine::dates::{count_recurring_period_days, count_weekday, inclusive_day_span};
use crate::models::{PrayerType, QadaError};

fn default_period_days() -> u32 {
    7
}

/// Which exclusions apply to which prayers. A religious-policy decision, so
/// it is supplied by configuration rather than hard-coded: the weekly
/// (jumu'ah) exclusion removes that weekday from a single prayer's count,
/// while the recurring period exclusion reduces every prayer equally.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionPolicy {
    pub jomaa_weekday: Weekday,
    pub jomaa_prayer: PrayerType,
    pub cycle_length_days: u32,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            jomaa_weekday: Weekday::Fri,
            jomaa_prayer: PrayerType::Dhuhr,
            cycle_length_days: 30,
        }
    }
}

/// One missed-prayer interval: an inclusive date range plus the per-prayer
/// totals derived from it at creation/edit time.
///
/// Serialized field names match the original progress document
/// (`missedStartDate`, `excludeJomaa`, `fajrCount`, ...), so stored and
/// exported JSON stays interchangeable with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QadaRange {
    pub missed_start_date: NaiveDate,
    pub missed_end_date: NaiveDate,
    #[serde(default)]
    pub exclude_jomaa: bool,
    #[serde(default)]
    pub exclude_period: bool,
    #[serde(default = "default_period_days")]
    pub period_days: u32,

    pub fajr_count: u32,
    pub dhuhr_count: u32,
    pub asr_count: u32,
    pub maghrib_count: u32,
    pub isha_count: u32,

    pub fajr_completed: u32,
    pub dhuhr_completed: u32,
    pub asr_completed: u32,
    pub maghrib_completed: u32,
    pub isha_completed: u32,
}

impl QadaRange {
    /// Derive a new range from its date span and exclusion flags.
    /// All completed counts start at 0. Rejects `end < start`.
    pub fn create(
        start: NaiveDate,
        end: NaiveDate,
        exclude_jomaa: bool,
        exclude_period: bool,
        period_days: u32,
        policy: &ExclusionPolicy,
    ) -> Result<Self, QadaError> {
        if end < start {
            return Err(QadaError::InvalidDateRange { start, end });
        }
        if exclude_period && !(1..=15).contains(&period_days) {
            return Err(QadaError::InvalidPeriodDays(period_days));
        }

        let days = inclusive_day_span(start, end);
        let period_excluded = if exclude_period {
            count_recurring_period_days(start, end, period_days, policy.cycle_length_days)
        } else {
            0
        };
        let base = days.saturating_sub(period_excluded);

        let mut range = Self {
            missed_start_date: start,
            missed_end_date: end,
            exclude_jomaa,
            exclude_period,
            period_days,
            fajr_count: base,
            dhuhr_count: base,
            asr_count: base,
            maghrib_count: base,
            isha_count: base,
            fajr_completed: 0,
            dhuhr_completed: 0,
            asr_completed: 0,
            maghrib_completed: 0,
            isha_completed: 0,
        };

        // The weekly exclusion reduces only the configured midday prayer.
        if exclude_jomaa {
            let fridays = count_weekday(start, end, policy.jomaa_weekday);
            let count = range.count(policy.jomaa_prayer).saturating_sub(fridays);
            range.set_count(policy.jomaa_prayer, count);
        }

        Ok(range)
    }

    /// Recompute this range for a new span/exclusions. Counts are derived
    /// exactly as in `create`; each completed count is then clamped to the
    /// new total, so an edit can only shrink completed work, never inflate it.
    pub fn edit(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        exclude_jomaa: bool,
        exclude_period: bool,
        period_days: u32,
        policy: &ExclusionPolicy,
    ) -> Result<Self, QadaError> {
        let mut next = Self::create(start, end, exclude_jomaa, exclude_period, period_days, policy)?;
        for prayer in PrayerType::all() {
            let clamped = self.completed(prayer).min(next.count(prayer));
            next.set_completed(prayer, clamped);
        }
        Ok(next)
    }

    pub fn count(&self, prayer: PrayerType) -> u32 {
        match prayer {
            PrayerType::Fajr => self.fajr_count,
            PrayerType::Dhuhr => self.dhuhr_count,
            PrayerType::Asr => self.asr_count,
            PrayerType::Maghrib => self.maghrib_count,
            PrayerType::Isha => self.isha_count,
        }
    }

    pub fn completed(&self, prayer: PrayerType) -> u32 {
        match prayer {
            PrayerType::Fajr => self.fajr_completed,
            PrayerType::Dhuhr => self.dhuhr_completed,
            PrayerType::Asr => self.asr_completed,
            PrayerType::Maghrib => self.maghrib_completed,
            PrayerType::Isha => self.isha_completed,
        }
    }

    /// Write a completed count, clamped to `[0, count]` so the per-range
    /// invariant `completed <= count` holds no matter the caller.
    pub fn set_completed(&mut self, prayer: PrayerType, value: u32) {
        let value = value.min(self.count(prayer));
        match prayer {
            PrayerType::Fajr => self.fajr_completed = value,
            PrayerType::Dhuhr => self.dhuhr_completed = value,
            PrayerType::Asr => self.asr_completed = value,
            PrayerType::Maghrib => self.maghrib_completed = value,
            PrayerType::Isha => self.isha_completed = value,
        }
    }

    /// Increment/decrement one prayer's completed count on this range alone,
    /// with the same clamping as `set_completed`.
    pub fn adjust_completed(&mut self, prayer: PrayerType, delta: i64) {
        let next = (self.completed(prayer) as i64 + delta).max(0) as u32;
        self.set_completed(prayer, next);
    }

    fn set_count(&mut self, prayer: PrayerType, value: u32) {
        match prayer {
            PrayerType::Fajr => self.fajr_count = value,
            PrayerType::Dhuhr => self.dhuhr_count = value,
            PrayerType::Asr => self.asr_count = value,
            PrayerType::Maghrib => self.maghrib_count = value,
            PrayerType::Isha => self.isha_count = value,
        }
    }

    pub fn day_span(&self) -> u32 {
        inclusive_day_span(self.missed_start_date, self.missed_end_date)
    }
}
