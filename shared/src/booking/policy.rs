//! Booking policy: every tunable rule of the reservation flow in one place

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use super::slot::{Slot, SlotError, parse_date, parse_time};

pub const DEFAULT_MAX_TABLES: u32 = 5;
pub const DEFAULT_NOTIFY_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_CANCELLATION_MIN_DAYS: i64 = 5;
pub const DEFAULT_MIN_GUESTS: i32 = 2;
pub const DEFAULT_SLOT_TIMES: [&str; 6] = ["17:00", "17:30", "18:00", "18:30", "19:00", "19:30"];

/// Capacity, windows and the bookable calendar.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Confirmed reservations allowed per slot
    pub max_tables: u32,
    /// How long a promoted waitlist entry has to book
    pub notify_window: Duration,
    /// Self-service cancellation requires at least this many days left
    pub cancellation_min_days: i64,
    /// Smallest party accepted
    pub min_guests: i32,
    /// Bookable dates; empty means any date
    pub event_dates: Vec<NaiveDate>,
    /// Bookable start times
    pub slot_times: Vec<NaiveTime>,
    /// Restaurant local offset, used for calendar-day arithmetic
    pub utc_offset: FixedOffset,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_tables: DEFAULT_MAX_TABLES,
            notify_window: Duration::hours(DEFAULT_NOTIFY_WINDOW_HOURS),
            cancellation_min_days: DEFAULT_CANCELLATION_MIN_DAYS,
            min_guests: DEFAULT_MIN_GUESTS,
            event_dates: Vec::new(),
            slot_times: DEFAULT_SLOT_TIMES
                .iter()
                .filter_map(|t| parse_time(t).ok())
                .collect(),
            utc_offset: Utc.fix(),
        }
    }
}

impl BookingPolicy {
    /// Parse a slot and check it against the bookable calendar.
    pub fn offered_slot(&self, date: &str, time: &str) -> Result<Slot, SlotError> {
        let slot = Slot::parse(date, time)?;
        if !self.event_dates.is_empty() && !self.event_dates.contains(&slot.date) {
            return Err(SlotError::DateNotOffered(slot.date));
        }
        if !self.slot_times.contains(&slot.time) {
            return Err(SlotError::TimeNotOffered(time.trim().to_string()));
        }
        Ok(slot)
    }

    /// Today's date in restaurant local time.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset).date_naive()
    }

    /// Whole calendar days from today until `date` (negative once past).
    pub fn days_until(&self, date: NaiveDate, now: DateTime<Utc>) -> i64 {
        (date - self.today(now)).num_days()
    }

    /// Self-service cancellation check for a reservation on `date`.
    pub fn cancellation_check(&self, date: NaiveDate, now: DateTime<Utc>) -> CancellationCheck {
        let days_until = self.days_until(date, now);
        CancellationCheck {
            days_until,
            can_cancel: days_until >= self.cancellation_min_days,
        }
    }

    /// `expires_at` for an entry notified at `notified_at_ms`.
    pub fn notify_deadline(&self, notified_at_ms: i64) -> i64 {
        notified_at_ms + self.notify_window.num_milliseconds()
    }

    /// Parse a comma-separated list of dates (`EVENT_DATES`).
    pub fn parse_dates(raw: &str) -> Result<Vec<NaiveDate>, SlotError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .collect()
    }

    /// Parse a comma-separated list of times (`SLOT_TIMES`).
    pub fn parse_times(raw: &str) -> Result<Vec<NaiveTime>, SlotError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_time)
            .collect()
    }
}

/// Outcome of the cancellation window check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationCheck {
    pub days_until: i64,
    pub can_cancel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_policy_matches_house_rules() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.max_tables, 5);
        assert_eq!(policy.notify_window, Duration::hours(24));
        assert_eq!(policy.cancellation_min_days, 5);
        assert_eq!(policy.slot_times.len(), 6);
    }

    #[test]
    fn offered_slot_checks_calendar() {
        let policy = BookingPolicy {
            event_dates: vec![date(2025, 12, 24), date(2025, 12, 25)],
            ..Default::default()
        };
        assert!(policy.offered_slot("2025-12-24", "18:30").is_ok());
        assert_eq!(
            policy.offered_slot("2025-12-26", "18:30"),
            Err(SlotError::DateNotOffered(date(2025, 12, 26)))
        );
        assert_eq!(
            policy.offered_slot("2025-12-24", "18:45"),
            Err(SlotError::TimeNotOffered("18:45".into()))
        );
    }

    #[test]
    fn empty_event_dates_accept_any_date() {
        let policy = BookingPolicy::default();
        assert!(policy.offered_slot("2031-02-03", "17:00").is_ok());
    }

    #[test]
    fn cancellation_window_boundary() {
        let policy = BookingPolicy::default();
        let reservation = date(2025, 12, 24);

        let five_days = policy.cancellation_check(reservation, at(2025, 12, 19, 23));
        assert_eq!(five_days.days_until, 5);
        assert!(five_days.can_cancel);

        let four_days = policy.cancellation_check(reservation, at(2025, 12, 20, 0));
        assert_eq!(four_days.days_until, 4);
        assert!(!four_days.can_cancel);

        let past = policy.cancellation_check(reservation, at(2025, 12, 30, 12));
        assert!(past.days_until < 0);
        assert!(!past.can_cancel);
    }

    #[test]
    fn days_until_uses_local_offset() {
        let policy = BookingPolicy {
            utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
            ..Default::default()
        };
        // 2025-12-18 20:00 UTC is already 2025-12-19 in UTC+9
        assert_eq!(policy.days_until(date(2025, 12, 24), at(2025, 12, 18, 20)), 5);
        assert_eq!(
            BookingPolicy::default().days_until(date(2025, 12, 24), at(2025, 12, 18, 20)),
            6
        );
    }

    #[test]
    fn notify_deadline_adds_window() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.notify_deadline(1_000), 1_000 + 24 * 3_600_000);
    }

    #[test]
    fn parses_env_lists() {
        let dates = BookingPolicy::parse_dates("2025-12-24, 2025-12-25,").unwrap();
        assert_eq!(dates, vec![date(2025, 12, 24), date(2025, 12, 25)]);
        let times = BookingPolicy::parse_times("18:00,18:30").unwrap();
        assert_eq!(times.len(), 2);
        assert!(BookingPolicy::parse_times("18:00,late").is_err());
    }
}
