//! Availability checker

use shared::booking::SlotAvailability;

use super::{BookingService, SlotQuery};
use crate::error::ServiceResult;

impl BookingService {
    /// Advisory capacity report. Booking re-checks atomically.
    pub async fn check_availability(&self, query: &SlotQuery) -> ServiceResult<SlotAvailability> {
        let slot = self.require_slot(&query.date, &query.time)?;
        let confirmed = self.store.count_confirmed(slot).await?;
        Ok(SlotAvailability::from_count(confirmed, self.policy.max_tables))
    }
}
