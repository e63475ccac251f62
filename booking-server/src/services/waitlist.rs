//! Waitlist registration, promotion, expiry and dashboard edits

use serde::Serialize;
use std::collections::HashMap;

use shared::booking::{Slot, normalize_phone, queue};
use shared::booking::slot::{parse_date, parse_time};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Enqueued, NewWaitlistEntry, Promotion, WaitlistEntry, WaitlistFilter, WaitlistStatus,
    WaitlistUpdate,
};

use super::{
    BookingRequest, BookingService, IdRequest, ListQuery, PhoneQuery, SlotQuery,
    WaitlistUpdateRequest, parse_filter, text,
};
use crate::db::WaitlistChange;
use crate::error::ServiceResult;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, present, require_fields, validate_email,
    validate_guests, validate_optional_text, validate_phone, validate_required_text,
};

/// Waitlist entry as the customer sees it; `peopleAhead` is camelCase like
/// the other computed flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistView {
    #[serde(flatten)]
    pub entry: WaitlistEntry,
    /// Waiting entries in the same slot with a lower position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_ahead: Option<usize>,
}

fn already_on_waitlist(existing: &WaitlistEntry) -> AppError {
    AppError::new(ErrorCode::AlreadyOnWaitlist)
        .with_detail("position", existing.position)
        .with_detail("status", existing.status.as_str())
}

fn entry_not_found() -> AppError {
    AppError::new(ErrorCode::WaitlistEntryNotFound)
}

fn parse_status(raw: &str) -> Result<WaitlistStatus, AppError> {
    raw.trim()
        .parse()
        .map_err(|e: shared::models::UnknownStatus| {
            AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
        })
}

impl BookingService {
    /// Join the slot queue. One active entry per phone and slot.
    pub async fn add_waitlist(&self, req: BookingRequest) -> ServiceResult<WaitlistEntry> {
        let fields = self.validate_booking(&req)?;
        let slot = fields.slot;
        let new = NewWaitlistEntry {
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            slot,
            guests: fields.guests,
            special_requests: fields.requests,
        };

        match self.store.enqueue_waitlist(new, self.now_millis()).await? {
            Enqueued::Added(entry) => {
                tracing::info!(
                    id = entry.id,
                    slot = %slot,
                    position = entry.position,
                    "Waitlist entry added"
                );
                Ok(entry)
            }
            Enqueued::Duplicate(existing) => Err(already_on_waitlist(&existing).into()),
        }
    }

    /// Explicit promotion pass for a slot (dashboard).
    pub async fn process_waitlist(&self, query: SlotQuery) -> ServiceResult<Promotion> {
        let slot = self.require_slot(&query.date, &query.time)?;
        self.promote(slot).await
    }

    /// Sweep lapsed notifications in the slot, then notify its head.
    async fn promote(&self, slot: Slot) -> ServiceResult<Promotion> {
        let now = self.now_millis();
        let expires_at = self.policy.notify_deadline(now);
        let promotion = self.store.promote_next(slot, now, expires_at).await?;

        if promotion.expired > 0 {
            tracing::info!(slot = %slot, expired = promotion.expired, "Lapsed waitlist notifications cancelled");
        }
        match &promotion.promoted {
            Some(entry) => tracing::info!(
                id = entry.id,
                slot = %slot,
                position = entry.position,
                expires_at,
                "Waitlist entry notified"
            ),
            None => tracing::debug!(slot = %slot, "No one waiting"),
        }
        Ok(promotion)
    }

    /// Promotion that never fails its caller; errors are logged.
    pub(super) async fn promote_best_effort(&self, slot: Slot) -> Option<WaitlistEntry> {
        match self.promote(slot).await {
            Ok(promotion) => promotion.promoted,
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Waitlist promotion failed");
                None
            }
        }
    }

    /// A notified customer who books the slot leaves the queue as `converted`.
    pub(super) async fn convert_waitlist_best_effort(&self, slot: Slot, phone: &str) {
        match self.store.convert_notified(slot, phone).await {
            Ok(Some(entry)) => {
                tracing::info!(id = entry.id, slot = %slot, "Waitlist entry converted")
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(slot = %slot, error = %e, "Waitlist conversion failed"),
        }
    }

    /// Cancel every lapsed notification, all slots.
    pub async fn sweep_expired(&self) -> ServiceResult<u64> {
        let expired = self.store.expire_notified(self.now_millis()).await?;
        if expired > 0 {
            tracing::info!(expired, "Expiry sweep cancelled lapsed notifications");
        }
        Ok(expired)
    }

    /// Entries registered under a phone; waiting ones carry `peopleAhead`.
    pub async fn my_waitlist(&self, req: PhoneQuery) -> ServiceResult<Vec<WaitlistView>> {
        require_fields(&[("phone", present(&req.phone))])?;
        let phone = validate_phone(text(&req.phone))?;

        let entries = self
            .store
            .list_waitlist(&WaitlistFilter {
                phone: Some(phone),
                ..Default::default()
            })
            .await?;

        let mut waiting_by_slot: HashMap<Slot, Vec<i32>> = HashMap::new();
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let people_ahead = if entry.status == WaitlistStatus::Waiting {
                let slot = entry.slot();
                if !waiting_by_slot.contains_key(&slot) {
                    let waiting = self
                        .store
                        .list_waitlist(&WaitlistFilter {
                            status: Some(WaitlistStatus::Waiting),
                            ..WaitlistFilter::for_slot(slot)
                        })
                        .await?;
                    waiting_by_slot.insert(slot, waiting.iter().map(|e| e.position).collect());
                }
                waiting_by_slot
                    .get(&slot)
                    .map(|positions| queue::people_ahead(positions.iter().copied(), entry.position))
            } else {
                None
            };
            views.push(WaitlistView {
                entry,
                people_ahead,
            });
        }
        Ok(views)
    }

    // ── Dashboard ───────────────────────────────────────────────────

    pub async fn list_waitlist(&self, query: ListQuery) -> ServiceResult<Vec<WaitlistEntry>> {
        let filter = WaitlistFilter {
            date: parse_filter(&query.date, parse_date)?,
            time: parse_filter(&query.time, parse_time)?,
            status: parse_filter(&query.status, parse_status)?,
            phone: query
                .phone
                .as_deref()
                .map(normalize_phone)
                .filter(|p| !p.is_empty()),
        };
        Ok(self.store.list_waitlist(&filter).await?)
    }

    /// Contact/party edits and status moves along the state machine.
    pub async fn update_waitlist(&self, req: WaitlistUpdateRequest) -> ServiceResult<WaitlistEntry> {
        require_fields(&[("id", req.id.is_some())])?;
        let id = req.id.unwrap_or_default();

        let update = WaitlistUpdate {
            name: req
                .name
                .as_deref()
                .map(|n| validate_required_text(n, "name", MAX_NAME_LEN))
                .transpose()?,
            phone: req.phone.as_deref().map(validate_phone).transpose()?,
            email: validate_email(req.email.as_deref())?,
            guests: req
                .guests
                .map(|g| validate_guests(g, self.policy.min_guests))
                .transpose()?,
            special_requests: validate_optional_text(
                req.requests.as_deref(),
                "requests",
                MAX_NOTE_LEN,
            )?,
            status: req.status.as_deref().map(parse_status).transpose()?,
        };
        if update.is_empty() {
            return Err(AppError::validation("Nothing to update").into());
        }

        let current = self
            .store
            .find_waitlist_entry(id)
            .await?
            .ok_or_else(entry_not_found)?;
        self.ensure_same_slot(&current, &req)?;

        let now = self.now_millis();
        let change = self
            .store
            .update_waitlist_entry(id, &update, now, self.policy.notify_deadline(now))
            .await?
            .ok_or_else(entry_not_found)?;

        match change {
            WaitlistChange::Updated(entry) => {
                tracing::info!(id, status = entry.status.as_str(), "Waitlist entry updated by admin");
                Ok(entry)
            }
            WaitlistChange::Rejected { from, to } => Err(AppError::with_message(
                ErrorCode::WaitlistInvalidTransition,
                format!(
                    "Cannot move a waitlist entry from {} to {}",
                    from.as_str(),
                    to.as_str()
                ),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str())
            .into()),
            WaitlistChange::Duplicate(existing) => {
                tracing::info!(id, clash = existing.id, "Waitlist phone change refused");
                Err(already_on_waitlist(&existing).into())
            }
        }
    }

    /// The slot is fixed at registration; echoed values must match.
    fn ensure_same_slot(
        &self,
        entry: &WaitlistEntry,
        req: &WaitlistUpdateRequest,
    ) -> Result<(), AppError> {
        let date = parse_filter(&req.date, parse_date)?;
        let time = parse_filter(&req.time, parse_time)?;
        let moved = date.is_some_and(|d| d != entry.reservation_date)
            || time.is_some_and(|t| t != entry.reservation_time);
        if moved {
            return Err(AppError::validation(
                "A waitlist entry cannot change slot; delete it and register again",
            ));
        }
        Ok(())
    }

    pub async fn delete_waitlist(&self, req: IdRequest) -> ServiceResult<()> {
        require_fields(&[("id", req.id.is_some())])?;
        let id = req.id.unwrap_or_default();
        if !self.store.delete_waitlist_entry(id).await? {
            return Err(entry_not_found().into());
        }
        tracing::info!(id, "Waitlist entry deleted by admin");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::clock::Clock;
    use chrono::Duration;
    use serde_json::json;

    async fn queue_of(service: &BookingService, n: usize) -> Vec<WaitlistEntry> {
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push(
                service
                    .add_waitlist(booking(&format!("0107777000{i}")))
                    .await
                    .unwrap(),
            );
        }
        entries
    }

    #[tokio::test]
    async fn nth_registration_gets_position_n() {
        let (service, _) = service();
        let entries = queue_of(&service, 4).await;
        let positions: Vec<i32> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        assert!(entries.iter().all(|e| e.status == WaitlistStatus::Waiting));
    }

    #[tokio::test]
    async fn duplicate_guard_until_entry_leaves_active_states() {
        let (service, _) = service();
        let first = service.add_waitlist(booking("010-7777-0000")).await.unwrap();

        let app: AppError = service
            .add_waitlist(booking("01077770000"))
            .await
            .unwrap_err()
            .into();
        assert_eq!(app.code, ErrorCode::AlreadyOnWaitlist);
        assert_eq!(app.detail("position"), Some(&json!(1)));

        // Still blocked while notified
        service.process_waitlist(slot_query()).await.unwrap();
        let notified = service.add_waitlist(booking("01077770000")).await.unwrap_err();
        assert_eq!(notified.code(), Some(ErrorCode::AlreadyOnWaitlist));

        service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(first.id),
                status: Some("cancelled".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let again = service.add_waitlist(booking("01077770000")).await.unwrap();
        assert_eq!(again.position, 1);
    }

    #[tokio::test]
    async fn same_phone_other_slot_is_fine() {
        let (service, _) = service();
        service.add_waitlist(booking("01077770000")).await.unwrap();
        let other = BookingRequest {
            time: Some("19:00".into()),
            ..booking("01077770000")
        };
        assert_eq!(service.add_waitlist(other).await.unwrap().position, 1);
    }

    #[tokio::test]
    async fn empty_queue_promotes_nobody() {
        let (service, _) = service();
        let p = service.process_waitlist(slot_query()).await.unwrap();
        assert!(p.promoted.is_none());
        assert_eq!(p.expired, 0);
    }

    #[tokio::test]
    async fn promotes_lowest_position_with_deadline() {
        let (service, clock) = service();
        let entries = queue_of(&service, 3).await;

        let p = service.process_waitlist(slot_query()).await.unwrap();
        let promoted = p.promoted.unwrap();
        assert_eq!(promoted.id, entries[0].id);
        let now = clock.now_millis();
        assert_eq!(promoted.notified_at, Some(now));
        assert_eq!(
            promoted.expires_at,
            Some(now + Duration::hours(24).num_milliseconds())
        );

        let rest = service
            .list_waitlist(ListQuery {
                status: Some("waiting".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn lapsed_notification_is_swept_on_next_promotion() {
        let (service, clock) = service();
        let entries = queue_of(&service, 2).await;
        service.process_waitlist(slot_query()).await.unwrap();

        clock.advance(Duration::hours(23));
        let early = service.process_waitlist(slot_query()).await.unwrap();
        assert_eq!(early.expired, 0);
        // the second pass notified the next entry as well
        assert_eq!(early.promoted.unwrap().id, entries[1].id);

        clock.advance(Duration::hours(1));
        let late = service.process_waitlist(slot_query()).await.unwrap();
        assert_eq!(late.expired, 1);
        assert!(late.promoted.is_none());

        let first = service
            .store()
            .find_waitlist_entry(entries[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, WaitlistStatus::Cancelled);
    }

    #[tokio::test]
    async fn background_sweep_covers_all_slots() {
        let (service, clock) = service();
        queue_of(&service, 1).await;
        let other = BookingRequest {
            time: Some("17:00".into()),
            ..booking("01088880000")
        };
        service.add_waitlist(other).await.unwrap();
        service.process_waitlist(slot_query()).await.unwrap();
        service
            .process_waitlist(SlotQuery {
                date: Some("2025-12-24".into()),
                time: Some("17:00".into()),
            })
            .await
            .unwrap();

        assert_eq!(service.sweep_expired().await.unwrap(), 0);
        clock.advance(Duration::hours(24));
        assert_eq!(service.sweep_expired().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn positions_stay_stable_after_promotion() {
        let (service, _) = service();
        queue_of(&service, 3).await;
        service.process_waitlist(slot_query()).await.unwrap();

        let late = service.add_waitlist(booking("01099990000")).await.unwrap();
        assert_eq!(late.position, 4);

        let views = service
            .my_waitlist(PhoneQuery {
                phone: Some("010-9999-0000".into()),
            })
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].people_ahead, Some(2));
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["peopleAhead"], json!(2));
        assert_eq!(json["position"], json!(4));
    }

    #[tokio::test]
    async fn notified_entries_have_no_people_ahead() {
        let (service, _) = service();
        queue_of(&service, 1).await;
        service.process_waitlist(slot_query()).await.unwrap();
        let views = service
            .my_waitlist(PhoneQuery {
                phone: Some("01077770000".into()),
            })
            .await
            .unwrap();
        assert_eq!(views[0].entry.status, WaitlistStatus::Notified);
        assert!(views[0].people_ahead.is_none());
    }

    #[tokio::test]
    async fn update_enforces_state_machine() {
        let (service, _) = service();
        let entry = queue_of(&service, 1).await.remove(0);

        let bad = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                status: Some("converted".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(bad.code(), Some(ErrorCode::WaitlistInvalidTransition));

        let notified = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                status: Some("notified".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(notified.status, WaitlistStatus::Notified);
        assert!(notified.notified_at.is_some());
        assert!(notified.expires_at.is_some());

        let converted = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                status: Some("converted".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(converted.status, WaitlistStatus::Converted);

        let back = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                status: Some("waiting".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(back.code(), Some(ErrorCode::WaitlistInvalidTransition));
    }

    #[tokio::test]
    async fn update_edits_contact_but_not_slot() {
        let (service, _) = service();
        let entry = queue_of(&service, 1).await.remove(0);

        let edited = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                name: Some("Park Jisoo".into()),
                guests: Some(4),
                date: Some("2025-12-24".into()),
                time: Some("18:30".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(edited.name, "Park Jisoo");
        assert_eq!(edited.guests, 4);
        assert_eq!(edited.status, WaitlistStatus::Waiting);

        let moved = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id),
                name: Some("Park Jisoo".into()),
                time: Some("19:00".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(moved.code(), Some(ErrorCode::ValidationFailed));

        let missing = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(entry.id + 1),
                guests: Some(3),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Some(ErrorCode::WaitlistEntryNotFound));
    }

    #[tokio::test]
    async fn phone_change_cannot_duplicate_an_active_entry() {
        let (service, _) = service();
        let entries = queue_of(&service, 2).await;
        let (first, second) = (&entries[0], &entries[1]);

        let clash = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(second.id),
                phone: Some("010-7777-0000".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        let app: AppError = clash.into();
        assert_eq!(app.code, ErrorCode::AlreadyOnWaitlist);
        assert_eq!(app.detail("position"), Some(&json!(first.position)));
        assert_eq!(app.detail("status"), Some(&json!("waiting")));

        let active = service
            .store()
            .list_waitlist(&WaitlistFilter {
                phone: Some(first.phone.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        let unchanged = service.store().find_waitlist_entry(second.id).await.unwrap().unwrap();
        assert_eq!(unchanged.phone, second.phone);

        // Once the first entry is no longer active the phone is free
        service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(first.id),
                status: Some("cancelled".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let moved = service
            .update_waitlist(WaitlistUpdateRequest {
                id: Some(second.id),
                phone: Some(first.phone.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(moved.phone, first.phone);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (service, _) = service();
        let entry = queue_of(&service, 1).await.remove(0);
        service
            .delete_waitlist(IdRequest { id: Some(entry.id) })
            .await
            .unwrap();
        let again = service
            .delete_waitlist(IdRequest { id: Some(entry.id) })
            .await
            .unwrap_err();
        assert_eq!(again.code(), Some(ErrorCode::WaitlistEntryNotFound));
    }
}
