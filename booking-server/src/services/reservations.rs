//! Reservation creation, self-service cancellation and lookup, dashboard edits

use serde::Serialize;
use shared::booking::SlotAvailability;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    NewReservation, PaymentStatus, Reservation, ReservationFilter, ReservationStatus,
    ReservationUpdate, WaitlistEntry,
};

use super::{
    AdminBookingRequest, BookingRequest, BookingService, CancelRequest, IdRequest, ListQuery,
    PhoneQuery, ReservationUpdateRequest, parse_filter, text,
};
use crate::db::Booked;
use crate::error::ServiceResult;
use crate::validation::{present, require_fields, validate_phone};

/// Reservation plus its cancellation window, for customer lookups
///
/// Stored columns keep their snake_case names; the computed flags use the
/// same camelCase keys as the cancellation error details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub can_cancel: bool,
    pub days_until: i64,
}

/// Outcome of a successful self-service cancellation
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub reservation: Reservation,
    pub days_until: i64,
    /// Waitlist entry notified for the freed table, if any
    pub promoted: Option<WaitlistEntry>,
}

fn slot_full(availability: SlotAvailability) -> AppError {
    AppError::new(ErrorCode::SlotFull)
        .with_detail("available", false)
        .with_detail("currentReservations", availability.current_reservations)
        .with_detail("maxTables", availability.max_tables)
        .with_detail("remainingTables", availability.remaining_tables)
        .with_detail("waitlistAvailable", true)
}

fn reservation_not_found() -> AppError {
    AppError::new(ErrorCode::ReservationNotFound)
}

impl BookingService {
    /// Book a table; fails with `SlotFull` (`available: false`) at capacity.
    pub async fn create_reservation(&self, req: BookingRequest) -> ServiceResult<Reservation> {
        self.book(&req, PaymentStatus::Pending).await
    }

    /// Dashboard booking. Deposit defaults to `approved`; capacity still applies.
    pub async fn admin_add_reservation(
        &self,
        req: AdminBookingRequest,
    ) -> ServiceResult<Reservation> {
        let payment = req.payment_status.unwrap_or(PaymentStatus::Approved);
        self.book(&req.booking, payment).await
    }

    async fn book(&self, req: &BookingRequest, payment: PaymentStatus) -> ServiceResult<Reservation> {
        let fields = self.validate_booking(req)?;
        let slot = fields.slot;
        let new = NewReservation {
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            slot,
            guests: fields.guests,
            special_requests: fields.requests,
            payment_status: payment,
        };

        match self
            .store
            .insert_reservation(new, self.policy.max_tables, self.now_millis())
            .await?
        {
            Booked::Done(reservation) => {
                tracing::info!(
                    id = reservation.id,
                    slot = %slot,
                    guests = reservation.guests,
                    "Reservation confirmed"
                );
                self.convert_waitlist_best_effort(slot, &reservation.phone)
                    .await;
                Ok(reservation)
            }
            Booked::Full(availability) => {
                tracing::info!(slot = %slot, "Reservation refused, slot is full");
                Err(slot_full(availability).into())
            }
        }
    }

    /// Cancel by id + phone. Needs at least `cancellation_min_days` to go;
    /// frees the table for the head of the slot's waitlist.
    pub async fn cancel_my_reservation(&self, req: CancelRequest) -> ServiceResult<Cancellation> {
        require_fields(&[
            ("reservationId", req.reservation_id.is_some()),
            ("phone", present(&req.phone)),
        ])?;
        let id = req.reservation_id.unwrap_or_default();
        let phone = validate_phone(text(&req.phone))?;

        // A phone mismatch reads as not found so ids cannot be probed
        let reservation = self
            .store
            .find_reservation(id)
            .await?
            .filter(|r| r.phone == phone)
            .ok_or_else(reservation_not_found)?;

        if !reservation.is_confirmed() {
            return Err(AppError::new(ErrorCode::ReservationAlreadyCancelled).into());
        }

        let check = self
            .policy
            .cancellation_check(reservation.reservation_date, self.now());
        if !check.can_cancel {
            tracing::info!(
                id,
                days_until = check.days_until,
                "Cancellation refused, inside the window"
            );
            return Err(AppError::with_message(
                ErrorCode::CancellationWindowClosed,
                format!(
                    "Reservations can only be cancelled at least {} days in advance",
                    self.policy.cancellation_min_days
                ),
            )
            .with_detail("canCancel", false)
            .with_detail("daysUntil", check.days_until)
            .into());
        }

        let cancelled = self
            .store
            .cancel_reservation(id, self.now_millis())
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ReservationAlreadyCancelled))?;
        tracing::info!(id, slot = %cancelled.slot(), "Reservation cancelled by customer");

        let promoted = self.promote_best_effort(cancelled.slot()).await;

        Ok(Cancellation {
            reservation: cancelled,
            days_until: check.days_until,
            promoted,
        })
    }

    /// Every reservation held by a phone, with its cancellation window.
    pub async fn my_reservations(&self, req: PhoneQuery) -> ServiceResult<Vec<ReservationView>> {
        require_fields(&[("phone", present(&req.phone))])?;
        let phone = validate_phone(text(&req.phone))?;
        let now = self.now();

        let reservations = self.store.reservations_by_phone(&phone).await?;
        Ok(reservations
            .into_iter()
            .map(|reservation| {
                let check = self
                    .policy
                    .cancellation_check(reservation.reservation_date, now);
                ReservationView {
                    can_cancel: reservation.is_confirmed() && check.can_cancel,
                    days_until: check.days_until,
                    reservation,
                }
            })
            .collect())
    }

    // ── Dashboard ───────────────────────────────────────────────────

    pub async fn list_reservations(&self, query: ListQuery) -> ServiceResult<Vec<Reservation>> {
        let filter = ReservationFilter {
            date: parse_filter(&query.date, shared::booking::slot::parse_date)?,
            time: parse_filter(&query.time, shared::booking::slot::parse_time)?,
            status: parse_filter(&query.status, str::parse::<ReservationStatus>)?,
        };
        let mut reservations = self.store.list_reservations(&filter).await?;
        if let Some(phone) = query.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            let phone = shared::booking::normalize_phone(phone);
            reservations.retain(|r| r.phone == phone);
        }
        Ok(reservations)
    }

    /// Status / deposit edit. Re-confirming is capacity-checked; cancelling
    /// promotes the slot's waitlist.
    pub async fn admin_update_reservation(
        &self,
        req: ReservationUpdateRequest,
    ) -> ServiceResult<Reservation> {
        require_fields(&[("id", req.id.is_some())])?;
        let id = req.id.unwrap_or_default();
        let update = ReservationUpdate {
            status: req.status,
            payment_status: req.payment_status,
        };
        if update.is_empty() {
            return Err(AppError::validation("Nothing to update: send status or paymentStatus").into());
        }

        let before = self
            .store
            .find_reservation(id)
            .await?
            .ok_or_else(reservation_not_found)?;

        let updated = match self
            .store
            .update_reservation(id, &update, self.policy.max_tables, self.now_millis())
            .await?
        {
            Some(Booked::Done(r)) => r,
            Some(Booked::Full(availability)) => return Err(slot_full(availability).into()),
            None => return Err(reservation_not_found().into()),
        };
        tracing::info!(
            id,
            status = updated.status.as_str(),
            payment_status = updated.payment_status.as_str(),
            "Reservation updated by admin"
        );

        if before.is_confirmed() && !updated.is_confirmed() {
            self.promote_best_effort(updated.slot()).await;
        }
        Ok(updated)
    }

    /// Hard delete. Removing a confirmed reservation promotes the waitlist.
    pub async fn admin_delete_reservation(&self, req: IdRequest) -> ServiceResult<Reservation> {
        require_fields(&[("id", req.id.is_some())])?;
        let id = req.id.unwrap_or_default();
        let deleted = self
            .store
            .delete_reservation(id)
            .await?
            .ok_or_else(reservation_not_found)?;
        tracing::info!(id, slot = %deleted.slot(), "Reservation deleted by admin");

        if deleted.is_confirmed() {
            self.promote_best_effort(deleted.slot()).await;
        }
        Ok(deleted)
    }
}
