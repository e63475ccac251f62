//! Request bodies
//!
//! Every field is optional at the serde level so a missing field surfaces as
//! `RequiredField` naming it, instead of a generic body rejection. Numeric
//! fields also accept numeric strings, which is what HTML forms send.

use serde::{Deserialize, Deserializer};
use shared::models::{PaymentStatus, ReservationStatus};

/// `(date, time)` pair
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Customer booking form, shared by reservations and the waitlist
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub guests: Option<i32>,
    #[serde(alias = "special_requests", alias = "specialRequests")]
    pub requests: Option<String>,
}

/// Booking entered from the dashboard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingRequest {
    #[serde(flatten)]
    pub booking: BookingRequest,
    #[serde(alias = "payment_status")]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default, alias = "reservation_id", deserialize_with = "lenient_number")]
    pub reservation_id: Option<i64>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    pub id: Option<i64>,
}

/// Dashboard listing filter; every field narrows the result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdateRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    pub id: Option<i64>,
    pub status: Option<ReservationStatus>,
    #[serde(alias = "payment_status")]
    pub payment_status: Option<PaymentStatus>,
}

/// `id` plus any mutable waitlist field. `date`/`time` may be echoed back
/// but must match the entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistUpdateRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub guests: Option<i32>,
    #[serde(alias = "special_requests", alias = "specialRequests")]
    pub requests: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Accept `2`, `"2"`, `null` or an absent field.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + std::str::FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{s}'"))),
    }
}
