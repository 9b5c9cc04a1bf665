use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::collections::{self, Collection, Snapshot, StoreError};
use crate::models::schedule::{self, SLOT_TIMES};
use crate::models::{Booking, BookingStatus, Catalog, Client, SlotAvailability};
use crate::services::automation::{self, AutomationEvent, NotificationOutcome};
use crate::services::clock::Clock;
use crate::services::loyalty;
use crate::state::AppState;

/// Why a booking request was turned down. These are expected outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    UnknownService,
    ClosedDay,
    InvalidSlot,
    SlotTaken,
    PastDate,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::UnknownService => "unknown_service",
            Rejection::ClosedDay => "closed_day",
            Rejection::InvalidSlot => "invalid_slot",
            Rejection::SlotTaken => "slot_taken",
            Rejection::PastDate => "past_date",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnknownService => write!(f, "That service is not on our menu."),
            Rejection::ClosedDay => write!(
                f,
                "We're closed that day. Opening hours: {}",
                schedule::OPENING_HOURS
            ),
            Rejection::InvalidSlot => write!(
                f,
                "Appointments start on the hour or half hour between {} and {}.",
                SLOT_TIMES[0],
                SLOT_TIMES[SLOT_TIMES.len() - 1]
            ),
            Rejection::SlotTaken => write!(
                f,
                "Sorry, that time slot is already booked. Could you pick a different time?"
            ),
            Rejection::PastDate => write!(f, "That appointment time has already passed."),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("{0}")]
    Rejected(Rejection),

    #[error("booking not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<Rejection> for SchedulingError {
    fn from(r: Rejection) -> Self {
        SchedulingError::Rejected(r)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub service_id: u32,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated booking waiting to be written, remembering which version of
/// the bookings collection it was validated against.
#[derive(Debug, Clone)]
pub struct PendingBooking {
    pub booking: Booking,
    pub validated_at_version: i64,
}

pub const BIRTHDAY_DISCOUNT_PERCENT: i64 = 10;

/// Catalog price less the birthday discount, rounded half-up to the cent.
pub fn birthday_price(price_cents: i64) -> i64 {
    (price_cents * (100 - BIRTHDAY_DISCOUNT_PERCENT) + 50).div_euclid(100)
}

/// One point per full 10.00 paid.
pub fn points_for(price_cents: i64) -> i64 {
    price_cents.max(0) / 1000
}

/// Day, slot and collision checks, in that order.
pub fn validate_slot(bookings: &[Booking], date: NaiveDate, time: &str) -> Result<(), Rejection> {
    if !schedule::is_open_day(date) {
        return Err(Rejection::ClosedDay);
    }
    if !schedule::is_valid_slot(time) {
        return Err(Rejection::InvalidSlot);
    }
    if bookings.iter().any(|b| b.occupies(date, time)) {
        return Err(Rejection::SlotTaken);
    }
    Ok(())
}

/// Validates a request against a snapshot of the bookings collection and
/// prices it. Touches nothing.
pub fn prepare_booking(
    snapshot: &Snapshot<Vec<Booking>>,
    catalog: &Catalog,
    client: Option<&Client>,
    request: BookingRequest,
    now: NaiveDateTime,
) -> Result<PendingBooking, Rejection> {
    let service = catalog
        .find(request.service_id)
        .ok_or(Rejection::UnknownService)?;

    validate_slot(&snapshot.items, request.date, &request.time)?;

    let birthday = client.map(|c| c.is_birthday(now.date())).unwrap_or(false);
    let price_cents = if birthday {
        birthday_price(service.price_cents)
    } else {
        service.price_cents
    };

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: request.user_id,
        service_id: service.id,
        service_name: service.name.clone(),
        duration_minutes: service.duration_minutes,
        price_cents,
        original_price_cents: service.price_cents,
        date: request.date,
        time: request.time,
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        status: BookingStatus::Confirmed,
        birthday_discount: birthday,
        created_at: now,
        updated_at: now,
    };

    if booking.starts_at().map(|t| t <= now).unwrap_or(true) {
        return Err(Rejection::PastDate);
    }

    Ok(PendingBooking {
        booking,
        validated_at_version: snapshot.version,
    })
}

/// Writes a prepared booking and credits its loyalty points in one immediate
/// transaction. If the bookings collection moved since the booking was
/// validated, the slot is checked again against what is there now.
pub fn commit_booking(conn: &mut Connection, pending: PendingBooking) -> Result<Booking, SchedulingError> {
    let booking = pending.booking;
    let tx = collections::begin_immediate(conn)?;

    let mut current = collections::bookings(&tx)?;
    if current.version != pending.validated_at_version {
        tracing::debug!(
            expected = pending.validated_at_version,
            found = current.version,
            "bookings changed since validation, re-checking slot"
        );
        if current.items.iter().any(|b| b.occupies(booking.date, &booking.time)) {
            tracing::info!(date = %booking.date, time = %booking.time, "slot taken by a concurrent booking");
            return Err(Rejection::SlotTaken.into());
        }
    }

    current.items.push(booking.clone());
    collections::replace(&tx, Collection::Bookings, current.version, &current.items)?;

    let visits = loyalty::total_visits(&current.items, &booking.user_id);
    let mut stats = collections::stats(&tx)?;
    let entry = loyalty::award_points(
        &mut stats.items,
        &booking.user_id,
        points_for(booking.price_cents),
        visits,
    );
    entry.last_visit = Some(booking.created_at);
    collections::replace(&tx, Collection::Stats, stats.version, &stats.items)?;

    tx.commit().map_err(StoreError::from)?;
    Ok(booking)
}

/// Validates and books against the collection as it is right now.
pub fn request_booking(
    conn: &mut Connection,
    catalog: &Catalog,
    clock: &dyn Clock,
    request: BookingRequest,
) -> Result<Booking, SchedulingError> {
    let now = clock.now();
    let client = collections::find_client(conn, &request.user_id)?;
    let snapshot = collections::bookings(conn)?;
    let pending = prepare_booking(&snapshot, catalog, client.as_ref(), request, now)?;
    commit_booking(conn, pending)
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub points_earned: i64,
    pub notification: NotificationOutcome,
}

/// Books, then hands the new booking to the automation gateway. The gateway's
/// outcome is reported but never undoes the booking.
pub async fn book(state: &Arc<AppState>, request: BookingRequest) -> Result<BookingReceipt, SchedulingError> {
    let (booking, customer, loyalty_points) = {
        let mut db = state.db();
        let booking = request_booking(&mut db, &state.catalog, state.clock.as_ref(), request)?;
        let customer = collections::find_client(&db, &booking.user_id)?;
        let points = collections::stats(&db)?
            .items
            .get(&booking.user_id)
            .map(|s| s.loyalty_points)
            .unwrap_or(0);
        (booking, customer, points)
    };

    tracing::info!(
        booking_id = %booking.id,
        user_id = %booking.user_id,
        date = %booking.date,
        time = %booking.time,
        price_cents = booking.price_cents,
        birthday_discount = booking.birthday_discount,
        "booking confirmed"
    );

    let event = AutomationEvent::NewBooking {
        booking: booking.clone(),
        customer,
        loyalty_points,
    };
    let notification =
        automation::dispatch(state.gateway.as_ref(), &event, state.config.automation_timeout()).await;

    Ok(BookingReceipt {
        points_earned: points_for(booking.price_cents),
        booking,
        notification,
    })
}

pub fn available_slots(bookings: &[Booking], date: NaiveDate) -> Vec<SlotAvailability> {
    let open = schedule::is_open_day(date);
    SLOT_TIMES
        .iter()
        .map(|&time| SlotAvailability {
            time,
            available: open && !bookings.iter().any(|b| b.occupies(date, time)),
        })
        .collect()
}

pub fn bookings_for_user(bookings: &[Booking], user_id: &str) -> Vec<Booking> {
    let mut mine: Vec<Booking> = bookings
        .iter()
        .filter(|b| b.user_id == user_id)
        .cloned()
        .collect();
    mine.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
    mine
}

/// The next `limit` appointments strictly after `now`, soonest first.
pub fn upcoming_for_user(bookings: &[Booking], user_id: &str, now: NaiveDateTime, limit: usize) -> Vec<Booking> {
    bookings_for_user(bookings, user_id)
        .into_iter()
        .filter(|b| b.is_active() && b.starts_at().map(|t| t > now).unwrap_or(false))
        .take(limit)
        .collect()
}

/// A client cancelling one of their own bookings. Points already earned stay.
/// The flag is false when the booking was already cancelled.
pub fn cancel_booking(
    conn: &mut Connection,
    clock: &dyn Clock,
    user_id: &str,
    booking_id: &str,
) -> Result<(Booking, bool), SchedulingError> {
    change_status(conn, clock, booking_id, Some(user_id), BookingStatus::Cancelled)
}

/// Admin status change. Bringing a cancelled booking back requires its slot
/// to still be free.
pub fn update_status(
    conn: &mut Connection,
    clock: &dyn Clock,
    booking_id: &str,
    status: BookingStatus,
) -> Result<Booking, SchedulingError> {
    change_status(conn, clock, booking_id, None, status).map(|(booking, _)| booking)
}

fn change_status(
    conn: &mut Connection,
    clock: &dyn Clock,
    booking_id: &str,
    owner: Option<&str>,
    status: BookingStatus,
) -> Result<(Booking, bool), SchedulingError> {
    let now = clock.now();
    let tx = collections::begin_immediate(conn)?;
    let mut bookings = collections::bookings(&tx)?;

    let idx = bookings
        .items
        .iter()
        .position(|b| b.id == booking_id && owner.map(|o| b.user_id == o).unwrap_or(true))
        .ok_or(SchedulingError::NotFound)?;

    let current = &bookings.items[idx];
    if current.status == status {
        return Ok((current.clone(), false));
    }

    if current.status == BookingStatus::Cancelled {
        let (date, time) = (current.date, current.time.clone());
        let clash = bookings
            .items
            .iter()
            .enumerate()
            .any(|(i, b)| i != idx && b.occupies(date, &time));
        if clash {
            return Err(Rejection::SlotTaken.into());
        }
    }

    let booking = &mut bookings.items[idx];
    let previous = booking.status;
    booking.status = status;
    booking.updated_at = now;
    let updated = booking.clone();

    collections::replace(&tx, Collection::Bookings, bookings.version, &bookings.items)?;

    let mut stats = collections::stats(&tx)?;
    if let Some(entry) = stats.items.get_mut(&updated.user_id) {
        loyalty::refresh_derived(entry, loyalty::total_visits(&bookings.items, &updated.user_id));
        collections::replace(&tx, Collection::Stats, stats.version, &stats.items)?;
    }

    tx.commit().map_err(StoreError::from)?;

    tracing::info!(
        booking_id,
        from = previous.as_str(),
        to = status.as_str(),
        "booking status changed"
    );
    Ok((updated, true))
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationReceipt {
    pub booking: Booking,
    /// `None` when the booking was already cancelled and nothing was sent.
    pub notification: Option<NotificationOutcome>,
}

pub async fn cancel(state: &Arc<AppState>, user_id: &str, booking_id: &str) -> Result<CancellationReceipt, SchedulingError> {
    let (booking, changed) = {
        let mut db = state.db();
        cancel_booking(&mut db, state.clock.as_ref(), user_id, booking_id)?
    };

    let notification = if changed {
        let event = AutomationEvent::BookingCancelled {
            booking: booking.clone(),
        };
        Some(automation::dispatch(state.gateway.as_ref(), &event, state.config.automation_timeout()).await)
    } else {
        tracing::debug!(booking_id, "booking already cancelled");
        None
    };

    Ok(CancellationReceipt {
        booking,
        notification,
    })
}
