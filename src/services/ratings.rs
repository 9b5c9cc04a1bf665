use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::collections::{self, Collection, StoreError};
use crate::models::{BookingStatus, Rating};
use crate::services::clock::Clock;
use crate::services::loyalty;

/// Points credited the first time a client rates a booking.
pub const RATING_BONUS_POINTS: i64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("booking not found")]
    NotFound,

    #[error("only past, confirmed or completed appointments can be rated")]
    NotRateable,

    #[error("score must be between 1 and 5")]
    InvalidScore,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingReceipt {
    pub rating: Rating,
    pub bonus_points: i64,
}

pub fn submit_rating(
    conn: &mut Connection,
    clock: &dyn Clock,
    user_id: &str,
    booking_id: &str,
    score: u8,
    comment: Option<String>,
) -> Result<RatingReceipt, RatingError> {
    if !(1..=5).contains(&score) {
        return Err(RatingError::InvalidScore);
    }

    let now = clock.now();
    let tx = collections::begin_immediate(conn)?;

    let bookings = collections::bookings(&tx)?;
    let booking = bookings
        .items
        .iter()
        .find(|b| b.id == booking_id && b.user_id == user_id)
        .ok_or(RatingError::NotFound)?;

    if !is_rateable(booking.status, booking.starts_at(), now) {
        return Err(RatingError::NotRateable);
    }

    let rating = Rating {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking.id.clone(),
        user_id: user_id.to_string(),
        service_name: booking.service_name.clone(),
        score,
        comment: comment.filter(|c| !c.trim().is_empty()),
        rated_at: now,
    };

    let mut ratings = collections::ratings(&tx)?;
    let first_rating = match ratings
        .items
        .iter_mut()
        .find(|r| r.booking_id == booking_id && r.user_id == user_id)
    {
        Some(existing) => {
            let id = existing.id.clone();
            *existing = Rating { id, ..rating.clone() };
            false
        }
        None => {
            ratings.items.push(rating.clone());
            true
        }
    };
    let stored = ratings
        .items
        .iter()
        .find(|r| r.booking_id == booking_id && r.user_id == user_id)
        .cloned()
        .unwrap_or(rating);
    collections::replace(&tx, Collection::Ratings, ratings.version, &ratings.items)?;

    let bonus_points = if first_rating { RATING_BONUS_POINTS } else { 0 };
    if first_rating {
        let visits = loyalty::total_visits(&bookings.items, user_id);
        let mut stats = collections::stats(&tx)?;
        loyalty::award_points(&mut stats.items, user_id, bonus_points, visits);
        collections::replace(&tx, Collection::Stats, stats.version, &stats.items)?;
    }

    tx.commit().map_err(StoreError::from)?;

    tracing::info!(user_id, booking_id, score, first_rating, "booking rated");
    Ok(RatingReceipt {
        rating: stored,
        bonus_points,
    })
}

fn is_rateable(status: BookingStatus, starts_at: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    matches!(status, BookingStatus::Confirmed | BookingStatus::Completed)
        && starts_at.map(|t| t < now).unwrap_or(false)
}

pub fn ratings_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Rating>, StoreError> {
    Ok(collections::ratings(conn)?
        .items
        .into_iter()
        .filter(|r| r.user_id == user_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Catalog;
    use crate::services::clock::FixedClock;
    use crate::services::scheduling::{self, BookingRequest};
    use chrono::NaiveDate;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn book(conn: &mut Connection, clock: &FixedClock, user_id: &str, day: &str) -> String {
        scheduling::request_booking(
            conn,
            &Catalog::salon_default(),
            clock,
            BookingRequest {
                user_id: user_id.to_string(),
                service_id: 1,
                date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
                time: "10:00".to_string(),
                notes: None,
            },
        )
        .unwrap()
        .id
    }

    fn points(conn: &Connection, user_id: &str) -> i64 {
        collections::stats(conn).unwrap().items[user_id].loyalty_points
    }

    #[test]
    fn test_first_rating_earns_bonus_once() {
        let mut conn = db::init_db(":memory:").unwrap();
        let clock = FixedClock::new(at("2025-06-10 09:00"));
        let id = book(&mut conn, &clock, "ana", "2025-06-16");
        assert_eq!(points(&conn, "ana"), 2);

        clock.set(at("2025-06-16 12:00"));
        let receipt = submit_rating(&mut conn, &clock, "ana", &id, 5, Some("Perfeito".to_string())).unwrap();
        assert_eq!(receipt.bonus_points, RATING_BONUS_POINTS);
        assert_eq!(points(&conn, "ana"), 7);

        let again = submit_rating(&mut conn, &clock, "ana", &id, 3, None).unwrap();
        assert_eq!(again.bonus_points, 0);
        assert_eq!(again.rating.id, receipt.rating.id);
        assert_eq!(points(&conn, "ana"), 7);

        let ratings = ratings_for_user(&conn, "ana").unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].score, 3);
    }

    #[test]
    fn test_future_booking_cannot_be_rated() {
        let mut conn = db::init_db(":memory:").unwrap();
        let clock = FixedClock::new(at("2025-06-10 09:00"));
        let id = book(&mut conn, &clock, "ana", "2025-06-16");

        let err = submit_rating(&mut conn, &clock, "ana", &id, 4, None).unwrap_err();
        assert!(matches!(err, RatingError::NotRateable));
    }

    #[test]
    fn test_cancelled_booking_cannot_be_rated() {
        let mut conn = db::init_db(":memory:").unwrap();
        let clock = FixedClock::new(at("2025-06-10 09:00"));
        let id = book(&mut conn, &clock, "ana", "2025-06-16");
        scheduling::cancel_booking(&mut conn, &clock, "ana", &id).unwrap();

        clock.set(at("2025-06-20 09:00"));
        let err = submit_rating(&mut conn, &clock, "ana", &id, 4, None).unwrap_err();
        assert!(matches!(err, RatingError::NotRateable));
    }

    #[test]
    fn test_score_out_of_range() {
        let mut conn = db::init_db(":memory:").unwrap();
        let clock = FixedClock::new(at("2025-06-10 09:00"));
        for score in [0, 6] {
            let err = submit_rating(&mut conn, &clock, "ana", "whatever", score, None).unwrap_err();
            assert!(matches!(err, RatingError::InvalidScore));
        }
    }

    #[test]
    fn test_only_the_owner_can_rate() {
        let mut conn = db::init_db(":memory:").unwrap();
        let clock = FixedClock::new(at("2025-06-10 09:00"));
        let id = book(&mut conn, &clock, "ana", "2025-06-16");

        clock.set(at("2025-06-17 09:00"));
        let err = submit_rating(&mut conn, &clock, "bia", &id, 5, None).unwrap_err();
        assert!(matches!(err, RatingError::NotFound));
    }
}
