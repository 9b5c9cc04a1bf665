use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Booking, BookingStatus, Client};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub today_bookings: usize,
    pub today_revenue_cents: i64,
    pub month_bookings: usize,
    pub month_revenue_cents: i64,
    pub year_revenue_cents: i64,
    pub total_clients: usize,
}

pub fn dashboard(bookings: &[Booking], total_clients: usize, today: NaiveDate) -> DashboardStats {
    let active = || bookings.iter().filter(|b| b.is_active());

    let today_list: Vec<&Booking> = active().filter(|b| b.date == today).collect();
    let month_list: Vec<&Booking> = active()
        .filter(|b| b.date.year() == today.year() && b.date.month() == today.month())
        .collect();
    let year_revenue_cents: i64 = active()
        .filter(|b| b.date.year() == today.year())
        .map(|b| b.price_cents)
        .sum();

    DashboardStats {
        today_bookings: today_list.len(),
        today_revenue_cents: today_list.iter().map(|b| b.price_cents).sum(),
        month_bookings: month_list.len(),
        month_revenue_cents: month_list.iter().map(|b| b.price_cents).sum(),
        year_revenue_cents,
        total_clients,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopClient {
    pub user_id: String,
    pub name: String,
    pub visits: usize,
    pub total_spent_cents: i64,
}

pub fn top_clients(bookings: &[Booking], clients: &[Client], limit: usize) -> Vec<TopClient> {
    let mut totals: HashMap<&str, (usize, i64)> = HashMap::new();
    for booking in bookings.iter().filter(|b| b.is_active()) {
        let entry = totals.entry(booking.user_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += booking.price_cents;
    }

    let mut ranked: Vec<TopClient> = totals
        .into_iter()
        .map(|(user_id, (visits, total_spent_cents))| TopClient {
            user_id: user_id.to_string(),
            name: clients
                .iter()
                .find(|c| c.id == user_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown client".to_string()),
            visits,
            total_spent_cents,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_spent_cents
            .cmp(&a.total_spent_cents)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Most recently created first, optionally restricted to one status.
pub fn recent_bookings(bookings: &[Booking], status: Option<BookingStatus>, limit: usize) -> Vec<Booking> {
    let mut list: Vec<Booking> = bookings
        .iter()
        .filter(|b| status.map(|s| b.status == s).unwrap_or(true))
        .cloned()
        .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list.truncate(limit);
    list
}
