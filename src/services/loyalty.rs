use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::collections::{self, Collection, StatsMap, StoreError};
use crate::models::{Booking, PrizeRecord, PrizeSpec, Rarity, UserStats};
use crate::services::automation::{self, AutomationEvent, NotificationOutcome};
use crate::services::clock::Clock;
use crate::services::random::RandomSource;
use crate::state::AppState;

const BASE_DRAW_CHANCE: f64 = 0.3;
const CHANCE_PER_VISIT: f64 = 0.1;
const MAX_DRAW_CHANCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Prata,
    Ouro,
    Diamante,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Prata, Tier::Ouro, Tier::Diamante];

    pub fn threshold(&self) -> i64 {
        match self {
            Tier::Bronze => 0,
            Tier::Prata => 100,
            Tier::Ouro => 250,
            Tier::Diamante => 500,
        }
    }

    pub fn benefits(&self) -> &'static [&'static str] {
        match self {
            Tier::Bronze => &["5% desconto em serviços"],
            Tier::Prata => &["10% desconto", "Agendamento prioritário"],
            Tier::Ouro => &["15% desconto", "Serviço premium grátis mensalmente"],
            Tier::Diamante => &["20% desconto", "Acesso a serviços VIP", "Brindes exclusivos"],
        }
    }

    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Prata),
            Tier::Prata => Some(Tier::Ouro),
            Tier::Ouro => Some(Tier::Diamante),
            Tier::Diamante => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierInfo {
    pub tier: Tier,
    pub benefits: Vec<&'static str>,
    pub next_threshold: Option<i64>,
}

pub fn compute_tier(points: i64) -> TierInfo {
    let tier = Tier::ALL
        .iter()
        .rev()
        .copied()
        .find(|t| points >= t.threshold())
        .unwrap_or(Tier::Bronze);

    TierInfo {
        tier,
        benefits: tier.benefits().to_vec(),
        next_threshold: tier.next().map(|t| t.threshold()),
    }
}

/// Progress bar fill for the current tier, in percent.
pub fn progress_percent(points: i64) -> f64 {
    match compute_tier(points).next_threshold {
        Some(next) => (points.rem_euclid(next) as f64 / next as f64) * 100.0,
        None => 100.0,
    }
}

/// Calendar months between two instants, ignoring the day of month.
pub fn months_between(from: NaiveDateTime, to: NaiveDateTime) -> i32 {
    (to.year() * 12 + to.month() as i32) - (from.year() * 12 + from.month() as i32)
}

pub fn can_draw(last_participation: Option<NaiveDateTime>, total_visits: i64, now: NaiveDateTime) -> bool {
    if total_visits < 1 {
        return false;
    }
    match last_participation {
        None => true,
        Some(last) => months_between(last, now) >= 1,
    }
}

pub fn draw_chance(total_visits: i64) -> f64 {
    (BASE_DRAW_CHANCE + CHANCE_PER_VISIT * total_visits.max(0) as f64).min(MAX_DRAW_CHANCE)
}

/// Whole-number percentage shown to clients.
pub fn draw_chance_percent(total_visits: i64) -> i64 {
    (30 + 10 * total_visits.max(0)).min(70)
}

pub fn pick_rarity(roll: f64) -> Rarity {
    if roll < 0.5 {
        Rarity::Comum
    } else if roll < 0.8 {
        Rarity::Raro
    } else if roll < 0.95 {
        Rarity::Epico
    } else {
        Rarity::Lendario
    }
}

/// Decides the outcome of one draw. Pure: persisting the participation is
/// the caller's job.
pub fn run_draw(total_visits: i64, rng: &dyn RandomSource, prizes: &[PrizeSpec]) -> Option<PrizeSpec> {
    if rng.next_f64() >= draw_chance(total_visits) {
        return None;
    }

    let rarity = pick_rarity(rng.next_f64());
    let candidates: Vec<&PrizeSpec> = prizes.iter().filter(|p| p.rarity == rarity).collect();

    let picked = match candidates.len() {
        0 => {
            tracing::warn!(?rarity, "no prize configured for rarity");
            return None;
        }
        1 => candidates[0],
        n => {
            let idx = ((rng.next_f64() * n as f64).floor() as usize).min(n - 1);
            candidates[idx]
        }
    };
    Some(picked.clone())
}

pub fn total_visits(bookings: &[Booking], user_id: &str) -> i64 {
    bookings
        .iter()
        .filter(|b| b.user_id == user_id && b.is_active())
        .count() as i64
}

/// Refreshes the derived fields of a stats record after points or visits changed.
pub fn refresh_derived(stats: &mut UserStats, total_visits: i64) {
    stats.total_visits = total_visits;
    stats.next_reward = compute_tier(stats.loyalty_points).next_threshold;
}

#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    #[error("already took part in this month's draw or has no visits yet")]
    NotEligible,

    #[error("prize not found")]
    PrizeNotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoyaltyStatus {
    pub user_id: String,
    pub points: i64,
    pub tier: Tier,
    pub benefits: Vec<&'static str>,
    pub next_threshold: Option<i64>,
    pub points_to_next: Option<i64>,
    pub progress_percent: f64,
    pub total_visits: i64,
    pub can_draw: bool,
    pub draw_chance_percent: i64,
    pub last_draw_participation: Option<NaiveDateTime>,
}

pub fn loyalty_status(conn: &Connection, now: NaiveDateTime, user_id: &str) -> Result<LoyaltyStatus, StoreError> {
    let bookings = collections::bookings(conn)?;
    let stats = collections::stats(conn)?;
    let user_stats = stats.items.get(user_id).cloned().unwrap_or_default();
    let visits = total_visits(&bookings.items, user_id);
    let points = user_stats.loyalty_points;
    let info = compute_tier(points);

    Ok(LoyaltyStatus {
        user_id: user_id.to_string(),
        points,
        tier: info.tier,
        benefits: info.benefits,
        next_threshold: info.next_threshold,
        points_to_next: info.next_threshold.map(|next| next - points),
        progress_percent: progress_percent(points),
        total_visits: visits,
        can_draw: can_draw(user_stats.last_draw_participation, visits, now),
        draw_chance_percent: draw_chance_percent(visits),
        last_draw_participation: user_stats.last_draw_participation,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    pub prize: Option<PrizeRecord>,
    pub participated_at: NaiveDateTime,
}

/// Enters the monthly draw. Consumes the month's eligibility whether or not
/// anything is won.
pub fn participate(
    conn: &mut Connection,
    clock: &dyn Clock,
    rng: &dyn RandomSource,
    prizes: &[PrizeSpec],
    user_id: &str,
) -> Result<DrawOutcome, LoyaltyError> {
    let now = clock.now();
    let tx = collections::begin_immediate(conn)?;

    let bookings = collections::bookings(&tx)?;
    let visits = total_visits(&bookings.items, user_id);

    let mut stats = collections::stats(&tx)?;
    let last = stats
        .items
        .get(user_id)
        .and_then(|s| s.last_draw_participation);
    if !can_draw(last, visits, now) {
        return Err(LoyaltyError::NotEligible);
    }

    let won = run_draw(visits, rng, prizes);

    let entry = stats.items.entry(user_id.to_string()).or_default();
    entry.last_draw_participation = Some(now);
    refresh_derived(entry, visits);
    collections::replace(&tx, Collection::Stats, stats.version, &stats.items)?;

    let record = won.map(|prize| PrizeRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        prize,
        won_at: now,
        used: false,
    });

    if let Some(record) = &record {
        let mut log = collections::prizes(&tx)?;
        log.items.push(record.clone());
        collections::replace(&tx, Collection::Prizes, log.version, &log.items)?;
    }

    tx.commit().map_err(StoreError::from)?;

    tracing::info!(
        user_id,
        visits,
        won = record.as_ref().map(|r| r.prize.name.as_str()),
        "draw completed"
    );

    Ok(DrawOutcome {
        prize: record,
        participated_at: now,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawReceipt {
    #[serde(flatten)]
    pub outcome: DrawOutcome,
    pub notification: Option<NotificationOutcome>,
}

/// Runs the draw and, on a win, tells the automation gateway about the reward.
pub async fn draw(state: &Arc<AppState>, user_id: &str) -> Result<DrawReceipt, LoyaltyError> {
    let outcome = {
        let mut db = state.db();
        participate(
            &mut db,
            state.clock.as_ref(),
            state.rng.as_ref(),
            &state.prizes,
            user_id,
        )?
    };

    let notification = match &outcome.prize {
        Some(record) => {
            let event = AutomationEvent::LoyaltyReward {
                user_id: user_id.to_string(),
                prize: record.prize.clone(),
            };
            Some(
                automation::dispatch(state.gateway.as_ref(), &event, state.config.automation_timeout())
                    .await,
            )
        }
        None => None,
    };

    Ok(DrawReceipt {
        outcome,
        notification,
    })
}

pub fn prizes_for_user(conn: &Connection, user_id: &str) -> Result<Vec<PrizeRecord>, StoreError> {
    let mut prizes: Vec<PrizeRecord> = collections::prizes(conn)?
        .items
        .into_iter()
        .filter(|p| p.user_id == user_id)
        .collect();
    prizes.sort_by(|a, b| b.won_at.cmp(&a.won_at));
    Ok(prizes)
}

pub fn mark_prize_used(conn: &mut Connection, prize_id: &str) -> Result<PrizeRecord, LoyaltyError> {
    collections::modify(conn, Collection::Prizes, |prizes: &mut Vec<PrizeRecord>| {
        let prize = prizes
            .iter_mut()
            .find(|p| p.id == prize_id)
            .ok_or(LoyaltyError::PrizeNotFound)?;
        prize.used = true;
        Ok(prize.clone())
    })
}

/// Admin correction of a client's balance. The balance never goes below zero.
pub fn adjust_points(conn: &mut Connection, user_id: &str, delta: i64) -> Result<UserStats, StoreError> {
    let tx = collections::begin_immediate(conn)?;
    let bookings = collections::bookings(&tx)?;
    let visits = total_visits(&bookings.items, user_id);

    let mut stats = collections::stats(&tx)?;
    let entry = stats.items.entry(user_id.to_string()).or_default();
    entry.loyalty_points = entry.loyalty_points.saturating_add(delta).max(0);
    refresh_derived(entry, visits);
    let updated = entry.clone();
    collections::replace(&tx, Collection::Stats, stats.version, &stats.items)?;
    tx.commit()?;

    tracing::info!(user_id, delta, points = updated.loyalty_points, "loyalty points adjusted");
    Ok(updated)
}

/// Adds earned points to a client's record inside an ongoing write, creating
/// the record on first use.
pub fn award_points<'a>(
    stats: &'a mut StatsMap,
    user_id: &str,
    points: i64,
    total_visits: i64,
) -> &'a mut UserStats {
    let entry = stats.entry(user_id.to_string()).or_default();
    entry.loyalty_points = entry.loyalty_points.saturating_add(points.max(0));
    refresh_derived(entry, total_visits);
    entry
}
