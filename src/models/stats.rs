use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserStats {
    pub loyalty_points: i64,
    pub total_visits: i64,
    pub last_draw_participation: Option<NaiveDateTime>,
    pub last_visit: Option<NaiveDateTime>,
    pub next_reward: Option<i64>,
}
