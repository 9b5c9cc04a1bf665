use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub service_name: String,
    pub score: u8,
    pub comment: Option<String>,
    pub rated_at: NaiveDateTime,
}
