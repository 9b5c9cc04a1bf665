use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A salon client. Credentials live with the authentication layer, never here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl Client {
    pub fn is_birthday(&self, today: NaiveDate) -> bool {
        self.birth_date
            .map(|b| b.month() == today.month() && b.day() == today.day())
            .unwrap_or(false)
    }
}
