use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Rarity {
    #[serde(rename = "comum")]
    Comum,
    #[serde(rename = "raro")]
    Raro,
    #[serde(rename = "épico")]
    Epico,
    #[serde(rename = "lendário")]
    Lendario,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrizeSpec {
    pub name: String,
    pub rarity: Rarity,
    pub emoji: String,
}

/// A prize won in a draw. Records are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrizeRecord {
    pub id: String,
    pub user_id: String,
    pub prize: PrizeSpec,
    pub won_at: NaiveDateTime,
    pub used: bool,
}

pub fn default_prizes() -> Vec<PrizeSpec> {
    let prize = |name: &str, rarity, emoji: &str| PrizeSpec {
        name: name.to_string(),
        rarity,
        emoji: emoji.to_string(),
    };
    vec![
        prize("Desconto 50% próximo serviço", Rarity::Comum, "🎁"),
        prize("Manicure completa GRÁTIS", Rarity::Raro, "💅"),
        prize("Kit produtos premium", Rarity::Epico, "✨"),
        prize("Dia de SPA completo", Rarity::Lendario, "👑"),
    ]
}
