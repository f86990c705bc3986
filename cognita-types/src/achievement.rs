use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AchievementCategory {
    Streak,
    Score,
    Study,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn emoji(&self) -> &'static str {
        match self {
            Rarity::Common => "🥉",
            Rarity::Rare => "🥈",
            Rarity::Epic => "🥇",
            Rarity::Legendary => "💎",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub requirement: i32,
    pub current: i32,
    pub unlocked: bool,
    pub rarity: Rarity,
    pub progress: f64, // 0-100
}
