use cognita_types::{Achievement, AchievementCategory, Notification, Rarity, StudyStats};

struct AchievementDef {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: AchievementCategory,
    requirement: i32,
    rarity: Rarity,
}

const CATALOG: &[AchievementDef] = &[
    // Study streak
    AchievementDef {
        id: "first_streak",
        title: "First Steps",
        description: "Complete your first study session",
        category: AchievementCategory::Streak,
        requirement: 1,
        rarity: Rarity::Common,
    },
    AchievementDef {
        id: "week_warrior",
        title: "Week Warrior",
        description: "Maintain a 5-day study streak",
        category: AchievementCategory::Streak,
        requirement: 5,
        rarity: Rarity::Rare,
    },
    AchievementDef {
        id: "two_week_champion",
        title: "Two-Week Champion",
        description: "Achieve a 15-day study streak",
        category: AchievementCategory::Streak,
        requirement: 15,
        rarity: Rarity::Epic,
    },
    AchievementDef {
        id: "month_master",
        title: "Month Master",
        description: "Maintain a 30-day study streak",
        category: AchievementCategory::Streak,
        requirement: 30,
        rarity: Rarity::Legendary,
    },
    // Score
    AchievementDef {
        id: "perfectionist",
        title: "Perfectionist",
        description: "Achieve 100% on a quiz",
        category: AchievementCategory::Score,
        requirement: 100,
        rarity: Rarity::Legendary,
    },
    AchievementDef {
        id: "excellent_student",
        title: "Excellent Student",
        description: "Maintain 90% average score",
        category: AchievementCategory::Score,
        requirement: 90,
        rarity: Rarity::Epic,
    },
    AchievementDef {
        id: "good_student",
        title: "Good Student",
        description: "Maintain 80% average score",
        category: AchievementCategory::Score,
        requirement: 80,
        rarity: Rarity::Rare,
    },
    AchievementDef {
        id: "passing_grade",
        title: "Passing Grade",
        description: "Maintain 70% average score",
        category: AchievementCategory::Score,
        requirement: 70,
        rarity: Rarity::Common,
    },
    // Study volume
    AchievementDef {
        id: "getting_started",
        title: "Getting Started",
        description: "Create your first 10 flashcards",
        category: AchievementCategory::Study,
        requirement: 10,
        rarity: Rarity::Common,
    },
    AchievementDef {
        id: "knowledge_builder",
        title: "Knowledge Builder",
        description: "Create 50 flashcards",
        category: AchievementCategory::Study,
        requirement: 50,
        rarity: Rarity::Rare,
    },
    AchievementDef {
        id: "knowledge_master",
        title: "Knowledge Master",
        description: "Create 100 flashcards",
        category: AchievementCategory::Study,
        requirement: 100,
        rarity: Rarity::Epic,
    },
];

impl AchievementDef {
    fn evaluate(&self, stats: &StudyStats) -> Achievement {
        let current = match self.category {
            AchievementCategory::Streak => stats.streak_days,
            AchievementCategory::Score => stats.average_score,
            AchievementCategory::Study => stats.total_flashcards,
        };
        let progress = if self.requirement > 0 {
            (current as f64 / self.requirement as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Achievement {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: self.category,
            requirement: self.requirement,
            current,
            unlocked: current >= self.requirement,
            rarity: self.rarity,
            progress,
        }
    }
}

/// Every achievement, evaluated against `stats`
pub fn evaluate_achievements(stats: &StudyStats) -> Vec<Achievement> {
    CATALOG.iter().map(|def| def.evaluate(stats)).collect()
}

/// Achievements unlocked by `current` that `previous` had not unlocked
pub fn newly_unlocked(previous: &StudyStats, current: &StudyStats) -> Vec<Achievement> {
    CATALOG
        .iter()
        .filter(|def| !def.evaluate(previous).unlocked)
        .map(|def| def.evaluate(current))
        .filter(|achievement| achievement.unlocked)
        .collect()
}

pub fn unlock_notification(achievement: &Achievement) -> Notification {
    Notification::info(
        format!("{} Achievement Unlocked!", achievement.rarity.emoji()),
        format!("{}: {}", achievement.title, achievement.description),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_for_new_user_is_locked() {
        let achievements = evaluate_achievements(&StudyStats::default());
        assert_eq!(achievements.len(), 11);
        assert!(achievements.iter().all(|a| !a.unlocked));
        assert!(achievements.iter().all(|a| a.progress == 0.0));
    }

    #[test]
    fn test_progress_is_capped() {
        let stats = StudyStats {
            total_flashcards: 75,
            ..StudyStats::default()
        };
        let achievements = evaluate_achievements(&stats);
        let builder = achievements.iter().find(|a| a.id == "knowledge_builder").unwrap();
        assert!(builder.unlocked);
        assert_eq!(builder.progress, 100.0);

        let master = achievements.iter().find(|a| a.id == "knowledge_master").unwrap();
        assert!(!master.unlocked);
        assert_eq!(master.progress, 75.0);
    }

    #[test]
    fn test_newly_unlocked_only_reports_transitions() {
        let previous = StudyStats {
            streak_days: 4,
            average_score: 72,
            ..StudyStats::default()
        };
        let current = StudyStats {
            streak_days: 5,
            average_score: 81,
            ..StudyStats::default()
        };

        let ids: Vec<String> = newly_unlocked(&previous, &current)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["week_warrior", "good_student"]);
        assert!(newly_unlocked(&current, &current).is_empty());
    }

    #[test]
    fn test_unlock_notification_text() {
        let stats = StudyStats {
            streak_days: 30,
            ..StudyStats::default()
        };
        let month = evaluate_achievements(&stats)
            .into_iter()
            .find(|a| a.id == "month_master")
            .unwrap();
        let notification = unlock_notification(&month);
        assert_eq!(notification.title, "💎 Achievement Unlocked!");
        assert_eq!(
            notification.description,
            "Month Master: Maintain a 30-day study streak"
        );
        assert!(!notification.is_error());
    }
}
