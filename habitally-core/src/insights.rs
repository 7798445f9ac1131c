//! Templated insight messages
//!
//! Insights are picked from a fixed menu of sentence templates; nothing is
//! learned or predicted. The random source is a parameter so callers (and
//! tests) control it.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use crate::types::InsightKind;

/// Per-habit numbers the selector looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitSnapshot {
    pub name: String,
    pub streak: u32,
    pub completion_rate: u32,
}

/// An insight ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightDraft {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    /// 0-100
    pub confidence: u8,
}

impl InsightDraft {
    fn new(kind: InsightKind, title: impl Into<String>, message: impl Into<String>, confidence: u8) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            confidence,
        }
    }
}

const TIPS: [&str; 5] = [
    "Try the 2-minute rule: If a habit takes less than 2 minutes, do it immediately.",
    "Visual cues can increase habit success by 30%. Place a visual reminder where you'll see it daily.",
    "Tracking your habits creates a visual proof of your progress, increasing motivation.",
    "Celebrate small wins to release dopamine and reinforce your habit loop.",
    "If you miss a day, don't break the chain twice. Getting back on track immediately is key to long-term success.",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The three insights every new user starts with.
pub fn welcome_insights() -> Vec<InsightDraft> {
    vec![
        InsightDraft::new(
            InsightKind::Motivation,
            "Welcome to Your Habit Ally!",
            "Starting new habits can increase your chances of long-term success by 80%. Begin with small, consistent actions!",
            95,
        ),
        InsightDraft::new(
            InsightKind::Tip,
            "Morning Routine Tip",
            "Research shows that habits formed in the morning have a 40% higher success rate. Try adding a new habit to your morning routine.",
            88,
        ),
        InsightDraft::new(
            InsightKind::Improvement,
            "Habit Stacking",
            "Link new habits to existing ones for better consistency. For example, meditate right after brushing your teeth.",
            92,
        ),
    ]
}

/// Pick one insight for a user's habits.
///
/// With no habits the answer is always the "Start Your First Habit" tip.
/// Otherwise one of the four kinds is chosen uniformly:
/// - motivation: the habit with the highest streak (first on ties)
/// - improvement: the habit with the lowest completion rate (first on ties)
/// - trend: a random habit with a random 10-30% "improvement"
/// - tip: one of five fixed tips
pub fn select_insight<R: Rng + ?Sized>(habits: &[HabitSnapshot], rng: &mut R) -> InsightDraft {
    if habits.is_empty() {
        return InsightDraft::new(
            InsightKind::Tip,
            "Start Your First Habit",
            "Creating your first habit is the most important step. Start with something small and achievable to build momentum.",
            90,
        );
    }

    let kind = InsightKind::ALL[rng.random_range(0..InsightKind::ALL.len())];
    tracing::debug!(kind = kind.as_str(), habits = habits.len(), "Selecting insight");

    match kind {
        InsightKind::Motivation => motivation(habits, rng),
        InsightKind::Improvement => improvement(habits, rng),
        InsightKind::Trend => trend(habits, rng),
        InsightKind::Tip => tip(rng),
    }
}

fn motivation<R: Rng + ?Sized>(habits: &[HabitSnapshot], rng: &mut R) -> InsightDraft {
    let confidence = rng.random_range(85..=95);
    let best = habits
        .iter()
        .reduce(|best, h| if h.streak > best.streak { h } else { best });

    match best {
        Some(habit) if habit.streak > 0 => InsightDraft::new(
            InsightKind::Motivation,
            format!("Great Progress on {}!", habit.name),
            format!(
                "You've maintained a {}-day streak on {}. This consistency is building strong neural pathways. Keep it up!",
                habit.streak, habit.name
            ),
            confidence,
        ),
        _ => InsightDraft::new(
            InsightKind::Motivation,
            "You Can Do This!",
            "Every habit master started as a beginner. Focus on consistency rather than perfection to build lasting habits.",
            confidence,
        ),
    }
}

fn improvement<R: Rng + ?Sized>(habits: &[HabitSnapshot], rng: &mut R) -> InsightDraft {
    let worst = habits
        .iter()
        .min_by_key(|h| h.completion_rate)
        .map(|h| h.name.as_str())
        .unwrap_or("habit");
    let day = WEEKDAYS.choose(rng).copied().unwrap_or("Monday");

    InsightDraft::new(
        InsightKind::Improvement,
        "Optimization Suggestion",
        format!(
            "Your {} completion rate is lower than other habits. Consider scheduling it on {}s when you might have more energy or time.",
            worst, day
        ),
        rng.random_range(80..=90),
    )
}

fn trend<R: Rng + ?Sized>(habits: &[HabitSnapshot], rng: &mut R) -> InsightDraft {
    let name = habits
        .choose(rng)
        .map(|h| h.name.as_str())
        .unwrap_or("habit");
    let improvement: u32 = rng.random_range(10..=30);

    InsightDraft::new(
        InsightKind::Trend,
        "Positive Trend Detected",
        format!(
            "Your {} habit shows {}% improvement over the last two weeks. Great progress!",
            name, improvement
        ),
        rng.random_range(85..=95),
    )
}

fn tip<R: Rng + ?Sized>(rng: &mut R) -> InsightDraft {
    let message = TIPS.choose(rng).copied().unwrap_or(TIPS[0]);
    InsightDraft::new(
        InsightKind::Tip,
        "Habit Building Tip",
        message,
        rng.random_range(88..=98),
    )
}
