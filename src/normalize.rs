use tracing::debug;

use crate::models::Event;

pub const ASSESSMENT_CATEGORY: &str = "assessment";
pub const HOMEWORK_VERBS: [&str; 2] = ["submit", "scored"];
pub const TEST_VERBS: [&str; 2] = ["completed", "start"];

/// Categories with no scoring signal, dropped from engagement reporting.
pub const NOISE_CATEGORIES: [&str; 5] = ["page", "review", "meeting", "survey", "lesson"];

/// Resolves a generic `assessment` category from its verb. Unrecognised verbs stay `assessment`.
pub fn resolve_category<'a>(category: &'a str, verb: &str) -> &'a str {
    if category != ASSESSMENT_CATEGORY {
        return category;
    }

    if HOMEWORK_VERBS.contains(&verb) {
        "homework"
    } else if TEST_VERBS.contains(&verb) {
        "test"
    } else {
        category
    }
}

pub fn is_noise(category: &str) -> bool {
    NOISE_CATEGORIES.contains(&category)
}

/// Returns a rewritten copy of the log; the input is left untouched.
pub fn normalize(events: &[Event]) -> Vec<Event> {
    let normalized: Vec<Event> = events
        .iter()
        .filter_map(|event| {
            let category = resolve_category(&event.object_category, &event.verb);
            if is_noise(category) {
                return None;
            }
            let mut event = event.clone();
            if category != event.object_category {
                event.object_category = category.to_string();
            }
            Some(event)
        })
        .collect();

    debug!(
        input = events.len(),
        kept = normalized.len(),
        "normalized event categories"
    );
    normalized
}
