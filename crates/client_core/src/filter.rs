use chrono::{Datelike, NaiveDate};

use crate::join::MessageView;

/// View-state for the inbox projection. Passed in explicitly so the
/// predicate stays a pure function of its arguments.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub query: String,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unset(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

pub fn matches(view: &MessageView, state: &FilterState, current_year: i32) -> bool {
    matches_query(view, &state.query) && matches_date(view, &state.date_range, current_year)
}

pub fn apply(views: Vec<MessageView>, state: &FilterState, current_year: i32) -> Vec<MessageView> {
    views
        .into_iter()
        .filter(|view| matches(view, state, current_year))
        .collect()
}

fn matches_query(view: &MessageView, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let haystacks = [
        view.message.subject.as_deref(),
        view.message.sender_name.as_deref(),
        view.message.sender_email.as_deref(),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_date(view: &MessageView, range: &DateRange, current_year: i32) -> bool {
    if range.is_unset() {
        return true;
    }
    // The record contributes only its month/day, re-anchored in the current
    // year; a record without a date fails once either bound is set.
    let Some(received) = view.message.received_at else {
        return false;
    };
    let Some(item_date) = NaiveDate::from_ymd_opt(current_year, received.month(), received.day())
    else {
        return false;
    };
    // Bounds are checked independently; an inverted range is allowed to
    // produce an empty projection rather than being swapped or rejected.
    if let Some(from) = range.from {
        if item_date < from {
            return false;
        }
    }
    if let Some(to) = range.to {
        if item_date > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(value: serde_json::Value) -> MessageView {
        MessageView {
            message: serde_json::from_value(value).expect("message"),
            orders: Vec::new(),
            tag: None,
            needs_attention: false,
        }
    }

    fn milk_order() -> MessageView {
        view(serde_json::json!({
            "item_id": "m1",
            "subject": "Milk order",
            "sender_name": "Rosa Marchetti",
            "sender_email": "rosa@deli.example",
            "received_at": "2026-03-14T09:30:00Z",
        }))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn empty_query_and_unset_range_pass_everything() {
        assert!(matches(&milk_order(), &FilterState::default(), 2026));
        assert!(matches(
            &view(serde_json::json!({ "item_id": "m2" })),
            &FilterState::default(),
            2026
        ));
    }

    #[test]
    fn query_matches_subject_name_and_email_case_insensitively() {
        let state = |query: &str| FilterState {
            query: query.to_string(),
            ..FilterState::default()
        };
        assert!(matches(&milk_order(), &state("MILK"), 2026));
        assert!(matches(&milk_order(), &state("marchetti"), 2026));
        assert!(matches(&milk_order(), &state("rosa@deli"), 2026));
        assert!(!matches(&milk_order(), &state("flour"), 2026));
    }

    #[test]
    fn query_does_not_match_absent_fields() {
        let bare = view(serde_json::json!({ "item_id": "m3" }));
        let state = FilterState {
            query: "milk".to_string(),
            ..FilterState::default()
        };
        assert!(!matches(&bare, &state, 2026));
    }

    #[test]
    fn date_range_is_inclusive_of_both_bounds() {
        let state = |from, to| FilterState {
            date_range: DateRange { from, to },
            ..FilterState::default()
        };
        // received_at is 03-14, re-anchored to the supplied year.
        assert!(matches(
            &milk_order(),
            &state(Some(date(2026, 3, 14)), Some(date(2026, 3, 14))),
            2026
        ));
        assert!(matches(
            &milk_order(),
            &state(Some(date(2026, 3, 1)), None),
            2026
        ));
        assert!(matches(
            &milk_order(),
            &state(None, Some(date(2026, 3, 31))),
            2026
        ));
        assert!(!matches(
            &milk_order(),
            &state(Some(date(2026, 3, 15)), None),
            2026
        ));
        assert!(!matches(
            &milk_order(),
            &state(None, Some(date(2026, 3, 13))),
            2026
        ));
    }

    #[test]
    fn records_without_a_date_fail_once_any_bound_is_set() {
        let bare = view(serde_json::json!({ "item_id": "m3" }));
        let state = FilterState {
            date_range: DateRange {
                from: Some(date(2026, 1, 1)),
                to: None,
            },
            ..FilterState::default()
        };
        assert!(!matches(&bare, &state, 2026));
    }

    #[test]
    fn inverted_range_yields_empty_without_swapping() {
        let state = FilterState {
            date_range: DateRange {
                from: Some(date(2026, 6, 1)),
                to: Some(date(2026, 1, 1)),
            },
            ..FilterState::default()
        };
        // Every candidate date is either below `from` or above `to`, so any
        // record fails one bound; the predicate itself must not panic.
        for (month, day) in [(1u32, 1u32), (3, 14), (6, 1), (12, 31)] {
            let candidate = view(serde_json::json!({
                "item_id": "m4",
                "received_at": format!("2026-{month:02}-{day:02}T00:00:00Z"),
            }));
            assert!(!matches(&candidate, &state, 2026));
        }
    }

    #[test]
    fn range_strictly_before_every_record_yields_empty() {
        let state = FilterState {
            date_range: DateRange {
                from: Some(date(2026, 1, 1)),
                to: Some(date(2026, 2, 1)),
            },
            ..FilterState::default()
        };
        let filtered = apply(vec![milk_order()], &state, 2026);
        assert!(filtered.is_empty());
    }

    #[test]
    fn month_day_is_re_anchored_in_the_current_year() {
        // A 2024 timestamp still matches a 2026 range because only the
        // month/day survive the projection.
        let old = view(serde_json::json!({
            "item_id": "m5",
            "received_at": "2024-03-14T00:00:00Z",
        }));
        let state = FilterState {
            date_range: DateRange {
                from: Some(date(2026, 3, 1)),
                to: Some(date(2026, 3, 31)),
            },
            ..FilterState::default()
        };
        assert!(matches(&old, &state, 2026));
    }

    #[test]
    fn feb_29_fails_when_the_current_year_is_not_a_leap_year() {
        let leap = view(serde_json::json!({
            "item_id": "m6",
            "received_at": "2024-02-29T00:00:00Z",
        }));
        let state = FilterState {
            date_range: DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 12, 31)),
            },
            ..FilterState::default()
        };
        assert!(!matches(&leap, &state, 2025));
    }
}
