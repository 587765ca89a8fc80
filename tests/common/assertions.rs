//! Custom assertions over recorded event sequences

use std::collections::HashMap;
use track_dl::Event;

/// Group events by item name, keeping per-item order
pub fn events_by_item(events: &[Event]) -> HashMap<String, Vec<Event>> {
    let mut grouped: HashMap<String, Vec<Event>> = HashMap::new();
    for event in events {
        grouped
            .entry(event.item().to_string())
            .or_default()
            .push(event.clone());
    }
    grouped
}

/// Short label for an event, for readable sequence comparisons
pub fn label(event: &Event) -> &'static str {
    match event {
        Event::Found { .. } => "found",
        Event::NotFound { .. } => "not_found",
        Event::Downloaded { .. } => "downloaded",
        Event::DownloadFailed { .. } => "download_failed",
        Event::Cancelled { .. } => "cancelled",
    }
}

/// Labels of one item's events, in order
pub fn sequence_for(events: &[Event], item: &str) -> Vec<&'static str> {
    events
        .iter()
        .filter(|e| e.item() == item)
        .map(label)
        .collect()
}

/// Assert that each distinct item name has exactly `per_name` terminal events,
/// each preceded only by non-terminal events
pub fn assert_terminal_per_item(events: &[Event], names: &[&str], per_name: usize) {
    let grouped = events_by_item(events);
    for name in names {
        let item_events = grouped
            .get(*name)
            .unwrap_or_else(|| panic!("no events for {:?}", name));
        let terminals = item_events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(
            terminals, per_name,
            "{:?} should have {} terminal event(s), got {:?}",
            name, per_name, item_events
        );
    }

    let total_terminal = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(total_terminal, names.len() * per_name);
}
