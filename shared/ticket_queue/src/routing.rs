use std::collections::BTreeMap;

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::ticket::Priority;

/// Routing lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The label is not a supported priority
    #[error("priority `{0}` is not a supported priority")]
    UnknownPriority(String),

    /// The priority is supported but has no configured queue
    #[error("no queue configured for priority {0}")]
    MissingDestination(Priority),
}

/// Immutable mapping from priority to queue URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: BTreeMap<Priority, String>,
}

impl RoutingTable {
    /// Builds a table, ignoring blank destinations
    #[must_use]
    pub fn new(routes: impl IntoIterator<Item = (Priority, String)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(priority, url)| (priority, url.trim().to_string()))
                .filter(|(_, url)| !url.is_empty())
                .collect(),
        }
    }

    /// Returns the queue URL for a priority
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::MissingDestination` if no queue is configured
    pub fn resolve(&self, priority: Priority) -> Result<&str, RoutingError> {
        self.routes
            .get(&priority)
            .map(String::as_str)
            .ok_or(RoutingError::MissingDestination(priority))
    }

    /// Returns the priority and queue URL for a textual priority label
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::UnknownPriority` if the label is not a priority,
    /// or `RoutingError::MissingDestination` if no queue is configured for it
    pub fn resolve_label(&self, label: &str) -> Result<(Priority, &str), RoutingError> {
        let priority = label
            .parse::<Priority>()
            .map_err(|_| RoutingError::UnknownPriority(label.to_string()))?;

        Ok((priority, self.resolve(priority)?))
    }

    /// Priorities without a configured queue
    #[must_use]
    pub fn missing_priorities(&self) -> Vec<Priority> {
        Priority::iter()
            .filter(|p| !self.routes.contains_key(p))
            .collect()
    }

    /// Iterates over configured routes in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &str)> {
        self.routes.iter().map(|(p, url)| (*p, url.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> RoutingTable {
        RoutingTable::new([
            (Priority::P1, "https://sqs.local/000/p1".to_string()),
            (Priority::P2, "https://sqs.local/000/p2".to_string()),
            (Priority::P3, "https://sqs.local/000/p3".to_string()),
        ])
    }

    #[test]
    fn test_every_priority_resolves_to_a_queue() {
        let table = table();
        for priority in Priority::iter() {
            let url = table.resolve(priority).unwrap();
            assert!(!url.is_empty());
        }
        assert!(table.missing_priorities().is_empty());
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!(
            table().resolve_label("P2"),
            Ok((Priority::P2, "https://sqs.local/000/p2"))
        );
    }

    #[test]
    fn test_unknown_label_differs_from_missing_destination() {
        let partial = RoutingTable::new([(Priority::P1, "https://sqs.local/000/p1".to_string())]);

        assert_eq!(
            partial.resolve_label("P9"),
            Err(RoutingError::UnknownPriority("P9".to_string()))
        );
        assert_eq!(
            partial.resolve_label("P3"),
            Err(RoutingError::MissingDestination(Priority::P3))
        );
    }

    #[test]
    fn test_blank_destinations_are_missing() {
        let table = RoutingTable::new([
            (Priority::P1, "  ".to_string()),
            (Priority::P2, "https://sqs.local/000/p2".to_string()),
        ]);

        assert_eq!(
            table.resolve(Priority::P1),
            Err(RoutingError::MissingDestination(Priority::P1))
        );
        assert_eq!(table.missing_priorities(), vec![Priority::P1, Priority::P3]);
        assert_eq!(table.iter().count(), 1);
    }
}
