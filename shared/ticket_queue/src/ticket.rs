use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// Ticket priority, one queue per value
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Priority {
    /// Highest priority
    P1,
    /// Medium priority
    P2,
    /// Low priority
    P3,
}

/// A well-formed support ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Short summary, never empty
    pub title: String,
    /// Free-form body, stored as submitted
    pub description: String,
    /// Routing priority
    pub priority: Priority,
}

/// Reasons a decoded payload is not a well-formed ticket
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// A required field is absent
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The title is empty or whitespace
    #[error("title must not be empty")]
    EmptyTitle,

    /// The priority label is outside the supported set
    #[error("unknown priority `{0}`")]
    UnknownPriority(String),
}

/// Raw ticket fields as found in a message body, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFields {
    /// Ticket title
    pub title: Option<String>,
    /// Ticket description
    pub description: Option<String>,
    /// Priority label, not yet checked against the supported set
    pub priority: Option<String>,
}

impl TicketFields {
    /// Validates the fields into a [`Ticket`]
    ///
    /// # Errors
    ///
    /// Returns `TicketError` if a field is missing, the title is empty or the
    /// priority label is unknown
    pub fn into_ticket(self) -> Result<Ticket, TicketError> {
        let title = self.title.ok_or(TicketError::MissingField("title"))?;
        let description = self
            .description
            .ok_or(TicketError::MissingField("description"))?;
        let label = self.priority.ok_or(TicketError::MissingField("priority"))?;

        if title.trim().is_empty() {
            return Err(TicketError::EmptyTitle);
        }

        let priority = label
            .parse::<Priority>()
            .map_err(|_| TicketError::UnknownPriority(label))?;

        Ok(Ticket {
            title,
            description,
            priority,
        })
    }
}

impl From<Ticket> for TicketFields {
    fn from(ticket: Ticket) -> Self {
        Self {
            title: Some(ticket.title),
            description: Some(ticket.description),
            priority: Some(ticket.priority.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn fields(title: &str, description: &str, priority: &str) -> TicketFields {
        TicketFields {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            priority: Some(priority.to_string()),
        }
    }

    #[test]
    fn test_valid_fields_become_ticket() {
        let ticket = fields("Printer down", "3rd floor\nroom 12", "P1")
            .into_ticket()
            .unwrap();

        assert_eq!(
            ticket,
            Ticket {
                title: "Printer down".to_string(),
                description: "3rd floor\nroom 12".to_string(),
                priority: Priority::P1,
            }
        );
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let mut missing_title = fields("t", "d", "P1");
        missing_title.title = None;
        assert_eq!(
            missing_title.into_ticket(),
            Err(TicketError::MissingField("title"))
        );

        let mut missing_priority = fields("t", "d", "P1");
        missing_priority.priority = None;
        assert_eq!(
            missing_priority.into_ticket(),
            Err(TicketError::MissingField("priority"))
        );
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert_eq!(
            fields("   ", "d", "P2").into_ticket(),
            Err(TicketError::EmptyTitle)
        );
    }

    #[test]
    fn test_unknown_priority_is_rejected() {
        assert_eq!(
            fields("t", "d", "P9").into_ticket(),
            Err(TicketError::UnknownPriority("P9".to_string()))
        );
        // Labels are case sensitive
        assert_eq!(
            fields("t", "d", "p1").into_ticket(),
            Err(TicketError::UnknownPriority("p1".to_string()))
        );
    }

    #[test]
    fn test_priority_wire_format() {
        for priority in Priority::iter() {
            let json = serde_json::to_string(&priority).unwrap();
            assert_eq!(json, format!("\"{priority}\""));
        }
    }
}
