use async_trait::async_trait;
use serde_json::{json, Value};
use ticket_queue::{Priority, Ticket};
use tracing::info;

use super::{check_response, SinkAdapter, SinkError};

/// Creates Jira Cloud issues through the REST v3 API
#[derive(Clone)]
pub struct JiraSink {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
    project_key: String,
}

impl std::fmt::Debug for JiraSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSink")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("project_key", &self.project_key)
            .finish_non_exhaustive()
    }
}

impl JiraSink {
    /// Creates a sink for the site at `base_url`, e.g. `https://example.atlassian.net`
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        base_url: String,
        email: String,
        api_token: String,
        project_key: String,
    ) -> Self {
        Self {
            client,
            base_url,
            email,
            api_token,
            project_key,
        }
    }

    /// Issue creation request body
    #[must_use]
    pub fn issue_payload(&self, ticket: &Ticket) -> Value {
        json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": ticket.title.trim(),
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [{
                        "type": "paragraph",
                        "content": [{
                            "type": "text",
                            "text": ticket.description.trim(),
                        }],
                    }],
                },
                "issuetype": { "name": "Task" },
                "priority": { "name": jira_priority(ticket.priority) },
            }
        })
    }
}

const fn jira_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::P1 => "Highest",
        Priority::P2 => "Medium",
        Priority::P3 => "Low",
    }
}

#[async_trait]
impl SinkAdapter for JiraSink {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn deliver(&self, ticket: &Ticket) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}/rest/api/3/issue", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .json(&self.issue_payload(ticket))
            .send()
            .await?;

        info!(status = response.status().as_u16(), "Jira responded");
        check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_issue_payload() {
        let sink = JiraSink::new(
            reqwest::Client::new(),
            "https://example.atlassian.net".to_string(),
            "bot@example.com".to_string(),
            "token".to_string(),
            "IT".to_string(),
        );
        let ticket = Ticket {
            title: " VPN broken ".to_string(),
            description: "cannot connect\n".to_string(),
            priority: Priority::P2,
        };

        let payload = sink.issue_payload(&ticket);

        assert_eq!(payload["fields"]["project"]["key"], "IT");
        assert_eq!(payload["fields"]["summary"], "VPN broken");
        assert_eq!(payload["fields"]["priority"]["name"], "Medium");
        assert_eq!(payload["fields"]["issuetype"]["name"], "Task");
        assert_eq!(
            payload["fields"]["description"]["content"][0]["content"][0]["text"],
            "cannot connect"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let sink = JiraSink::new(
            reqwest::Client::new(),
            "https://example.atlassian.net".to_string(),
            "bot@example.com".to_string(),
            "super-secret".to_string(),
            "IT".to_string(),
        );

        assert!(!format!("{sink:?}").contains("super-secret"));
        assert_eq!(jira_priority(Priority::P1), "Highest");
        assert_eq!(jira_priority(Priority::P3), "Low");
    }
}
