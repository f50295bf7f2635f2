use std::{collections::BTreeMap, sync::Arc};

use dlq_inspector::DlqInspector;
use pretty_assertions::assert_eq;
use ticket_queue::{
    log_capture::LogCapture,
    queue::{FailurePlan, InMemoryQueue},
    PollSettings, Priority, RoutingTable, TicketDecoder,
};

const DLQ: &str = "https://sqs.local/000000000000/tickets-dlq";
const P1: &str = "https://sqs.local/000000000000/tickets-p1";
const P2: &str = "https://sqs.local/000000000000/tickets-p2";

#[tokio::test]
async fn test_each_entry_logs_one_outcome_record() {
    let queue = Arc::new(InMemoryQueue::new());
    for url in [DLQ, P1, P2] {
        queue.create_queue(url);
    }
    queue
        .set_failures(
            P2,
            FailurePlan {
                send: true,
                ..FailurePlan::default()
            },
        )
        .unwrap();

    let mut expected = BTreeMap::new();
    for (body, priority, outcome) in [
        (
            r#"{"title":"X","description":"Y","priority":"P1"}"#,
            "P1",
            "replayed",
        ),
        ("%%% garbage %%%", "unknown", "malformed_payload"),
        (
            r#"{"title":"X","description":"Y","priority":"P7"}"#,
            "P7",
            "unroutable_ticket",
        ),
        (
            r#"{"title":"X","description":"Y","priority":"P2"}"#,
            "P2",
            "transient_queue_error",
        ),
    ] {
        let message_id = queue.seed(DLQ, body).unwrap();
        expected.insert(message_id, (priority.to_string(), outcome.to_string()));
    }

    let inspector = DlqInspector::new(
        DLQ,
        queue.clone(),
        RoutingTable::new([(Priority::P1, P1.to_string()), (Priority::P2, P2.to_string())]),
        Arc::new(TicketDecoder::default()),
        PollSettings::DLQ,
    );

    let (capture, _guard) = LogCapture::install();
    let report = inspector.inspect().await.unwrap();
    assert_eq!(report.received, 4);

    let records = capture.events_with("outcome");
    assert_eq!(records.len(), 4);

    let logged: BTreeMap<_, _> = records
        .into_iter()
        .map(|record| {
            (
                record["message_id"].clone(),
                (record["priority"].clone(), record["outcome"].clone()),
            )
        })
        .collect();
    assert_eq!(logged, expected);
}
