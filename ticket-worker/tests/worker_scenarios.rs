use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use ticket_queue::{
    queue::{InMemoryQueue, QueueClient},
    PollSettings, Priority, Ticket, TicketDecoder,
};
use ticket_worker::{BatchReport, PriorityWorker, SinkAdapter, SinkError};
use tokio_util::sync::CancellationToken;

const P1_QUEUE: &str = "https://sqs.local/000000000000/tickets-p1";
const DLQ: &str = "https://sqs.local/000000000000/tickets-dlq";

const PRINTER_DOWN: &str = r#"{"title":"Printer down","description":"3rd floor","priority":"P1"}"#;

#[derive(Clone, Copy)]
enum Behaviour {
    Accept,
    Reject,
    Panic,
    /// Rejects tickets whose title starts with "bad"
    RejectBad,
}

/// Sink double recording every ticket it is asked to deliver
struct RecordingSink {
    behaviour: Behaviour,
    calls: AtomicUsize,
    delivered: Delivered,
    cancel_on_deliver: Option<CancellationToken>,
}

#[derive(Default)]
struct Delivered(Mutex<Vec<Ticket>>);

impl Delivered {
    fn push(&self, ticket: Ticket) {
        self.0.lock().unwrap().push(ticket);
    }

    fn titles(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }
}

impl RecordingSink {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            delivered: Delivered::default(),
            cancel_on_deliver: None,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SinkAdapter for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, ticket: &Ticket) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_deliver {
            token.cancel();
        }

        match self.behaviour {
            Behaviour::Accept => {}
            Behaviour::Reject => {
                return Err(SinkError::Rejected {
                    status: 500,
                    body: "flow failed".to_string(),
                })
            }
            Behaviour::Panic => panic!("sink exploded"),
            Behaviour::RejectBad if ticket.title.starts_with("bad") => {
                return Err(SinkError::Rejected {
                    status: 400,
                    body: "bad ticket".to_string(),
                })
            }
            Behaviour::RejectBad => {}
        }

        self.delivered.push(ticket.clone());
        Ok(())
    }
}

fn setup() -> Arc<InMemoryQueue> {
    let queue = Arc::new(InMemoryQueue::new());
    queue.create_queue(P1_QUEUE);
    queue.create_queue(DLQ);
    queue
}

fn p1_worker(
    queue: &Arc<InMemoryQueue>,
    sink: &Arc<RecordingSink>,
    max_messages: i32,
    shutdown: CancellationToken,
) -> PriorityWorker {
    PriorityWorker::new(
        Priority::P1,
        P1_QUEUE,
        queue.clone(),
        sink.clone(),
        Arc::new(TicketDecoder::default()),
        PollSettings {
            max_messages,
            wait_time_seconds: 0,
        },
        shutdown,
    )
}

#[tokio::test]
async fn test_delivered_ticket_is_deleted() {
    let queue = setup();
    let sink = Arc::new(RecordingSink::new(Behaviour::Accept));
    let ticket = Ticket {
        title: "Printer down".to_string(),
        description: "3rd floor".to_string(),
        priority: Priority::P1,
    };
    queue.send_ticket(P1_QUEUE, &ticket).await.unwrap();

    let worker = p1_worker(&queue, &sink, 1, CancellationToken::new());
    let report = worker.poll_once().await.unwrap();

    assert_eq!(
        report,
        BatchReport {
            received: 1,
            delivered: 1,
            rejected: 0,
            failed: 0,
        }
    );
    assert_eq!(sink.delivered.titles(), vec!["Printer down".to_string()]);
    assert!(queue.is_empty(P1_QUEUE));
}

#[tokio::test]
async fn test_failed_delivery_stays_and_redrives_to_dlq() {
    let queue = setup();
    queue.set_redrive(P1_QUEUE, DLQ, 3).unwrap();
    queue.seed(P1_QUEUE, PRINTER_DOWN).unwrap();

    let sink = Arc::new(RecordingSink::new(Behaviour::Reject));
    let worker = p1_worker(&queue, &sink, 1, CancellationToken::new());

    for _ in 0..3 {
        let report = worker.poll_once().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(queue.len(P1_QUEUE), 1);
        queue.expire_visibility(P1_QUEUE);
    }

    // Fourth receive exceeds the max receive count
    let report = worker.poll_once().await.unwrap();
    assert_eq!(report.received, 0);
    assert!(queue.is_empty(P1_QUEUE));
    assert_eq!(queue.visible_bodies(DLQ), vec![PRINTER_DOWN.to_string()]);
    assert_eq!(sink.calls(), 3);
}

#[tokio::test]
async fn test_malformed_payloads_are_never_deleted_or_delivered() {
    let queue = setup();
    let bodies = [
        "{not json",
        r#"{"description":"no title","priority":"P1"}"#,
        r#"{"title":"no description","priority":"P1"}"#,
        r#"{"title":"no priority","description":"Y"}"#,
        r#"{"title":"  ","description":"Y","priority":"P1"}"#,
        r#"{"title":"X","description":"Y","priority":"P9"}"#,
        r#"{"title":"X","description":"Y","priority":"P3"}"#,
        r#"["title","description","priority"]"#,
    ];
    for body in bodies {
        queue.seed(P1_QUEUE, body).unwrap();
    }

    let sink = Arc::new(RecordingSink::new(Behaviour::Accept));
    let worker = p1_worker(&queue, &sink, 10, CancellationToken::new());
    let report = worker.poll_once().await.unwrap();

    assert_eq!(report.received, bodies.len());
    assert_eq!(report.rejected, bodies.len());
    assert_eq!(sink.calls(), 0);
    assert_eq!(queue.len(P1_QUEUE), bodies.len());
}

#[tokio::test]
async fn test_one_failure_does_not_abort_the_batch() {
    let queue = setup();
    queue
        .seed(P1_QUEUE, r#"{"title":"first","description":"a","priority":"P1"}"#)
        .unwrap();
    queue
        .seed(P1_QUEUE, r#"{"title":"bad one","description":"b","priority":"P1"}"#)
        .unwrap();
    queue.seed(P1_QUEUE, "garbage").unwrap();
    queue
        .seed(P1_QUEUE, r#"{"title":"last","description":"c","priority":"P1"}"#)
        .unwrap();

    let sink = Arc::new(RecordingSink::new(Behaviour::RejectBad));
    let worker = p1_worker(&queue, &sink, 10, CancellationToken::new());
    let report = worker.poll_once().await.unwrap();

    assert_eq!(
        report,
        BatchReport {
            received: 4,
            delivered: 2,
            rejected: 1,
            failed: 1,
        }
    );
    assert_eq!(
        sink.delivered.titles(),
        vec!["first".to_string(), "last".to_string()]
    );
    assert_eq!(queue.in_flight_count(P1_QUEUE), 2);
}

#[tokio::test]
async fn test_sink_panic_is_contained() {
    let queue = setup();
    queue.seed(P1_QUEUE, PRINTER_DOWN).unwrap();

    let sink = Arc::new(RecordingSink::new(Behaviour::Panic));
    let worker = p1_worker(&queue, &sink, 1, CancellationToken::new());
    let report = worker.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(queue.len(P1_QUEUE), 1);
}

#[tokio::test]
async fn test_empty_queue_has_no_side_effects() {
    let queue = setup();
    let sink = Arc::new(RecordingSink::new(Behaviour::Accept));
    let worker = p1_worker(&queue, &sink, 1, CancellationToken::new());

    assert_eq!(worker.poll_once().await.unwrap(), BatchReport::default());
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_worker_does_not_poll() {
    let queue = setup();
    queue.seed(P1_QUEUE, PRINTER_DOWN).unwrap();

    let sink = Arc::new(RecordingSink::new(Behaviour::Accept));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    p1_worker(&queue, &sink, 1, shutdown).start().await;

    assert_eq!(sink.calls(), 0);
    assert_eq!(queue.visible_count(P1_QUEUE), 1);
}

#[tokio::test]
async fn test_cancellation_finishes_the_current_batch() {
    let queue = setup();
    queue
        .seed(P1_QUEUE, r#"{"title":"one","description":"a","priority":"P1"}"#)
        .unwrap();
    queue
        .seed(P1_QUEUE, r#"{"title":"two","description":"b","priority":"P1"}"#)
        .unwrap();
    queue
        .seed(P1_QUEUE, r#"{"title":"three","description":"c","priority":"P1"}"#)
        .unwrap();

    let shutdown = CancellationToken::new();
    let sink = Arc::new(RecordingSink {
        cancel_on_deliver: Some(shutdown.clone()),
        ..RecordingSink::new(Behaviour::Accept)
    });

    // Cancelled during the first delivery of a two-message batch
    p1_worker(&queue, &sink, 2, shutdown).start().await;

    assert_eq!(
        sink.delivered.titles(),
        vec!["one".to_string(), "two".to_string()]
    );
    assert_eq!(queue.visible_bodies(P1_QUEUE).len(), 1);
    assert_eq!(queue.in_flight_count(P1_QUEUE), 0);
}
