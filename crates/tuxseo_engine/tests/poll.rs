use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tuxseo_engine::{
    start_polling, ActionDispatcher, ActionError, ActionRequest, DispatchSettings, PageContext,
    PollObserver, PollPolicy, ReqwestDispatcher, TuxSeoApi,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq)]
enum Seen {
    Done(Value),
    Error(u32),
    Exhausted(ActionError),
}

struct Recorder {
    tx: Mutex<mpsc::Sender<Seen>>,
}

impl Recorder {
    fn new() -> (Arc<Self>, mpsc::Receiver<Seen>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { tx: Mutex::new(tx) }), rx)
    }

    fn send(&self, seen: Seen) {
        let _ = self.tx.lock().unwrap().send(seen);
    }
}

impl PollObserver for Recorder {
    fn is_done(&self, status: &Value) -> bool {
        status["completed"] == json!(true)
    }

    fn on_done(&self, status: Value) {
        self.send(Seen::Done(status));
    }

    fn on_error(&self, attempt: u32, _error: &ActionError) {
        self.send(Seen::Error(attempt));
    }

    fn on_exhausted(&self, error: ActionError) {
        self.send(Seen::Exhausted(error));
    }
}

/// Replies after a fixed delay with a fixed result, counting calls.
struct Scripted {
    delay: Duration,
    reply: Result<Value, ActionError>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ActionDispatcher for Scripted {
    async fn perform(&self, _request: ActionRequest) -> Result<Value, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.reply.clone()
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_attempts: 50,
        max_consecutive_errors: 3,
        backoff_factor: 2,
        max_interval: Duration::from_millis(40),
    }
}

async fn drain(rx: &mpsc::Receiver<Seen>, wait: Duration) -> Vec<Seen> {
    tokio::time::sleep(wait).await;
    rx.try_iter().collect()
}

#[tokio::test]
async fn status_endpoint_stops_being_called_after_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/project/7/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completed": false})))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/project/7/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completed": true})))
        .with_priority(2)
        .mount(&server)
        .await;

    let dispatcher = Arc::new(
        ReqwestDispatcher::new(&server.uri(), PageContext::default(), DispatchSettings::default())
            .expect("dispatcher"),
    );
    let (recorder, rx) = Recorder::new();
    let handle = start_polling(
        dispatcher,
        TuxSeoApi::status_request(7),
        fast_policy(),
        recorder,
    );

    let seen = drain(&rx, Duration::from_millis(400)).await;
    assert_eq!(seen, vec![Seen::Done(json!({"completed": true}))]);
    assert!(handle.is_stopped());

    let after_done = server.received_requests().await.expect("recording").len();
    assert_eq!(after_done, 3);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        server.received_requests().await.expect("recording").len(),
        after_done
    );
}

#[tokio::test]
async fn stop_during_request_suppresses_completion() {
    let dispatcher = Arc::new(Scripted {
        delay: Duration::from_millis(150),
        reply: Ok(json!({"completed": true})),
        calls: AtomicUsize::new(0),
    });
    let (recorder, rx) = Recorder::new();
    let handle = start_polling(
        dispatcher.clone(),
        ActionRequest::get("/project/1/status/"),
        fast_policy(),
        recorder,
    );

    // First tick fires after 10ms and then waits 150ms for its reply.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    handle.stop();
    handle.stop();

    let seen = drain(&rx, Duration::from_millis(300)).await;
    assert!(seen.is_empty(), "no callbacks after stop, got {seen:?}");
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn transport_errors_are_retried_then_exhausted() {
    let dispatcher = Arc::new(Scripted {
        delay: Duration::ZERO,
        reply: Err(ActionError::Network {
            status: None,
            message: "connection refused".to_string(),
        }),
        calls: AtomicUsize::new(0),
    });
    let (recorder, rx) = Recorder::new();
    let _handle = start_polling(
        dispatcher.clone(),
        ActionRequest::get("/project/1/status/"),
        fast_policy(),
        recorder,
    );

    let seen = drain(&rx, Duration::from_millis(500)).await;
    assert_eq!(
        seen,
        vec![
            Seen::Error(1),
            Seen::Error(2),
            Seen::Error(3),
            Seen::Exhausted(ActionError::Exhausted { attempts: 3 }),
        ]
    );
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn dropping_the_handle_stops_polling() {
    let dispatcher = Arc::new(Scripted {
        delay: Duration::ZERO,
        reply: Ok(json!({"completed": false})),
        calls: AtomicUsize::new(0),
    });
    let (recorder, rx) = Recorder::new();
    let handle = start_polling(
        dispatcher.clone(),
        ActionRequest::get("/project/1/status/"),
        fast_policy(),
        recorder,
    );
    tokio::time::sleep(Duration::from_millis(55)).await;
    drop(handle);
    let calls = dispatcher.calls.load(Ordering::SeqCst);
    assert!(calls >= 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), calls);
    assert!(drain(&rx, Duration::ZERO).await.is_empty());
}
