#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axiom_core::context::{ContextFetchFuture, ContextFetchRequest, ContextFetcher};
use axiom_core::execution::{HttpRequest, HttpResponse, HttpResponseFuture, HttpTransport};
use axiom_core::models::{CoreError, CoreErrorKind, CoreResult};
use serde_json::{Value, json};

type Responder = Arc<dyn Fn(&HttpRequest) -> CoreResult<HttpResponse> + Send + Sync>;

#[derive(Clone)]
pub struct FakeTransport {
    captured: Arc<Mutex<Vec<HttpRequest>>>,
    responder: Responder,
    delay: Duration,
}

impl FakeTransport {
    pub fn responding(
        responder: impl Fn(&HttpRequest) -> CoreResult<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            captured: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
            delay: Duration::ZERO,
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::responding(move |_| Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn text(status: u16, body: &'static str) -> Self {
        Self::responding(move |_| Ok(HttpResponse::new(status, body)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.captured
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .filter_map(|request| request.body.as_ref())
            .map(|body| serde_json::from_slice(body).expect("payload should be JSON"))
            .collect()
    }

    pub fn last_payload(&self) -> Value {
        self.payloads().pop().expect("expected a dispatched payload")
    }
}

impl HttpTransport for FakeTransport {
    fn send(&self, request: HttpRequest) -> HttpResponseFuture {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push(request.clone());
        }
        let outcome = (self.responder)(&request);
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

#[derive(Clone)]
pub struct CountingFetcher {
    calls: Arc<AtomicUsize>,
    users: Arc<Mutex<Vec<String>>>,
    value: Value,
    fail: bool,
    delay: Duration,
    first_call_delay: Option<Duration>,
}

impl CountingFetcher {
    pub fn returning(value: Value) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            users: Arc::new(Mutex::new(Vec::new())),
            value,
            fail: false,
            delay: Duration::ZERO,
            first_call_delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(Value::Null)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_first_call_delay(mut self, delay: Duration) -> Self {
        self.first_call_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<String> {
        self.users
            .lock()
            .map(|users| users.clone())
            .unwrap_or_default()
    }

    pub fn shared(&self) -> Arc<dyn ContextFetcher> {
        Arc::new(self.clone())
    }
}

impl ContextFetcher for CountingFetcher {
    fn fetch(&self, request: ContextFetchRequest) -> ContextFetchFuture {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut users) = self.users.lock() {
            users.push(request.user_id.clone());
        }

        let delay = match self.first_call_delay {
            Some(first) if call == 1 => first,
            _ => self.delay,
        };
        let fail = self.fail;
        let value = match &self.value {
            Value::Null => Value::Null,
            value => json!({ "value": value, "user": request.user_id, "fetch": call }),
        };

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(CoreError::new(
                    CoreErrorKind::HttpStatus,
                    "context endpoint returned 503",
                ));
            }
            Ok(value)
        })
    }
}
