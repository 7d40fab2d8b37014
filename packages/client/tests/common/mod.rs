//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tether_client::adapter::{AdapterSelection, Transport};
use tether_client::client::HttpClient;
use tether_client::config::RequestConfig;
use tether_client::error::{Error, Result};
use tether_client::http::{HttpRequest, HttpResponse};
use tether_client::StatusCode;
use tokio::time::Instant;

/// What the transport does on one attempt.
#[derive(Clone)]
pub enum Step {
    /// Respond with a status, headers and a text body
    Respond(u16, Vec<(&'static str, &'static str)>, &'static str),
    /// Fail without a response
    Fail(Error),
    /// Never complete
    Hang,
}

impl Step {
    pub fn status(status: u16) -> Self {
        Step::Respond(status, Vec::new(), "")
    }

    pub fn body(status: u16, body: &'static str) -> Self {
        Step::Respond(status, Vec::new(), body)
    }

    pub fn header(status: u16, name: &'static str, value: &'static str) -> Self {
        Step::Respond(status, vec![(name, value)], "")
    }
}

/// One observed dispatch.
#[derive(Debug, Clone)]
pub struct Call {
    pub attempt: u32,
    pub timeout: Option<Duration>,
    pub at: Instant,
    pub request: HttpRequest,
}

struct Inner {
    steps: Vec<Step>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
}

/// Plays back `steps` in order, repeating the last one.
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self::with_latency(steps, Duration::ZERO)
    }

    /// Every attempt takes `latency` before its step plays.
    pub fn with_latency(steps: Vec<Step>, latency: Duration) -> Self {
        assert!(!steps.is_empty(), "a script needs at least one step");
        Self {
            inner: Arc::new(Inner {
                steps,
                latency,
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().expect("calls lock").clone()
    }

    pub fn attempts(&self) -> usize {
        self.inner.calls.lock().expect("calls lock").len()
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn dispatch(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> {
        let step = {
            let mut calls = self.inner.calls.lock().expect("calls lock");
            let index = calls.len().min(self.inner.steps.len() - 1);
            calls.push(Call {
                attempt: request.attempt,
                timeout: request.timeout,
                at: Instant::now(),
                request: request.clone(),
            });
            self.inner.steps[index].clone()
        };
        let latency = self.inner.latency;

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match step {
                Step::Respond(status, headers, body) => {
                    let status = StatusCode::from_u16(status).expect("valid status");
                    let mut response = HttpResponse::new(status, request.snapshot()).with_data(body);
                    for (name, value) in headers {
                        response = response.with_header(name, value);
                    }
                    Ok(response)
                }
                Step::Fail(err) => Err(err),
                Step::Hang => std::future::pending().await,
            }
        })
    }
}

/// A client whose only adapter is `transport`.
pub fn scripted_client(transport: &ScriptedTransport) -> HttpClient {
    HttpClient::builder()
        .transport(Arc::new(transport.clone()))
        .adapter(AdapterSelection::named("scripted"))
        .build()
        .expect("client builds")
}

pub fn get(client: &HttpClient) -> RequestConfig {
    client
        .request(tether_client::Method::GET, "http://example.test/resource")
        .expect("valid url")
}
