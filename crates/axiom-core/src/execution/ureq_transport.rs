use std::io::Read;
use std::time::Duration;

use crate::execution::{HttpRequest, HttpResponse, HttpResponseFuture, HttpTransport};
use crate::models::{CoreError, CoreErrorKind, CoreResult};

const MAX_RESPONSE_BYTES: u64 = 8 * 1024 * 1024;

/// Blocking `ureq` agent driven on tokio's blocking pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn send(&self, request: HttpRequest) -> HttpResponseFuture {
        let agent = self.agent.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || send_blocking(&agent, request))
                .await
                .map_err(|join_error| {
                    CoreError::new(
                        CoreErrorKind::Internal,
                        format!("http request join failure: {join_error}"),
                    )
                })?
        })
    }
}

fn send_blocking(agent: &ureq::Agent, request: HttpRequest) -> CoreResult<HttpResponse> {
    let mut call = agent
        .request(request.method.as_str(), &request.url)
        .set("Accept", "application/json");
    for (name, value) in &request.query {
        call = call.query(name, value);
    }

    let outcome = match &request.body {
        Some(body) => call
            .set("Content-Type", "application/json")
            .send_bytes(body),
        None => call.call(),
    };

    let response = match outcome {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => {
            return Err(CoreError::new(
                CoreErrorKind::Transport,
                format!("{} {} failed: {transport}", request.method, request.url),
            ));
        }
    };

    let status = response.status();
    let mut body = Vec::new();
    response
        .into_reader()
        .take(MAX_RESPONSE_BYTES)
        .read_to_end(&mut body)
        .map_err(|error| CoreError {
            status: Some(status),
            ..CoreError::new(
                CoreErrorKind::Transport,
                format!("failed to read response body: {error}"),
            )
        })?;

    Ok(HttpResponse { status, body })
}
