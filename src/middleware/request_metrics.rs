//! Request instrumentation middleware.
//!
//! Every request passes through [`track_http_requests`]. The start time is
//! taken before the rest of the stack runs, and the observation is recorded
//! once the response body has been fully produced, so the measured duration
//! covers handler work plus body streaming (e.g. a static file read).
//!
//! A body counts as fully produced when it reaches end-of-stream, or when
//! its declared length has been yielded: the server stops polling a body
//! with a `Content-Length` after the last byte and then drops it. Responses
//! to `HEAD` carry no body and are recorded when it is dropped. Responses
//! whose body errors or is dropped short (client gone) are not recorded.

use crate::app_state::AppState;
use crate::domain::{MetricsPtr, Observation};
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

/// Axum middleware recording one count and one duration per completed request.
///
/// Labels: the method as received, the raw path without query string, and
/// the final status code. The request and response pass through unchanged.
pub(crate) async fn track_http_requests(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // ---
    let start = Instant::now();
    let head = req.method() == Method::HEAD;
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let pending = PendingObservation {
        metrics: state.metrics().clone(),
        method,
        path,
        status: response.status().as_u16(),
        start,
    };
    let length = declared_length(&response);

    response.map(|body| Body::new(InstrumentedBody::new(body, pending, length, head)))
}

/// Body length known up front, from the body itself or its `Content-Length`.
fn declared_length(response: &Response) -> Option<u64> {
    response.body().size_hint().exact().or_else(|| {
        response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    })
}

/// Everything needed to record a request once its body completes.
struct PendingObservation {
    metrics: MetricsPtr,
    method: String,
    path: String,
    status: u16,
    start: Instant,
}

impl PendingObservation {
    fn record(self) {
        // ---
        let observation = Observation {
            duration: self.start.elapsed(),
            method: self.method,
            path: self.path,
            status: self.status,
        };
        tracing::trace!(?observation, "Recording HTTP request");
        self.metrics.record_http_request(&observation);
    }
}

/// Response body wrapper that records its [`PendingObservation`] once the
/// body is complete.
struct InstrumentedBody {
    inner: Body,
    pending: Option<PendingObservation>,
    length: Option<u64>,
    sent: u64,
    head: bool,
}

impl InstrumentedBody {
    fn new(inner: Body, pending: PendingObservation, length: Option<u64>, head: bool) -> Self {
        Self {
            inner,
            pending: Some(pending),
            length,
            sent: 0,
            head,
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.record();
        }
    }

    fn is_complete(&self) -> bool {
        self.head
            || self.inner.is_end_stream()
            || self.length.is_some_and(|length| self.sent >= length)
    }
}

impl HttpBody for InstrumentedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        // ---
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.sent += data.len() as u64;
                    if this.length.is_some_and(|length| this.sent >= length) {
                        this.finish();
                    }
                }
            }
            Poll::Ready(Some(Err(err))) => {
                tracing::debug!(error = %err, "Response body failed; request not recorded");
                this.pending = None;
            }
            Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for InstrumentedBody {
    fn drop(&mut self) {
        if self.is_complete() {
            self.finish();
        }
    }
}
