//! ext_proc `Process`: a bidirectional stream of HTTP lifecycle events.
//!
//! Only request headers are authorized. Every other event is acknowledged
//! with the response shape Envoy expects for it and nothing else. A denial
//! is sent as an immediate response in place of the headers response.

use futures::stream::{self, BoxStream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::authz::{Authorizer, Decision};
use crate::error::AuthError;
use crate::grpc::response::{
    continue_body, continue_headers, empty_trailers, immediate_denied, request_headers_allowed,
};
use crate::proto::envoy::service::ext_proc::v3::external_processor_server::ExternalProcessor;
use crate::proto::envoy::service::ext_proc::v3::{
    HttpHeaders, ProcessingRequest, ProcessingResponse, processing_request, processing_response,
};

/// Inbound event types of the processing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Request headers, the only event that is authorized
    RequestHeaders,
    /// Upstream response headers
    ResponseHeaders,
    /// Request body chunk
    RequestBody,
    /// Response body chunk
    ResponseBody,
    /// Request trailers
    RequestTrailers,
    /// Response trailers
    ResponseTrailers,
}

impl EventKind {
    /// Every event kind, in lifecycle order.
    pub const ALL: [EventKind; 6] = [
        EventKind::RequestHeaders,
        EventKind::ResponseHeaders,
        EventKind::RequestBody,
        EventKind::ResponseBody,
        EventKind::RequestTrailers,
        EventKind::ResponseTrailers,
    ];

    /// Kind of an inbound message, `None` when its oneof is unset.
    pub fn of(request: &ProcessingRequest) -> Option<Self> {
        use processing_request::Request as In;

        let kind = match request.request.as_ref()? {
            In::RequestHeaders(_) => Self::RequestHeaders,
            In::ResponseHeaders(_) => Self::ResponseHeaders,
            In::RequestBody(_) => Self::RequestBody,
            In::ResponseBody(_) => Self::ResponseBody,
            In::RequestTrailers(_) => Self::RequestTrailers,
            In::ResponseTrailers(_) => Self::ResponseTrailers,
        };
        Some(kind)
    }

    /// Response for an event that is let through untouched.
    ///
    /// Headers and bodies get a `CONTINUE` common response; trailers get an
    /// empty trailers response.
    pub fn pass_through(self) -> ProcessingResponse {
        use processing_response::Response as Out;

        let response = match self {
            Self::RequestHeaders => Out::RequestHeaders(continue_headers()),
            Self::ResponseHeaders => Out::ResponseHeaders(continue_headers()),
            Self::RequestBody => Out::RequestBody(continue_body()),
            Self::ResponseBody => Out::ResponseBody(continue_body()),
            Self::RequestTrailers => Out::RequestTrailers(empty_trailers()),
            Self::ResponseTrailers => Out::ResponseTrailers(empty_trailers()),
        };
        ProcessingResponse {
            response: Some(response),
        }
    }
}

/// Authorization progress of the exchange carried by one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    /// No request headers seen yet
    #[default]
    Undecided,
    /// Request headers were authorized; everything else passes through
    Allowed,
    /// An immediate response was sent; the exchange is over
    Denied,
}

/// Lifecycle of one processing stream.
enum StreamState {
    Open {
        inbound: BoxStream<'static, Result<ProcessingRequest, Status>>,
        phase: ExchangePhase,
    },
    Closed,
}

/// Envoy `ExternalProcessor` service backed by the shared [`Authorizer`].
#[derive(Debug, Clone)]
pub struct ProcessService {
    authorizer: Authorizer,
}

impl ProcessService {
    /// Creates the service
    pub fn new(authorizer: Authorizer) -> Self {
        Self { authorizer }
    }

    /// Response for one inbound event, `None` if the event carries nothing.
    ///
    /// Only the first request headers of an undecided exchange run the
    /// authorizer and move `phase` forward. Once decided, request headers are
    /// acknowledged like any other event.
    pub fn handle(
        &self,
        request: &ProcessingRequest,
        phase: &mut ExchangePhase,
    ) -> Option<ProcessingResponse> {
        if let Some(processing_request::Request::RequestHeaders(headers)) = &request.request {
            if *phase == ExchangePhase::Undecided {
                let (response, decided) = self.on_request_headers(headers);
                *phase = decided;
                return Some(response);
            }
        }
        EventKind::of(request).map(EventKind::pass_through)
    }

    fn on_request_headers(&self, headers: &HttpHeaders) -> (ProcessingResponse, ExchangePhase) {
        let decision = match &headers.headers {
            Some(header_map) => self.authorizer.authorize(header_map),
            None => Decision::Rejected {
                reason: AuthError::AuthorizationMissing,
            },
        };

        match decision {
            Decision::Identity { subject } => {
                info!(subject = %subject, "Request authorized");
                (request_headers_allowed(&subject), ExchangePhase::Allowed)
            }
            Decision::Rejected { reason } => {
                warn!(
                    error_code = reason.code().as_str(),
                    stage = reason.stage(),
                    reason = %reason,
                    "Request denied"
                );
                (immediate_denied(&reason), ExchangePhase::Denied)
            }
        }
    }

    /// Drives one processing stream until the peer closes it or it fails.
    ///
    /// A clean end of input ends the output without error. A receive error
    /// is forwarded as the final item and closes the stream. A denial is the
    /// final item as well; nothing after it is read.
    pub fn process_stream<S>(
        &self,
        inbound: S,
        correlation_id: Uuid,
    ) -> BoxStream<'static, Result<ProcessingResponse, Status>>
    where
        S: futures::Stream<Item = Result<ProcessingRequest, Status>> + Send + 'static,
    {
        let service = self.clone();
        let span = info_span!("process", correlation_id = %correlation_id);
        let initial = StreamState::Open {
            inbound: inbound.boxed(),
            phase: ExchangePhase::Undecided,
        };

        stream::unfold(initial, move |state| {
            let service = service.clone();
            async move {
                let StreamState::Open {
                    mut inbound,
                    mut phase,
                } = state
                else {
                    return None;
                };

                loop {
                    match inbound.next().await {
                        None => {
                            debug!("Processing stream closed by peer");
                            return None;
                        }
                        Some(Err(status)) => {
                            warn!(code = ?status.code(), "Processing stream receive failed");
                            return Some((Err(status), StreamState::Closed));
                        }
                        Some(Ok(request)) => {
                            let Some(response) = service.handle(&request, &mut phase) else {
                                debug!("Skipping processing request without payload");
                                continue;
                            };
                            let next = match phase {
                                ExchangePhase::Denied => StreamState::Closed,
                                _ => StreamState::Open { inbound, phase },
                            };
                            return Some((Ok(response), next));
                        }
                    }
                }
            }
            .instrument(span.clone())
        })
        .boxed()
    }
}

#[tonic::async_trait]
impl ExternalProcessor for ProcessService {
    type ProcessStream = BoxStream<'static, Result<ProcessingResponse, Status>>;

    async fn process(
        &self,
        request: Request<Streaming<ProcessingRequest>>,
    ) -> Result<Response<Self::ProcessStream>, Status> {
        let correlation_id = Uuid::new_v4();
        debug!(correlation_id = %correlation_id, "Processing stream opened");

        Ok(Response::new(
            self.process_stream(request.into_inner(), correlation_id),
        ))
    }
}
