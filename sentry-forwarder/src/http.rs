use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use ::http::header::{COOKIE, HOST};
use ::http::{Request, Response, StatusCode};
use sentry_core::protocol;
use sentry_tower::{NewSentryLayer, NewSentryService};
use serde::{Deserialize, Serialize};
use tower_layer::{Layer, Stack};
use tower_service::Service;
use url::Url;

/// A request field the middleware can attach to events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestField {
    /// The HTTP method.
    Method,
    /// The full request URL.
    Url,
    /// The request body, when buffered into a [`RequestBody`] extension.
    Data,
    /// The encoded query string.
    QueryString,
    /// All request headers.
    Headers,
    /// The `Cookie` headers.
    Cookies,
}

/// Selects which request fields are attached to events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// The fields to attach.  Defaults to method, url, data and query string.
    pub request: Vec<RequestField>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            request: vec![
                RequestField::Method,
                RequestField::Url,
                RequestField::Data,
                RequestField::QueryString,
            ],
        }
    }
}

impl RequestOptions {
    /// Creates options attaching exactly the given fields.
    pub fn new<I: IntoIterator<Item = RequestField>>(fields: I) -> Self {
        RequestOptions {
            request: fields.into_iter().collect(),
        }
    }

    /// Whether a field is attached.
    pub fn contains(&self, field: RequestField) -> bool {
        self.request.contains(&field)
    }
}

/// A request body buffered by an upstream handler.
///
/// Tower request bodies are streams and are never read by the middleware.
/// Insert this extension to have the body reported as request `data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody(pub String);

/// Tower Layer that attaches the selected request fields to events.
///
/// The Service created by this Layer also starts a performance monitoring
/// transaction for each incoming request, continuing the trace based on
/// incoming distributed tracing headers.
#[derive(Clone)]
pub struct ForwarderHttpLayer {
    options: Arc<RequestOptions>,
    start_transaction: bool,
}

impl Default for ForwarderHttpLayer {
    fn default() -> Self {
        Self::new(RequestOptions::default())
    }
}

impl ForwarderHttpLayer {
    /// Creates a new Layer attaching the given fields and starting
    /// transactions.
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options: Arc::new(options),
            start_transaction: true,
        }
    }

    /// Enables or disables the per-request transaction.
    pub fn transactions(mut self, enabled: bool) -> Self {
        self.start_transaction = enabled;
        self
    }
}

/// Tower Service that attaches the selected request fields to events.
#[derive(Clone)]
pub struct ForwarderHttpService<S> {
    service: S,
    options: Arc<RequestOptions>,
    start_transaction: bool,
}

impl<S> Layer<S> for ForwarderHttpLayer {
    type Service = ForwarderHttpService<S>;

    fn layer(&self, service: S) -> Self::Service {
        Self::Service {
            service,
            options: self.options.clone(),
            start_transaction: self.start_transaction,
        }
    }
}

/// The Future returned from [`ForwarderHttpService`].
#[pin_project::pin_project]
pub struct ForwarderHttpFuture<F> {
    transaction: Option<(
        sentry_core::TransactionOrSpan,
        Option<sentry_core::TransactionOrSpan>,
    )>,
    #[pin]
    future: F,
}

impl<F, ResBody, Error> Future for ForwarderHttpFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, Error>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let slf = self.project();
        match slf.future.poll(cx) {
            Poll::Ready(res) => {
                if let Some((transaction, parent_span)) = slf.transaction.take() {
                    if transaction.get_status().is_none() {
                        let status = match &res {
                            Ok(res) => map_status(res.status()),
                            Err(_) => protocol::SpanStatus::UnknownError,
                        };
                        transaction.set_status(status);
                    }
                    transaction.finish();
                    sentry_core::configure_scope(|scope| scope.set_span(parent_span));
                }
                Poll::Ready(res)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ForwarderHttpService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ForwarderHttpFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let transaction = sentry_core::configure_scope(|scope| {
            let sentry_req = sentry_request_from_http(&request, &self.options);
            scope.add_event_processor(move |mut event| {
                if event.request.is_none() {
                    event.request = Some(sentry_req.clone());
                }
                Some(event)
            });

            if self.start_transaction {
                let headers = request.headers().into_iter().flat_map(|(header, value)| {
                    value.to_str().ok().map(|value| (header.as_str(), value))
                });
                let tx_name = format!("{} {}", request.method(), request.uri().path());
                let tx_ctx = sentry_core::TransactionContext::continue_from_headers(
                    &tx_name,
                    "http.server",
                    headers,
                );
                let transaction: sentry_core::TransactionOrSpan =
                    sentry_core::start_transaction(tx_ctx).into();
                let parent_span = scope.get_span();
                scope.set_span(Some(transaction.clone()));
                Some((transaction, parent_span))
            } else {
                None
            }
        });

        ForwarderHttpFuture {
            transaction,
            future: self.service.call(request),
        }
    }
}

/// The service produced by [`create_middleware`].
pub type ForwarderMiddleware<S, B> = NewSentryService<ForwarderHttpService<S>, Request<B>>;

/// The layer produced by [`middleware_layer`].
pub type ForwarderMiddlewareLayer<B> = Stack<ForwarderHttpLayer, NewSentryLayer<Request<B>>>;

/// Wraps a service so every request gets its own hub and a transaction, and
/// events captured while handling it carry the selected request fields.
///
/// Tags and breadcrumbs written by a [`LogForwarder`](crate::LogForwarder)
/// while a request is handled stay in that request's hub.
pub fn create_middleware<S, B>(service: S, options: RequestOptions) -> ForwarderMiddleware<S, B>
where
    S: Service<Request<B>>,
{
    NewSentryService::new_from_top(ForwarderHttpLayer::new(options).layer(service))
}

/// Returns the middleware of [`create_middleware`] as a layer.
///
/// The hub layer is the outer one, so the request fields and the transaction
/// land on the per-request hub.
pub fn middleware_layer<B>(options: RequestOptions) -> ForwarderMiddlewareLayer<B> {
    Stack::new(
        ForwarderHttpLayer::new(options),
        NewSentryLayer::<Request<B>>::new_from_top(),
    )
}

/// Build a Sentry request struct holding the selected fields.
fn sentry_request_from_http<B>(
    request: &Request<B>,
    options: &RequestOptions,
) -> protocol::Request {
    let mut sentry_req = protocol::Request::default();
    for field in &options.request {
        match field {
            RequestField::Method => sentry_req.method = Some(request.method().to_string()),
            RequestField::Url => sentry_req.url = request_url(request),
            RequestField::Data => {
                sentry_req.data = request
                    .extensions()
                    .get::<RequestBody>()
                    .map(|body| body.0.clone())
            }
            RequestField::QueryString => {
                sentry_req.query_string = request.uri().query().map(ToOwned::to_owned)
            }
            RequestField::Headers => {
                sentry_req.headers = request
                    .headers()
                    .iter()
                    .map(|(header, value)| {
                        (
                            header.to_string(),
                            value.to_str().unwrap_or_default().into(),
                        )
                    })
                    .collect()
            }
            RequestField::Cookies => {
                let cookies: Vec<&str> = request
                    .headers()
                    .get_all(COOKIE)
                    .iter()
                    .filter_map(|value| value.to_str().ok())
                    .collect();
                if !cookies.is_empty() {
                    sentry_req.cookies = Some(cookies.join("; "));
                }
            }
        }
    }
    sentry_req
}

/// Server requests usually carry only a path, so the host comes from the
/// `Host` header.
fn request_url<B>(request: &Request<B>) -> Option<Url> {
    let uri = request.uri();
    if uri.scheme().is_some() {
        return uri.to_string().parse().ok();
    }
    let host = uri
        .authority()
        .map(|authority| authority.as_str())
        .or_else(|| request.headers().get(HOST)?.to_str().ok())?;
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("http://{}{}", host, path).parse().ok()
}

fn map_status(status: StatusCode) -> protocol::SpanStatus {
    match status {
        StatusCode::UNAUTHORIZED => protocol::SpanStatus::Unauthenticated,
        StatusCode::FORBIDDEN => protocol::SpanStatus::PermissionDenied,
        StatusCode::NOT_FOUND => protocol::SpanStatus::NotFound,
        StatusCode::TOO_MANY_REQUESTS => protocol::SpanStatus::ResourceExhausted,
        status if status.is_client_error() => protocol::SpanStatus::InvalidArgument,
        StatusCode::NOT_IMPLEMENTED => protocol::SpanStatus::Unimplemented,
        StatusCode::SERVICE_UNAVAILABLE => protocol::SpanStatus::Unavailable,
        status if status.is_server_error() => protocol::SpanStatus::InternalError,
        StatusCode::CONFLICT => protocol::SpanStatus::AlreadyExists,
        status if status.is_success() => protocol::SpanStatus::Ok,
        _ => protocol::SpanStatus::UnknownError,
    }
}
