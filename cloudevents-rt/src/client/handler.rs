//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Handler adaptation.
//!
//! A handler is an async function taking any ordered subset of
//! ([`RequestContext`], [`Event`], [`EventResponse`]) and returning either
//! `()` or `Result<(), E>`. That gives sixteen accepted shapes; anything
//! else is rejected by the compiler when the handler is registered.

use crate::event::Event;
use crate::observability::{Measure, report};
use crate::transport::{EventResponse, HandlerError, Receiver, RequestContext};
use futures_util::future::BoxFuture;
use std::future::Future;
use std::marker::PhantomData;
use tracing::Instrument;

/// Return types a handler may produce.
pub trait HandlerResult: Send {
    /// Normalizes the return value.
    fn into_result(self) -> Result<(), HandlerError>;
}

impl HandlerResult for () {
    fn into_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> HandlerResult for Result<(), E>
where
    E: Into<HandlerError> + Send,
{
    fn into_result(self) -> Result<(), HandlerError> {
        self.map_err(Into::into)
    }
}

/// An async function usable as an event handler.
///
/// `Args` is the tuple of parameter kinds the function takes and is
/// inferred at registration.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::client::Handler;
/// use cloudevents_rt::event::Event;
/// use cloudevents_rt::transport::{EventResponse, RequestContext};
///
/// fn accepts<Args, H: Handler<Args>>(_handler: H) {}
///
/// accepts(|| async {});
/// accepts(|event: Event| async move { println!("{}", event.id()) });
/// accepts(|_ctx: RequestContext, event: Event, response: EventResponse| async move {
///     response.respond(event);
///     Ok::<(), std::io::Error>(())
/// });
/// ```
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// Invokes the handler with the parts its shape asks for.
    fn call(
        &self,
        ctx: RequestContext,
        event: Event,
        response: EventResponse,
    ) -> BoxFuture<'static, Result<(), HandlerError>>;
}

macro_rules! impl_handler {
    (($($arg:ty),*), |$ctx:pat_param, $event:pat_param, $response:pat_param| ($($call:expr),*)) => {
        impl<F, Fut, R> Handler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: HandlerResult,
        {
            fn call(
                &self,
                $ctx: RequestContext,
                $event: Event,
                $response: EventResponse,
            ) -> BoxFuture<'static, Result<(), HandlerError>> {
                let fut = (self)($($call),*);
                Box::pin(async move { fut.await.into_result() })
            }
        }
    };
}

impl_handler!((), |_, _, _| ());
impl_handler!((RequestContext), |ctx, _, _| (ctx));
impl_handler!((Event), |_, event, _| (event));
impl_handler!((EventResponse), |_, _, response| (response));
impl_handler!((RequestContext, Event), |ctx, event, _| (ctx, event));
impl_handler!((RequestContext, EventResponse), |ctx, _, response| (ctx, response));
impl_handler!((Event, EventResponse), |_, event, response| (event, response));
impl_handler!(
    (RequestContext, Event, EventResponse),
    |ctx, event, response| (ctx, event, response)
);

/// Adapts a [`Handler`] into the transport's [`Receiver`].
pub(crate) struct HandlerReceiver<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> HandlerReceiver<H, Args> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<H, Args> Receiver for HandlerReceiver<H, Args>
where
    H: Handler<Args>,
    Args: 'static,
{
    async fn receive(
        &self,
        ctx: RequestContext,
        event: Event,
        response: EventResponse,
    ) -> Result<(), HandlerError> {
        let reporter = report(Measure::Client, "receive");
        let span = reporter.span().clone();
        let result = self
            .handler
            .call(ctx, event, response)
            .instrument(span)
            .await;
        reporter.result(&result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SpecVersion;
    use crate::transport::dispatch::Dispatcher;
    use std::fmt;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> Event {
        let mut e = Event::new(SpecVersion::V10);
        e.set_id("ABC-123");
        e
    }

    async fn drive<Args: 'static, H: Handler<Args>>(handler: H) -> Result<(), HandlerError> {
        HandlerReceiver::new(handler)
            .receive(RequestContext::new(), event(), EventResponse::new())
            .await
    }

    #[tokio::test]
    async fn test_every_shape_is_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        macro_rules! counted {
            (|$($p:ident: $t:ty),*| $ret:expr) => {{
                let calls = calls.clone();
                move |$($p: $t),*| {
                    let calls = calls.clone();
                    async move {
                        $(let _ = &$p;)*
                        calls.fetch_add(1, Ordering::SeqCst);
                        $ret
                    }
                }
            }};
        }
        type Res = Result<(), io::Error>;

        drive(counted!(| | ())).await.unwrap();
        drive(counted!(| | Res::Ok(()))).await.unwrap();
        drive(counted!(|c: RequestContext| ())).await.unwrap();
        drive(counted!(|c: RequestContext| Res::Ok(()))).await.unwrap();
        drive(counted!(|e: Event| ())).await.unwrap();
        drive(counted!(|e: Event| Res::Ok(()))).await.unwrap();
        drive(counted!(|r: EventResponse| ())).await.unwrap();
        drive(counted!(|r: EventResponse| Res::Ok(()))).await.unwrap();
        drive(counted!(|c: RequestContext, e: Event| ())).await.unwrap();
        drive(counted!(|c: RequestContext, e: Event| Res::Ok(()))).await.unwrap();
        drive(counted!(|c: RequestContext, r: EventResponse| ())).await.unwrap();
        drive(counted!(|c: RequestContext, r: EventResponse| Res::Ok(()))).await.unwrap();
        drive(counted!(|e: Event, r: EventResponse| ())).await.unwrap();
        drive(counted!(|e: Event, r: EventResponse| Res::Ok(()))).await.unwrap();
        drive(counted!(|c: RequestContext, e: Event, r: EventResponse| ())).await.unwrap();
        drive(counted!(|c: RequestContext, e: Event, r: EventResponse| Res::Ok(())))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let result = drive(|_: Event| async { Err::<(), _>(io::Error::other("nope")) }).await;
        assert_eq!(result.unwrap_err().to_string(), "nope");
    }

    /// Counts `handler failed` log events.
    struct FailureLogs(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FailureLogs {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct IsFailure(bool);
            impl tracing::field::Visit for IsFailure {
                fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
                    if field.name() == "message" && format!("{value:?}") == "handler failed" {
                        self.0 = true;
                    }
                }
            }
            let mut visitor = IsFailure(false);
            event.record(&mut visitor);
            if visitor.0 {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_failure_is_logged_once() {
        use tracing_subscriber::layer::SubscriberExt;

        let logged = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(FailureLogs(logged.clone()));
        let _default = tracing::subscriber::set_default(subscriber);

        let dispatcher = Dispatcher::default();
        dispatcher.set_receiver(Arc::new(HandlerReceiver::new(|_: Event| async {
            Err::<(), _>(io::Error::other("nope"))
        })));
        let delivery = dispatcher.deliver(&RequestContext::new(), vec![event()]).await;

        assert_eq!(delivery.error.unwrap().to_string(), "nope");
        assert_eq!(logged.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_is_shared() {
        let response = EventResponse::new();
        HandlerReceiver::new(|event: Event, response: EventResponse| async move {
            response.respond(event);
        })
        .receive(RequestContext::new(), event(), response.clone())
        .await
        .unwrap();
        assert_eq!(response.event().map(|e| e.id().to_string()), Some("ABC-123".into()));
    }
}
