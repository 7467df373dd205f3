//! Deduplication of concurrent calls.

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use lunch_shared::ApiError;
use tokio::sync::Mutex;

type SharedCall = Shared<BoxFuture<'static, Result<(), ApiError>>>;

/// Holds the call currently in flight, if any.
///
/// A caller arriving while a call is pending awaits that same call instead of
/// starting another one. Once it settles the slot is cleared, so the next
/// caller starts fresh.
#[derive(Default)]
pub struct InFlight {
    slot: Mutex<Option<SharedCall>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F>(&self, start: impl FnOnce() -> F) -> Result<(), ApiError>
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let call = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some(call) => call.clone(),
                None => {
                    let call = start().boxed().shared();
                    *slot = Some(call.clone());
                    call
                }
            }
        };

        let result = call.clone().await;

        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&call)) {
            *slot = None;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn concurrent_callers_share_one_call() {
        let flight = InFlight::new();
        let started = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let call = || {
            let started = started.clone();
            let gate = gate.clone();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Err(ApiError::Server("boom".into()))
            }
        };

        let (a, b, _) = tokio::join!(flight.run(call), flight.run(call), async {
            gate.notify_one();
        });

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(a, Err(ApiError::Server("boom".into())));
        assert_eq!(a, b);
        assert!(flight.slot.lock().await.is_none());
    }

    #[tokio::test]
    async fn settled_call_is_not_reused() {
        let flight = InFlight::new();
        let started = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let started = started.clone();
            flight
                .run(move || async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
        }

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }
}
