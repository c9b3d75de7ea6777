use super::{
    errors::Error,
    result::DispatchResult,
};
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
};
use tokio::time::Duration;
use futures::stream::{FuturesUnordered, StreamExt};


type ReadyCallback<T> = Box<dyn FnOnce(DispatchResult<T>) + Send + 'static>;

enum State<T> {
    Pending {
        waker: Option<Waker>,
        callback: Option<ReadyCallback<T>>,
    },
    Ready(Option<DispatchResult<T>>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, outcome: DispatchResult<T>) {
        let mut guard = self.lock();
        match std::mem::replace(&mut *guard, State::Ready(None)) {
            // single-assignment: повторная доставка отбрасывается
            State::Ready(prev) => *guard = State::Ready(prev),
            State::Pending { waker, callback: Some(callback) } => {
                drop(guard);
                callback(outcome);
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
            State::Pending { waker, callback: None } => {
                *guard = State::Ready(Some(outcome));
                drop(guard);
                self.cond.notify_all();
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
        }
    }
}


/// Producer-половина: воркер доставляет исход ровно один раз
pub(crate) struct Completer<T> {
    shared: Arc<Shared<T>>,
    delivered: bool,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: DispatchResult<T>) {
        self.delivered = true;
        self.shared.deliver(outcome);
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.delivered {
            self.shared.deliver(Err(Error::Dropped));
        }
    }
}


/// Handle на диспетчеризованный вызов: блокирующее ожидание с таймаутом,
/// неблокирующий опрос, callback по готовности и await
pub struct Handle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Handle<T> {
    pub(crate) fn channel() -> (Completer<T>, Handle<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Pending {
                waker: None,
                callback: None,
            }),
            cond: Condvar::new(),
        });
        (
            Completer {
                shared: shared.clone(),
                delivered: false,
            },
            Handle { shared },
        )
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.lock(), State::Ready(_))
    }

    /// Неблокирующий опрос; None пока результат не доставлен
    pub fn try_result(&mut self) -> Option<DispatchResult<T>> {
        let mut guard = self.shared.lock();
        match &mut *guard {
            State::Ready(slot) => Some(slot.take().unwrap_or(Err(Error::Dropped))),
            State::Pending { .. } => None,
        }
    }

    /// Блокирующее ожидание результата
    pub fn wait(self) -> DispatchResult<T> {
        let guard = self.shared.lock();
        let mut guard = self
            .shared
            .cond
            .wait_while(guard, |state| matches!(state, State::Pending { .. }))
            .unwrap_or_else(PoisonError::into_inner);
        match &mut *guard {
            State::Ready(slot) => slot.take().unwrap_or(Err(Error::Dropped)),
            State::Pending { .. } => Err(Error::Dropped),
        }
    }

    /// Блокирующее ожидание с таймаутом
    pub fn wait_timeout(self, timeout: Duration) -> DispatchResult<T> {
        let guard = self.shared.lock();
        let (mut guard, _) = self
            .shared
            .cond
            .wait_timeout_while(guard, timeout, |state| {
                matches!(state, State::Pending { .. })
            })
            .unwrap_or_else(PoisonError::into_inner);
        match &mut *guard {
            State::Ready(slot) => slot.take().unwrap_or(Err(Error::Dropped)),
            State::Pending { .. } => Err(Error::WaitTimeout),
        }
    }

    /// Callback по готовности; выполняется на воркере, либо сразу на
    /// вызывающем потоке, если результат уже доставлен
    pub fn on_ready<F>(self, f: F)
    where
        F: FnOnce(DispatchResult<T>) + Send + 'static,
    {
        let mut guard = self.shared.lock();
        match &mut *guard {
            State::Ready(slot) => {
                let outcome = slot.take().unwrap_or(Err(Error::Dropped));
                drop(guard);
                f(outcome);
            }
            State::Pending { callback, .. } => {
                *callback = Some(Box::new(f));
            }
        }
    }

    pub async fn await_timeout(self, timeout: Duration) -> DispatchResult<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(Error::WaitTimeout),
        }
    }
}

impl<T> Future for Handle<T> {
    type Output = DispatchResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut guard = this.shared.lock();
        match &mut *guard {
            State::Ready(slot) => Poll::Ready(slot.take().unwrap_or(Err(Error::Dropped))),
            State::Pending { waker, .. } => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Ожидание пакета handle'ов; порядок результатов не гарантируется
pub async fn join_handles<T>(handles: Vec<Handle<T>>) -> Vec<DispatchResult<T>> {
    if handles.is_empty() {
        return Vec::new();
    }

    let len = handles.len();
    let mut futures = FuturesUnordered::from_iter(handles);
    let mut results = Vec::with_capacity(len);

    while let Some(result) = futures.next().await {
        results.push(result);
    }

    results
}
