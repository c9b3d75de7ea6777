use super::{
    errors::Error,
    handle::{Completer, Handle},
    pool::Job,
    result::DispatchResult,
    session::Session,
    transport::{Request, Response, SharedTransport},
};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    time::Duration,
};
use tracing::debug;


type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Пост-обработка на воркере после блокирующего вызова, до доставки.
/// Возвращаемое значение и есть то, что будет доставлено в Handle.
pub type BackgroundCallback = Box<dyn FnOnce(Response) -> Result<Response, BoxError> + Send + 'static>;


/// Builder одного вызова: параметры запроса плюс background callback.
/// send() ставит вызов в пул и немедленно возвращает Handle.
pub struct RequestBuilder<'a> {
    session: &'a Session,
    request: Request,
    callback: Option<BackgroundCallback>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(session: &'a Session, request: Request) -> Self {
        Self {
            session,
            request,
            callback: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// JSON-тело; заодно выставляет Content-Type
    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.request
            .headers
            .push(("content-type".into(), "application/json".into()));
        self.request.body = Some(value.to_string().into_bytes());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    pub fn background_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Response) -> Result<Response, BoxError> + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Каждый успешный send даёт ровно один Handle, который будет разрешён
    /// ровно один раз. При закрытом пуле или сессии ошибка синхронная —
    /// повисших Pending-handle не бывает.
    pub fn send(self) -> DispatchResult<Handle<Response>> {
        if self.session.is_closed() {
            return Err(Error::PoolClosed);
        }

        let (completer, handle) = Handle::channel();
        let job = HttpJob {
            transport: self.session.transport(),
            request: self.request,
            callback: self.callback,
            completer,
        };
        self.session.pool().submit(Box::new(job))?;
        Ok(handle)
    }
}


/// Рабочая единица: блокирующий вызов, hook и доставка исхода.
/// Ошибка вызова, hook'а или паника не уходит дальше воркера — она
/// доставляется в Handle и всплывает только у потребителя.
struct HttpJob {
    transport: SharedTransport,
    request: Request,
    callback: Option<BackgroundCallback>,
    completer: Completer<Response>,
}

impl Job for HttpJob {
    fn run(self: Box<Self>) -> bool {
        let HttpJob {
            transport,
            request,
            callback,
            completer,
        } = *self;

        let outcome = catch_unwind(AssertUnwindSafe(
            move || -> DispatchResult<Response> {
                let response = transport.execute(request).map_err(Error::Call)?;
                match callback {
                    Some(callback) => callback(response).map_err(|e| Error::Hook(e.to_string())),
                    None => Ok(response),
                }
            },
        ));

        let outcome = outcome.unwrap_or_else(|panic| Err(Error::Panic(panic_message(&*panic))));
        if let Err(e) = &outcome {
            debug!("call failed on worker: {e}");
        }

        let delivered = outcome.is_ok();
        completer.complete(outcome);
        delivered
    }

    fn discard(self: Box<Self>) {
        let HttpJob { completer, .. } = *self;
        completer.complete(Err(Error::PoolShutdown));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in worker".to_string()
    }
}
