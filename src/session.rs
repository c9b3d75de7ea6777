use super::{
    dispatcher::RequestBuilder,
    model::PoolMetrics,
    pool::{Config, WorkerPool, WorkerPoolInner},
    transport::{HttpTransport, Method, Request, SharedTransport},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::debug;


/// Фасад над пулом воркеров и разделяемым транспортом: по одному методу
/// диспетчеризации на HTTP-глагол. Сессия не хранит состояние вызовов,
/// один экземпляр обслуживает сколько угодно конкурентных потоков.
///
/// Закрытие детерминированное: явный close() или выход из области
/// видимости (Drop). Свой пул гасится с drain, общий остаётся жить.
pub struct Session {
    pool: WorkerPool,
    owns_pool: bool,
    transport: SharedTransport,
    closed: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Свой пул с заданными границами числа воркеров
    pub fn with_config(config: Config) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Общий пул, разделяемый несколькими сессиями
    pub fn with_pool(pool: WorkerPool) -> Self {
        Self::with_pool_and_transport(pool, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: Config, transport: SharedTransport) -> Self {
        Self {
            pool: WorkerPoolInner::with_config(config),
            owns_pool: true,
            transport,
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_pool_and_transport(pool: WorkerPool, transport: SharedTransport) -> Self {
        Self {
            pool,
            owns_pool: false,
            transport,
            closed: AtomicBool::new(false),
        }
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Post, url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Put, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Delete, url)
    }

    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Head, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Patch, url)
    }

    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::Options, url)
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Request::new(method, url))
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.pool.is_closed()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub(crate) fn transport(&self) -> SharedTransport {
        self.transport.clone()
    }

    /// Идемпотентное закрытие; вызывается и из Drop
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.owns_pool {
            self.pool.shutdown(true);
        }
        debug!("session closed");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
