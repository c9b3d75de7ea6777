use super::{
    errors::Error,
    model::PoolMetrics,
    result::DispatchResult,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};


/// Единица работы: потребляется воркером ровно один раз
pub trait Job: Send + 'static {
    /// Выполнить на воркере; возвращает, была ли доставка успешной
    fn run(self: Box<Self>) -> bool;
    /// Отбросить без выполнения (shutdown без drain)
    fn discard(self: Box<Self>);
}

pub type WorkItem = Box<dyn Job>;


/// Конфигурация пула воркеров
#[derive(Debug, Clone)]
pub struct Config {
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            min_workers: 2,
            max_workers: num_cpus * 2, // блокирующий I/O, воркеров больше ядер
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn sized(min_workers: usize, max_workers: usize) -> Self {
        Self {
            min_workers,
            max_workers,
            ..Default::default()
        }
    }

    fn normalized(mut self) -> Self {
        if self.max_workers == 0 {
            self.max_workers = 1;
        }
        if self.min_workers > self.max_workers {
            self.min_workers = self.max_workers;
        }
        self
    }
}


pub type WorkerPool = Arc<WorkerPoolInner>;

#[inline(always)]
fn unlikely(b: bool) -> bool {
    #[cold]
    fn cold() {}
    if !b { cold() }
    b
}

/// Пул воркеров над общей очередью блокирующих вызовов.
/// Число воркеров плавает между min_workers и max_workers: рост ленивый,
/// простаивающие воркеры увольняются по idle_timeout.
pub struct WorkerPoolInner {
    tx: Mutex<Option<Sender<WorkItem>>>,
    rx: Receiver<WorkItem>,
    closed: CancellationToken,
    live_workers: AtomicUsize,
    idle_workers: AtomicUsize,
    queued_items: AtomicUsize,
    active_items: AtomicUsize,
    total_dispatched: AtomicUsize,
    completed_items: AtomicUsize,
    failed_items: AtomicUsize,
    worker_seq: AtomicUsize,
    threads: Mutex<Vec<thread::JoinHandle<()>>>,
    config: Config,
}

impl WorkerPoolInner {
    pub fn new(min_workers: usize, max_workers: usize) -> WorkerPool {
        Self::with_config(Config::sized(min_workers, max_workers))
    }

    pub fn with_config(config: Config) -> WorkerPool {
        let config = config.normalized();
        let (tx, rx) = channel::unbounded();

        let pool = Arc::new(WorkerPoolInner {
            tx: Mutex::new(Some(tx)),
            rx,
            closed: CancellationToken::new(),
            live_workers: AtomicUsize::new(0),
            idle_workers: AtomicUsize::new(0),
            queued_items: AtomicUsize::new(0),
            active_items: AtomicUsize::new(0),
            total_dispatched: AtomicUsize::new(0),
            completed_items: AtomicUsize::new(0),
            failed_items: AtomicUsize::new(0),
            worker_seq: AtomicUsize::new(0),
            threads: Mutex::new(Vec::new()),
            config,
        });

        for _ in 0..pool.config.min_workers {
            pool.try_spawn_worker();
        }

        pool
    }

    /// Поставить работу в очередь; вызывающего не блокирует
    pub fn submit(self: &Arc<Self>, item: WorkItem) -> DispatchResult<()> {
        if unlikely(self.closed.is_cancelled()) {
            return Err(Error::PoolClosed);
        }
        let tx = {
            let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(tx) => tx.clone(),
                None => return Err(Error::PoolClosed),
            }
        };

        self.queued_items.fetch_add(1, Ordering::Relaxed);
        self.total_dispatched.fetch_add(1, Ordering::Relaxed);
        if tx.send(item).is_err() {
            self.queued_items.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::PoolClosed);
        }

        if self.idle_workers.load(Ordering::Relaxed) == 0 {
            self.try_spawn_worker();
        }
        Ok(())
    }

    fn try_spawn_worker(self: &Arc<Self>) {
        loop {
            let live = self.live_workers.load(Ordering::Acquire);
            if live >= self.config.max_workers {
                return;
            }
            if self
                .live_workers
                .compare_exchange(live, live + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        let id = self.worker_seq.fetch_add(1, Ordering::Relaxed);
        let pool = Arc::clone(self);
        let rx = self.rx.clone();
        let spawned = thread::Builder::new()
            .name(format!("async-requests-{id}"))
            .spawn(move || pool.worker_loop(id, rx));

        match spawned {
            Ok(handle) => self
                .threads
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle),
            Err(e) => {
                self.live_workers.fetch_sub(1, Ordering::Release);
                error!(worker = id, "failed to spawn worker thread: {e}");
            }
        }
    }

    // Единственное место, где обёрнутый блокирующий вызов действительно блокирует
    fn worker_loop(&self, id: usize, rx: Receiver<WorkItem>) {
        debug!(worker = id, "worker started");
        loop {
            self.idle_workers.fetch_add(1, Ordering::Release);
            let item = rx.recv_timeout(self.config.idle_timeout);
            self.idle_workers.fetch_sub(1, Ordering::Release);

            match item {
                Ok(item) => {
                    self.queued_items.fetch_sub(1, Ordering::Relaxed);
                    self.active_items.fetch_add(1, Ordering::Relaxed);
                    let delivered = item.run();
                    self.active_items.fetch_sub(1, Ordering::Release);
                    if delivered {
                        self.completed_items.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.failed_items.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // увольнение до min_workers
                    let live = self.live_workers.load(Ordering::Acquire);
                    if live > self.config.min_workers
                        && self
                            .live_workers
                            .compare_exchange(live, live - 1, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                    {
                        debug!(worker = id, "idle worker retired");
                        return;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.live_workers.fetch_sub(1, Ordering::Release);
        debug!(worker = id, "worker stopped");
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Остановка пула: новые submit отклоняются. С wait_for_drain блокирует
    /// вызывающего до завершения всей работы и join'ит воркеров; без drain
    /// ещё не начатые элементы отбрасываются (их handle получает
    /// PoolShutdown), а уже выполняющиеся довершаются.
    pub fn shutdown(&self, wait_for_drain: bool) {
        self.closed.cancel();
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if tx.is_none() {
            return; // уже остановлен
        }

        if !wait_for_drain {
            while let Ok(item) = self.rx.try_recv() {
                self.queued_items.fetch_sub(1, Ordering::Relaxed);
                self.failed_items.fetch_add(1, Ordering::Relaxed);
                item.discard();
            }
        }
        drop(tx);

        if wait_for_drain {
            let handles: Vec<_> = {
                let mut guard = self.threads.lock().unwrap_or_else(PoisonError::into_inner);
                guard.drain(..).collect()
            };
            for handle in handles {
                let _ = handle.join();
            }
            debug!("pool drained");
        }
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            live_workers: self.live_workers.load(Ordering::Relaxed),
            idle_workers: self.idle_workers.load(Ordering::Relaxed),
            queued_items: self.queued_items.load(Ordering::Relaxed),
            active_items: self.active_items.load(Ordering::Relaxed),
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            completed_items: self.completed_items.load(Ordering::Relaxed),
            failed_items: self.failed_items.load(Ordering::Relaxed),
        }
    }
}
