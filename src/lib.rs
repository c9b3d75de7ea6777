//! Неблокирующая обёртка над блокирующим HTTP-клиентом
//!
//! # Features
//! - Диспетчеризация блокирующих вызовов на пул воркеров, результат через Handle
//! - Эластичный пул: ленивый рост до максимума, увольнение простаивающих воркеров
//! - Background callback на воркере до доставки результата
//! - Graceful shutdown с drain и детерминированное закрытие сессии
//! - Ошибки вызова и hook'а доставляются через Handle, не теряются
//! - Метрики пула

pub mod dispatcher;
pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod result;
pub mod session;
pub mod transport;

pub use handle::Handle;
pub use pool::{Config, WorkerPool, WorkerPoolInner};
pub use session::Session;
