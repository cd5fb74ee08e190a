pub mod guards;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod session;
pub mod storage;

pub use session::{ProfileLoader, ReferenceDataLoader, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
