pub mod arc;
pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod opt;
pub mod two_q;

pub use arc::ArcCache;
pub use fifo::FifoCache;
pub use lfu::LfuCache;
pub use lru::LruCache;
pub use opt::OptCache;
pub use two_q::{TwoQCache, TwoQConfig};
