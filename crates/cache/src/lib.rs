//! 行情缓存的内存实现。

pub mod mem;

pub use mem::MemCache;
