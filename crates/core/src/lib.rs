//! # bolsa-core
//!
//! 行情监控系统的领域内核：实体、错误与端口 (Port) 定义。
//! 本 crate 不包含任何 I/O 实现，所有具体适配器由外围 crate 注入。

pub mod config;

pub mod common;

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod analysis {
    pub mod entity;
    pub mod error;
}

pub mod cache {
    pub mod error;
    pub mod port;
}

pub mod notify {
    pub mod error;
    pub mod port;
}
