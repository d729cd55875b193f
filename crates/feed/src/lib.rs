//! # bolsa-feed
//!
//! 行情数据源适配器。每个适配器把各自的响应结构映射为统一的 `Series`。

pub mod alpha_vantage;
pub mod fallback;
pub mod http;
pub mod normalize;
pub mod twelve_data;
pub mod yahoo;
