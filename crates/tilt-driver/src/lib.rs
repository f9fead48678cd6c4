//! # Tilt Driver
//!
//! 遥测摄取的并发核心：
//!
//! - 摄取线程管理（阻塞读串口、解码、发布）
//! - 状态发布（ArcSwap 无锁读取，读写互不阻塞）
//! - 协作式停止与有界 join
//!
//! ## 线程模型
//!
//! 恰好两个控制流：摄取循环独占传输句柄在专用线程上阻塞读；
//! 消费端（展示循环）在自己的节拍上无锁读取最新样本。
//! [`cell::OrientationCell`] 是全系统唯一被并发访问的资源。

pub mod cell;
mod error;
pub mod ingestor;
pub mod metrics;
pub mod pipeline;

pub use cell::{OrientationCell, TelemetryContext};
pub use error::DriverError;
pub use ingestor::Ingestor;
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use pipeline::{IngestConfig, ingest_loop};
