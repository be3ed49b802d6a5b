//! 点击计数
//!
//! 重定向路径只把点击写进内存缓冲，由后台任务批量合并到存储。
//! 计数是最终一致的，进程崩溃时未刷盘的增量会丢失。

mod accumulator;

pub use accumulator::{ClickAccumulator, FlushReport};
