//! ローカル接続へのメッセージ配信
//!
//! ## 実装
//!
//! - `registry`: プロセス内の接続テーブル（ConnectionRegistry）
//! - `dispatcher`: Broker の配信を接続へ振り分ける常駐タスク

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherConfig, DispatcherError};
pub use registry::{ConnectionHandle, ConnectionRegistry, DeliveryOutcome, OutboundFrame};
