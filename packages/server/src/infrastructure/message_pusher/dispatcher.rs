//! Dispatcher: Broker からの配信をローカル接続へ振り分ける
//!
//! プロセスにつき 1 つ。`room:*` を購読し、トピックから RoomId を復元して
//! `ConnectionRegistry::for_each_in_room` で該当接続の送信キューに積む。
//!
//! ## バックプレッシャー
//!
//! 送信キューが満杯の接続にはその配信を破棄する。1 つの遅い接続が
//! 他の接続への配信を止めることはない。
//!
//! ## 購読の失敗
//!
//! 購読の失敗と購読ストリームの終了はどちらもバックオフ付きで再試行する。
//! 連続した試行回数を使い切った場合は
//! `DispatcherError::SubscribeExhausted` を返し、呼び出し側（プロセス）が停止する。

use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    Broker, BrokerDelivery, BrokerError, BrokerStream, ROOM_TOPIC_PATTERN, RoomTopic,
};

use super::registry::{ConnectionRegistry, DeliveryOutcome};

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("broker subscription failed after {attempts} attempts: {source}")]
    SubscribeExhausted {
        attempts: u32,
        #[source]
        source: BrokerError,
    },
}

/// 購読の再試行設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// 連続した購読失敗の上限
    pub max_subscribe_attempts: u32,
    /// 最初の再試行までの待ち時間（失敗ごとに倍）
    pub initial_backoff: Duration,
    /// 待ち時間の上限
    pub max_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_subscribe_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// 1 回の配信の振り分け結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub dropped: usize,
    pub closed: usize,
}

pub struct Dispatcher {
    broker: Arc<dyn Broker>,
    registry: Arc<ConnectionRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        broker: Arc<dyn Broker>,
        registry: Arc<ConnectionRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            broker,
            registry,
            config,
        }
    }

    /// `shutdown` がキャンセルされるまで配信を振り分け続ける
    ///
    /// 購読の失敗も、購読ストリームの終了も 1 回の失敗として数え、バックオフを挟んで
    /// 再購読する。カウンタは配信を 1 件以上受け取った購読の後にだけ戻す。
    /// 連続した失敗が上限に達したらエラーを返す。
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DispatcherError> {
        let max_attempts = self.config.max_subscribe_attempts.max(1);
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let subscribed = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                subscribed = self.broker.subscribe(ROOM_TOPIC_PATTERN) => subscribed,
            };

            let failure = match subscribed {
                Ok(stream) => {
                    tracing::info!(
                        pattern = ROOM_TOPIC_PATTERN,
                        attempt,
                        "dispatcher subscribed to broker"
                    );
                    let received = self.pump(stream, &shutdown).await;
                    if shutdown.is_cancelled() {
                        tracing::info!("dispatcher stopped");
                        return Ok(());
                    }
                    if received > 0 {
                        attempt = 1;
                        backoff = self.config.initial_backoff;
                    }
                    BrokerError::ConnectionLost(format!(
                        "subscription ended after {received} deliveries"
                    ))
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                tracing::error!(attempt, error = %failure, "giving up on broker subscription");
                return Err(DispatcherError::SubscribeExhausted {
                    attempts: attempt,
                    source: failure,
                });
            }
            tracing::warn!(
                attempt,
                max_attempts,
                retry_in_ms = backoff.as_millis() as u64,
                error = %failure,
                "broker subscription lost, resubscribing"
            );
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.config.max_backoff);
        }
    }

    /// ストリームが終わるか `shutdown` まで振り分け、受け取った配信の件数を返す
    ///
    /// 壊れた配信は 1 件ずつ読み飛ばし、購読そのものは続ける。
    async fn pump(&self, mut stream: BrokerStream, shutdown: &CancellationToken) -> usize {
        let mut received = 0;
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => return received,
                next = stream.next() => next,
            };
            match next {
                Some(Ok(delivery)) => {
                    received += 1;
                    self.dispatch(&delivery);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "skipping undeliverable broker message");
                }
                None => return received,
            }
        }
    }

    /// 1 件の配信を該当ルームの接続へ振り分ける
    pub fn dispatch(&self, delivery: &BrokerDelivery) -> DispatchReport {
        let Some(room_id) = RoomTopic::parse(&delivery.topic) else {
            tracing::warn!(topic = %delivery.topic, "ignoring delivery on unknown topic");
            return DispatchReport::default();
        };

        let mut report = DispatchReport::default();
        self.registry.for_each_in_room(&room_id, |conn| {
            match conn.try_deliver(delivery.payload.clone()) {
                DeliveryOutcome::Delivered => report.delivered += 1,
                DeliveryOutcome::QueueFull => {
                    report.dropped += 1;
                    tracing::warn!(
                        connection_id = %conn.id(),
                        room_id = %room_id,
                        "outbound queue full, dropping message for slow connection"
                    );
                }
                DeliveryOutcome::Closed => report.closed += 1,
            }
        });

        tracing::debug!(
            room_id = %room_id,
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "dispatched message"
        );
        report
    }
}
