//! プロセス内 Broker 実装
//!
//! `tokio::sync::broadcast` を使った単一プロセス用の Pub/Sub。
//! 複数プロセス構成では `RedisBroker`（`redis` feature）を使う。

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::{Broker, BrokerDelivery, BrokerError, BrokerStream, RoomTopic};

/// 既定の配信バッファ数
pub const DEFAULT_BROKER_CAPACITY: usize = 4096;

pub struct InProcessBroker {
    sender: broadcast::Sender<BrokerDelivery>,
}

impl InProcessBroker {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// 購読者数が `count` 以上になるまで待つ
    pub async fn wait_for_subscribers(&self, count: usize) {
        while self.subscriber_count() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for InProcessBroker {
    fn default() -> Self {
        Self::new(DEFAULT_BROKER_CAPACITY)
    }
}

/// `*` を末尾にだけ持つ単純なパターン照合
fn topic_matches(pattern: &str, topic: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => topic.starts_with(prefix),
        None => topic == pattern,
    }
}

#[async_trait]
impl Broker for InProcessBroker {
    async fn publish(&self, topic: &RoomTopic, payload: String) -> Result<(), BrokerError> {
        let delivery = BrokerDelivery {
            topic: topic.as_str().to_string(),
            payload,
        };
        // 購読者がいない場合の送信失敗は Pub/Sub として正常
        if self.sender.send(delivery).is_err() {
            tracing::debug!(topic = %topic.as_str(), "published with no subscribers");
        }
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<BrokerStream, BrokerError> {
        let receiver = self.sender.subscribe();
        let pattern = pattern.to_string();

        let deliveries = stream::unfold((receiver, pattern), |(mut receiver, pattern)| async move {
            loop {
                match receiver.recv().await {
                    Ok(delivery) if topic_matches(&pattern, &delivery.topic) => {
                        return Some((Ok(delivery), (receiver, pattern)));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "broker subscriber lagged, deliveries skipped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        Ok(deliveries.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ROOM_TOPIC_PATTERN, RoomId};

    fn topic(room: &str) -> RoomTopic {
        RoomTopic::for_room(&RoomId::new(room.to_string()).unwrap())
    }

    #[test]
    fn test_topic_matches() {
        // テスト項目: 末尾 '*' のパターンは接頭辞一致、それ以外は完全一致で照合される
        assert!(topic_matches("room:*", "room:42"));
        assert!(!topic_matches("room:*", "chat_messages"));
        assert!(topic_matches("room:42", "room:42"));
        assert!(!topic_matches("room:42", "room:420"));
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_delivery() {
        // テスト項目: 購読者は発行されたメッセージをトピック付きで受け取る
        // given (前提条件):
        let broker = InProcessBroker::default();
        let mut stream = broker.subscribe(ROOM_TOPIC_PATTERN).await.unwrap();

        // when (操作):
        broker
            .publish(&topic("42"), "payload".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let delivery = stream.next().await.unwrap().unwrap();
        assert_eq!(delivery.topic, "room:42");
        assert_eq!(delivery.payload, "payload");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        // テスト項目: 購読者がいなくても publish はエラーにならない
        // given (前提条件):
        let broker = InProcessBroker::default();

        // when (操作):
        let result = broker.publish(&topic("42"), "nobody".to_string()).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_delivery() {
        // テスト項目: 複数の購読者（= 複数プロセスの Dispatcher）全員に届く
        // given (前提条件):
        let broker = InProcessBroker::default();
        let mut first = broker.subscribe(ROOM_TOPIC_PATTERN).await.unwrap();
        let mut second = broker.subscribe(ROOM_TOPIC_PATTERN).await.unwrap();

        // when (操作):
        broker.publish(&topic("7"), "fan-out".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.next().await.unwrap().unwrap().payload, "fan-out");
        assert_eq!(second.next().await.unwrap().unwrap().payload, "fan-out");
    }
}
