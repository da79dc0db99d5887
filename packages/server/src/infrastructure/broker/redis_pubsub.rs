//! Redis Pub/Sub を使った Broker 実装（`redis` feature）
//!
//! 発行は多重化コネクションで `PUBLISH`、購読は専用コネクションで `PSUBSCRIBE`。

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;

use crate::domain::{Broker, BrokerDelivery, BrokerError, BrokerStream, RoomTopic};

pub struct RedisBroker {
    client: redis::Client,
    publisher: redis::aio::MultiplexedConnection,
}

impl RedisBroker {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|e| BrokerError::ConnectionLost(e.to_string()))?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::ConnectionLost(e.to_string()))?;
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, topic: &RoomTopic, payload: String) -> Result<(), BrokerError> {
        let mut connection = self.publisher.clone();
        connection
            .publish::<_, _, i64>(topic.as_str(), payload)
            .await
            .map(|receivers| {
                tracing::trace!(topic = %topic.as_str(), receivers, "published to redis");
            })
            .map_err(|e| BrokerError::PublishFailed {
                topic: topic.as_str().to_string(),
                reason: e.to_string(),
            })
    }

    async fn subscribe(&self, pattern: &str) -> Result<BrokerStream, BrokerError> {
        let subscribe_failed = |e: redis::RedisError| BrokerError::SubscribeFailed {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };
        let mut pubsub = self.client.get_async_pubsub().await.map_err(subscribe_failed)?;
        pubsub.psubscribe(pattern).await.map_err(subscribe_failed)?;

        let deliveries = pubsub.into_on_message().map(|message| {
            let topic = message.get_channel_name().to_string();
            message
                .get_payload::<String>()
                .map_err(|e| BrokerError::MalformedDelivery {
                    topic: topic.clone(),
                    reason: e.to_string(),
                })
                .map(|payload| BrokerDelivery { topic, payload })
        });
        Ok(deliveries.boxed())
    }
}
