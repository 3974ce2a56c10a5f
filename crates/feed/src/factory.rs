use crate::simulated::SimulatedChannel;
use crate::transport::TransportChannel;
use crate::ws::WsTransport;
use gridpulse_core::common::Category;
use gridpulse_core::config::{FeedConfig, FeedMode};
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::SubscriptionChannel;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// # Summary
/// 按配置构造订阅通道实现。
///
/// # Logic
/// 1. `simulated`：解析品种并按配置周期构造 `SimulatedChannel`。
/// 2. `transport`：要求 `transport_url`，构造基于 WebSocket 的 `TransportChannel`。
///
/// # Returns
/// 品种非法返回 `InvalidCategory`，缺少传输地址返回 `Transport`。
pub fn build_channel(config: &FeedConfig) -> Result<Arc<dyn SubscriptionChannel>, MarketError> {
    match config.mode {
        FeedMode::Simulated => {
            let category: Category = config.simulated_category.parse()?;
            let period = Duration::from_secs(config.simulated_period_secs);
            info!(%category, ?period, "Using simulated market feed");
            Ok(Arc::new(SimulatedChannel::new(category, period)))
        }
        FeedMode::Transport => {
            let url = config.transport_url.clone().ok_or_else(|| {
                MarketError::Transport("transport_url is required in transport mode".to_string())
            })?;
            info!(%url, event = %config.event_name, "Using transport market feed");
            let transport = WsTransport::new(url, config.api_key.clone());
            Ok(Arc::new(TransportChannel::new(
                transport,
                config.event_name.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpulse_core::market::entity::ChannelState;

    #[test]
    fn test_default_config_builds_simulated_channel() {
        let channel = build_channel(&FeedConfig::default()).unwrap();
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[test]
    fn test_transport_mode_requires_url() {
        let config = FeedConfig {
            mode: FeedMode::Transport,
            ..FeedConfig::default()
        };
        assert!(matches!(build_channel(&config), Err(MarketError::Transport(_))));

        let config = FeedConfig {
            mode: FeedMode::Transport,
            transport_url: Some("ws://127.0.0.1:9".to_string()),
            ..FeedConfig::default()
        };
        assert!(build_channel(&config).is_ok());
    }

    #[test]
    fn test_invalid_simulated_category() {
        let config = FeedConfig {
            simulated_category: "tulips".to_string(),
            ..FeedConfig::default()
        };
        assert!(matches!(
            build_channel(&config),
            Err(MarketError::InvalidCategory(_))
        ));
    }
}
