use anyhow::Context;
use opencode_bridge::{logger, BridgeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logging();

    let config = BridgeConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        "[SERVER] 启动配置: model={} model_map={} retries={} session_timeout_ms={} message_timeout_ms={}",
        config.model_id,
        config.model_map.len(),
        config.retry.retry_count,
        config.timeouts.session_ms,
        config.timeouts.message_ms
    );

    opencode_bridge::serve(config)
        .await
        .context("server terminated")?;
    Ok(())
}
