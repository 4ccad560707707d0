//! 日志基础设施

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 初始化全局日志订阅者；设置了 RUST_LOG 时以其为准
    pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
        let filter = Self::filter(config)?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);

        let result = if config.compact {
            builder.compact().try_init()
        } else {
            builder.try_init()
        };

        result.map_err(|e| anyhow::anyhow!("日志初始化失败: {e}"))
    }

    fn filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(&config.level)?),
        }
    }
}
