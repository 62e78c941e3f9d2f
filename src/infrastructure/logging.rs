//! 结构化日志初始化
//!
//! RUST_LOG 优先；未设置时退回配置文件的级别。
//! format = "json" 输出结构化日志（采集侧友好），其他值输出可读文本。

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "identicore={level},tower_http=debug,ethers_providers=warn",
            level = config.level
        ))
    });

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
