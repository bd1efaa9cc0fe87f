use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TELEMETRY_ENABLED: Lazy<std::sync::RwLock<bool>> =
    Lazy::new(|| std::sync::RwLock::new(false));

/** \brief 日志过滤规则的环境变量名，语法同 RUST_LOG。 */
pub const LOG_ENV: &str = "MERGEMIND_LOG";

/**
 * \brief 安装全局 tracing 订阅者并设置遥测开关；重复调用时仅更新开关。
 */
pub fn init(enabled: bool) {
    set_enabled(enabled);
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(enabled)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/**
 * \brief 未设置 MERGEMIND_LOG 时的过滤规则；开启遥测后核心库输出 debug。
 */
fn default_directives(enabled: bool) -> &'static str {
    if enabled {
        "info,mergemind_core_sdk=debug"
    } else {
        "info"
    }
}

/**
 * \brief 更新遥测开关状态。
 */
pub fn set_enabled(enabled: bool) {
    if let Ok(mut guard) = TELEMETRY_ENABLED.write() {
        *guard = enabled;
    }
}

/**
 * \brief 查询当前遥测开关状态。
 */
pub fn is_enabled() -> bool {
    TELEMETRY_ENABLED.read().map(|g| *g).unwrap_or(false)
}

/**
 * \brief 记录常规事件。调用方负责保证 message 中不含密钥。
 */
pub fn log_event(category: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    tracing::info!(category, "{}", message);
}

/**
 * \brief 记录错误事件。
 */
pub fn log_error(category: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    tracing::error!(category, "{}", message);
}
