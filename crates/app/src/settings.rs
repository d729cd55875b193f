use bolsa_core::config::{AppConfig, ConfigError, ProviderKind};
use config::{Config, Environment, File, Map};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_PATH_VAR: &str = "BOLSA_CONFIG";

/// # Summary
/// 加载并校验应用配置。
///
/// # Logic
/// 1. 内置默认值 (`AppConfig` 的 serde 默认)。
/// 2. 配置文件：命令行路径优先，其次 `BOLSA_CONFIG`，否则尝试当前目录下可选的 `bolsa.toml`。
/// 3. 形如 `BOLSA_PROVIDER__API_KEY` 的环境变量：前缀 `BOLSA_`，层级分隔符 `__`。
/// 4. 常见凭证变量回填，最后执行校验。
///
/// # Arguments
/// * `path`: 命令行指定的配置文件。
///
/// # Returns
/// 校验通过的配置，任何一步失败都返回 `ConfigError`。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = layered(path, None)?;
    apply_env_fallbacks(config, |key| env::var(key).ok()).validate()
}

/// 合并默认值、配置文件与环境变量层；`vars` 为 `None` 时读取进程环境。
fn layered(
    path: Option<&Path>,
    vars: Option<Map<String, String>>,
) -> Result<AppConfig, ConfigError> {
    let file = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));

    let builder = match &file {
        Some(p) => Config::builder().add_source(File::from(p.as_path()).required(true)),
        None => Config::builder().add_source(File::with_name("bolsa").required(false)),
    };

    builder
        .add_source(
            Environment::with_prefix("BOLSA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ConfigError::Load(e.to_string()))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// # Summary
/// 以约定俗成的变量名补全未配置的凭证。
///
/// # Logic
/// 1. 数据源 Key：Alpha Vantage (含回退链) 读 `ALPHA_VANTAGE_API_KEY`，Twelve Data 读 `TWELVE_DATA_API_KEY`。
/// 2. Telegram：`TELEGRAM_TOKEN` 与 `TELEGRAM_CHAT_ID`。
/// 3. 已显式配置的值不会被覆盖。
pub fn apply_env_fallbacks(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    if is_blank(&config.provider.api_key) {
        let var = match config.provider.kind {
            ProviderKind::AlphaVantage | ProviderKind::Fallback => Some("ALPHA_VANTAGE_API_KEY"),
            ProviderKind::TwelveData => Some("TWELVE_DATA_API_KEY"),
            ProviderKind::Yahoo => None,
        };
        if let Some(var) = var {
            config.provider.api_key = lookup(var);
        }
    }

    let telegram = &mut config.notify.telegram;
    if is_blank(&telegram.bot_token) {
        telegram.bot_token = lookup("TELEGRAM_TOKEN");
    }
    if is_blank(&telegram.chat_id) {
        telegram.chat_id = lookup("TELEGRAM_CHAT_ID");
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolsa_core::common::time::DedupPeriod;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[provider]
kind = "twelve_data"
api_key = "td-key"
lookback = 60

[monitor]
alert_threshold = 3.0
dedup_period = "hour"
chart_window = 30

[[watchlist]]
name = "Banks"
tickers = [{{ name = "JPMorgan", symbol = "JPM" }}, {{ name = "Citi", symbol = "C" }}]
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::TwelveData);
        assert_eq!(config.provider.api_key.as_deref(), Some("td-key"));
        assert_eq!(config.provider.lookback, 60);
        assert_eq!(config.provider.request_delay_secs, 13);
        assert_eq!(config.monitor.alert_threshold, 3.0);
        assert_eq!(config.monitor.dedup_period, DedupPeriod::Hour);
        assert_eq!(config.monitor.cache_ttl_secs, 60);
        assert_eq!(config.watchlist.len(), 1);
        assert_eq!(config.tickers()[1].symbol, "C");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[monitor]\nalert_threshold = 0.0\n").unwrap();
        assert!(matches!(
            load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_env_layer_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "[provider]\nkind = \"alpha_vantage\"\napi_key = \"file-key\"\n"
        )
        .unwrap();
        let vars: Map<String, String> = [
            ("BOLSA_PROVIDER__API_KEY", "env-key"),
            ("BOLSA_MONITOR__ALERT_THRESHOLD", "7.5"),
            ("BOLSA_NOTIFY__TELEGRAM__BOT_TOKEN", "123:abc"),
            // 缺少前缀分隔符的变量不参与合并
            ("BOLSAMONITOR__CHART_WINDOW", "5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = layered(Some(file.path()), Some(vars)).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::AlphaVantage);
        assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.monitor.alert_threshold, 7.5);
        assert_eq!(config.notify.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.monitor.chart_window, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_fallbacks() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ALPHA_VANTAGE_API_KEY", "av-key"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());

        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::Fallback;
        config.notify.telegram.chat_id = Some("explicit".to_string());
        let config = apply_env_fallbacks(config, lookup);

        assert_eq!(config.provider.api_key.as_deref(), Some("av-key"));
        assert_eq!(config.notify.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.notify.telegram.chat_id.as_deref(), Some("explicit"));

        // Yahoo 不需要 Key
        let config = apply_env_fallbacks(AppConfig::default(), lookup);
        assert!(config.provider.api_key.is_none());
    }
}
