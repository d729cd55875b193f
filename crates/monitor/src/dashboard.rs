use bolsa_core::analysis::entity::{AnalyzedRow, MacdCross, RsiTag};
use bolsa_core::config::CategoryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::SnapshotError;
use crate::monitor::CycleReport;

/// 看板中单个标的的展示记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub previous_close: f64,
    pub percent_change: f64,
    pub alert: bool,
    pub volume: Option<f64>,
    pub rsi_tag: Option<RsiTag>,
    pub macd_cross: Option<MacdCross>,
    pub chart: Vec<AnalyzedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardCategory {
    pub name: String,
    pub records: Vec<DashboardRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableTicker {
    pub name: String,
    pub symbol: String,
    pub reason: String,
}

/// # Summary
/// 一轮刷新后供展示层读取的看板快照。
///
/// # Invariants
/// - 分类顺序与关注列表一致，分类内记录保持声明顺序。
/// - 存在不可用标的时 `warning` 给出数量与代码列表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub categories: Vec<DashboardCategory>,
    pub unavailable: Vec<UnavailableTicker>,
    pub warning: Option<String>,
}

impl Dashboard {
    /// # Summary
    /// 由刷新报告构建看板。
    ///
    /// # Logic
    /// 1. 按关注列表的分类顺序分组成功记录，空分类同样保留。
    /// 2. 失败标的汇总为 `unavailable`，并生成提示文本。
    pub fn from_report(report: &CycleReport, watchlist: &[CategoryConfig]) -> Self {
        let categories = watchlist
            .iter()
            .map(|category| DashboardCategory {
                name: category.name.clone(),
                records: report
                    .records
                    .iter()
                    .filter(|r| r.category == category.name)
                    .map(|r| DashboardRecord {
                        name: r.ticker.name.clone(),
                        symbol: r.ticker.symbol.clone(),
                        price: r.signal.price,
                        previous_close: r.signal.previous_close,
                        percent_change: r.signal.percent_change,
                        alert: r.signal.alert,
                        volume: r.signal.volume,
                        rsi_tag: r.signal.rsi_tag,
                        macd_cross: r.signal.macd_cross,
                        chart: r.chart.clone(),
                    })
                    .collect(),
            })
            .collect();

        let unavailable: Vec<UnavailableTicker> = report
            .failures
            .iter()
            .map(|f| UnavailableTicker {
                name: f.ticker.name.clone(),
                symbol: f.ticker.symbol.clone(),
                reason: f.error.to_string(),
            })
            .collect();

        let warning = (!unavailable.is_empty()).then(|| {
            let symbols: Vec<&str> = unavailable.iter().map(|u| u.symbol.as_str()).collect();
            format!(
                "{} ticker(s) unavailable: {}",
                unavailable.len(),
                symbols.join(", ")
            )
        });

        Self {
            generated_at: report.generated_at,
            provider: report.provider.clone(),
            categories,
            unavailable,
            warning,
        }
    }

    /// # Summary
    /// 以格式化 JSON 原子写入快照文件。
    ///
    /// # Logic
    /// 1. 确保父目录存在。
    /// 2. 写入同目录下的临时文件并刷盘。
    /// 3. 重命名覆盖目标文件，读取方不会看到半截内容。
    ///
    /// 文件操作经由 `tokio::fs` 交给阻塞线程池，不占用刷新所在的运行时线程。
    pub async fn write_atomic(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(self)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        let mut file = fs::File::create(tmp_path).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(tmp_path, path).await?;
        debug!("Snapshot written to {}", path.display());
        Ok(())
    }
}
