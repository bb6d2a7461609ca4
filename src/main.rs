//! factmap 命令行入口

use anyhow::Result;
use clap::{Parser, ValueHint};
use factmap::storage::config::ConfigManager;
use factmap::SourceRecord;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "把清单事实映射为节点定义"
)]
struct Cli {
    /// 节点事实 JSON 文件
    #[arg(value_hint = ValueHint::FilePath)]
    facts: PathBuf,

    /// 映射配置文件，缺省时使用平台配置目录下的 config.json
    #[arg(value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let facts_path = cli.facts;
    let config_path = cli.config.unwrap_or_else(ConfigManager::default_path);

    let manager = ConfigManager::new(config_path);
    let (mapper, config) = manager.load_mapper()?;
    tracing::info!(
        "已加载配置: {}，共 {} 条映射规则",
        manager.path().display(),
        config.mappings.len()
    );

    let content = std::fs::read_to_string(&facts_path)?;
    let record = SourceRecord::from_json(&content)
        .map_err(|e| anyhow::anyhow!("解析事实文件失败: {}", e))?;

    let outcome = mapper.map_record(&record, &config.mappings);
    if !outcome.diagnostics.is_empty() {
        tracing::info!("映射完成，共 {} 条诊断", outcome.diagnostics.len());
    }

    let node = outcome
        .into_node()
        .ok_or_else(|| anyhow::anyhow!("无法生成有效的节点定义: {}", facts_path.display()))?;

    for field in node.missing_required_fields() {
        tracing::warn!("节点缺少必需属性: {}", field);
    }

    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}
