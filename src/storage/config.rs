//! 配置文件管理模块

use crate::core::mapper::Mapper;
use crate::core::models::MapperConfig;
use anyhow::Result;
use std::path::PathBuf;

/// 配置管理器
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// 获取默认配置路径
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "factmap", "factmap")
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// 加载配置；文件不存在时返回默认配置
    pub fn load(&self) -> Result<MapperConfig> {
        if self.config_path.exists() {
            let content = std::fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&content).map_err(|e| {
                anyhow::anyhow!("解析配置文件失败: {}, 路径: {}", e, self.config_path.display())
            })
        } else {
            tracing::info!("配置文件不存在，使用默认配置: {}", self.config_path.display());
            Ok(MapperConfig::default())
        }
    }

    /// 加载配置并创建映射引擎
    pub fn load_mapper(&self) -> Result<(Mapper, MapperConfig)> {
        let config = self.load()?;
        Ok((Mapper::new(config.options), config))
    }

    /// 保存配置
    pub fn save(&self, config: &MapperConfig) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// 重置为默认配置
    pub fn reset(&self) -> Result<()> {
        self.save(&MapperConfig::default())
    }
}
