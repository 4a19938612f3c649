use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `RADIM_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("RADIM_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendMode {
    /// 运行内置脚本后退出。
    #[default]
    Demo,
    /// 从标准输入逐行读取脚本。
    Interactive,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_mode: FrontendMode,
    #[serde(default = "FrontendConfig::default_history_size")]
    pub history_size: usize,
}

impl FrontendConfig {
    fn default_history_size() -> usize {
        16
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            default_mode: FrontendMode::default(),
            history_size: Self::default_history_size(),
        }
    }
}

/// 新建实体使用的画笔。颜色为 `0xRRGGBB`。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PenConfig {
    #[serde(default = "PenConfig::default_color")]
    pub color: u32,
    #[serde(default = "PenConfig::default_width")]
    pub width: f64,
    #[serde(default = "PenConfig::default_line_type")]
    pub line_type: String,
}

impl PenConfig {
    fn default_color() -> u32 {
        0xFFFFFF
    }

    fn default_width() -> f64 {
        0.25
    }

    fn default_line_type() -> String {
        "CONTINUOUS".to_string()
    }
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            color: Self::default_color(),
            width: Self::default_width(),
            line_type: Self::default_line_type(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawingConfig {
    #[serde(default = "DrawingConfig::default_active_layer")]
    pub active_layer: String,
    #[serde(default)]
    pub pen: PenConfig,
    /// 网格捕捉间距，缺省时不捕捉。
    #[serde(default)]
    pub grid_snap: Option<f64>,
    #[serde(default = "DrawingConfig::default_pick_tolerance")]
    pub pick_tolerance: f64,
    #[serde(default = "DrawingConfig::default_dimension_precision")]
    pub dimension_precision: usize,
}

impl DrawingConfig {
    fn default_active_layer() -> String {
        "0".to_string()
    }

    fn default_pick_tolerance() -> f64 {
        2.0
    }

    fn default_dimension_precision() -> usize {
        2
    }
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            active_layer: Self::default_active_layer(),
            pen: PenConfig::default(),
            grid_snap: None,
            pick_tolerance: Self::default_pick_tolerance(),
            dimension_precision: Self::default_dimension_precision(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
