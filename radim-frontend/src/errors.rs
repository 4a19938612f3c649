use radim_engine::expression::ExpressionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("脚本行 `{line}` 缺少坐标")]
    MissingCoordinate { line: String },
    #[error("脚本行 `{line}` 的坐标无效: {source}")]
    InvalidCoordinate {
        line: String,
        #[source]
        source: ExpressionError,
    },
    #[error("读取标准输入失败: {0}")]
    Io(#[from] std::io::Error),
}
