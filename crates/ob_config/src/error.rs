// crates/ob_config/src/error.rs

//! 配置层错误类型

use ob_foundation::ObError;

/// 配置错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 无效值的便捷构造
    pub fn invalid(key: &str, value: impl ToString, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<ConfigError> for ObError {
    fn from(err: ConfigError) -> Self {
        ObError::config(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("dt", -1.0, "必须为正");
        assert!(err.to_string().contains("dt"));
    }

    #[test]
    fn test_into_ob_error() {
        let err: ObError = ConfigError::Parse("eof".into()).into();
        assert!(matches!(err, ObError::Config { .. }));
    }
}
