use imgfleet_imaging::ImagingError;
use thiserror::Error;

/// 系统错误类型定义
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("容量超限: {resource} 最多 {limit} 个, 实际 {actual} 个")]
    CapacityExceeded {
        resource: String,
        limit: usize,
        actual: usize,
    },

    #[error("图像处理错误: {0}")]
    Imaging(#[from] ImagingError),

    #[error("协议违规: {0}")]
    ProtocolViolation(String),

    #[error("通道错误: {0}")]
    Channel(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("任务执行错误: {0}")]
    TaskExecution(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type FleetResult<T> = std::result::Result<T, FleetError>;

impl FleetError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn capacity_exceeded<S: Into<String>>(resource: S, limit: usize, actual: usize) -> Self {
        Self::CapacityExceeded {
            resource: resource.into(),
            limit,
            actual,
        }
    }

    pub fn protocol_violation<S: Into<String>>(msg: S) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// 致命错误：在分发开始前终止整个运行
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FleetError::Configuration(_)
                | FleetError::CapacityExceeded { .. }
                | FleetError::Imaging(ImagingError::InvalidKernel(_))
                | FleetError::Internal(_)
        )
    }

    /// 只影响单个任务的错误，任务视为已消费，不重试
    pub fn is_task_local(&self) -> bool {
        matches!(self, FleetError::Imaging(_) | FleetError::TaskExecution(_)) && !self.is_fatal()
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for FleetError {
    fn from(err: anyhow::Error) -> Self {
        FleetError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(FleetError::config_error("bad").is_fatal());
        assert!(FleetError::capacity_exceeded("files", 600, 601).is_fatal());
        assert!(FleetError::from(ImagingError::InvalidKernel(56)).is_fatal());

        let io = FleetError::from(ImagingError::malformed("short"));
        assert!(!io.is_fatal());
        assert!(io.is_task_local());

        assert!(!FleetError::protocol_violation("dup").is_task_local());
    }

    #[test]
    fn test_error_display() {
        let err = FleetError::capacity_exceeded("输入文件", 600, 700);
        assert_eq!(err.to_string(), "容量超限: 输入文件 最多 600 个, 实际 700 个");
    }
}
