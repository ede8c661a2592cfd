use core::fmt;

/// 链路配置错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<E> {
    /// 无线模块没有响应（SPI总线上初始化失败）
    RadioInit(E),
    /// 配置过程中外设操作失败
    Device(E),
}

impl<E> LinkError<E> {
    pub fn into_inner(self) -> E {
        match self {
            LinkError::RadioInit(e) | LinkError::Device(e) => e,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::RadioInit(e) => write!(f, "radio device did not respond: {:?}", e),
            LinkError::Device(e) => write!(f, "radio device operation failed: {:?}", e),
        }
    }
}

#[cfg(feature = "simulator")]
impl<E: fmt::Debug> std::error::Error for LinkError<E> {}
