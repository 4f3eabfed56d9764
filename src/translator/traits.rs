//! 协议转换器 Trait 定义

/// 请求转换器 Trait
///
/// 将前端协议的请求转换为后端协议的请求格式。
pub trait RequestTranslator {
    /// 前端请求类型
    type Input: ?Sized;
    /// 后端请求类型
    type Output;
    /// 转换错误类型
    type Error: std::error::Error + Send + Sync + 'static;

    /// 转换请求
    fn translate_request(&self, request: &Self::Input) -> Result<Self::Output, Self::Error>;
}
