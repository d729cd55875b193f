use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// # Summary
/// 发送通知到外部系统的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync`。
/// - 每次调用最多发起一次投递，须自带超时上限，不得重试。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 通道名称，用于日志
    fn channel(&self) -> &str;

    /// # Summary
    /// 发送带有主题和内容的通知。
    ///
    /// # Logic
    /// 1. 根据目标平台要求格式化消息。
    /// 2. 通过底层传输协议发送消息。
    /// 3. 返回成功或失败状态。
    ///
    /// # Arguments
    /// * `subject` - 通知标题 (标的展示名称)。
    /// * `content` - 通知的具体内容。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 失败返回 `Err(NotifyError)`。
    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError>;
}
