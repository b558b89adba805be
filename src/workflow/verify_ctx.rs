//! 验证任务上下文
//!
//! 封装"我正在验证第几个问题"这一信息

use std::fmt::Display;

/// 验证任务上下文
#[derive(Debug, Clone, Copy)]
pub struct VerifyCtx {
    /// 问题编号（从1开始，仅用于日志与进度）
    pub question_num: usize,

    /// 本次请求的问题总数
    pub total: usize,
}

impl VerifyCtx {
    /// 创建新的验证上下文
    pub fn new(question_num: usize, total: usize) -> Self {
        Self {
            question_num,
            total,
        }
    }
}

impl Display for VerifyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[问题 {}/{}]", self.question_num, self.total)
    }
}
