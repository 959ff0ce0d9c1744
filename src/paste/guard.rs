//! 单飞守卫（RAII）
//!
//! 构造成功即占用处理中标志，`Drop` 时自动释放，
//! 无论成功、失败还是提前返回都不会遗留"忙碌"状态。

use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// 标志空闲时占用并返回守卫；已被占用则返回 `None`（不排队）。
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        log::debug!("🔓 已释放粘贴处理中标志");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_first_is_dropped() {
        let flag = AtomicBool::new(false);

        let first = InFlightGuard::try_acquire(&flag);
        assert!(first.is_some());
        assert!(InFlightGuard::try_acquire(&flag).is_none());

        drop(first);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(InFlightGuard::try_acquire(&flag).is_some());
    }
}
