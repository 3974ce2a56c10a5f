use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// # Summary
/// 时钟接口，隔离物理系统时钟。
/// 序列生成与模拟推送的时间戳都通过此接口获取，测试中可替换为固定时钟。
pub trait TimeProvider: Send + Sync {
    /// 获取当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// 直接返回操作系统当前时间。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 可手动拨动的虚拟时钟。
///
/// # Invariants
/// - 内部利用 `RwLock` 保证多线程读写安全，锁中毒时沿用中毒前的值。
pub struct ManualClock {
    current_time: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(start),
        }
    }

    pub fn set_time(&self, at: DateTime<Utc>) {
        *self.current_time.write().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// 将时钟向前拨动指定时长
    pub fn advance(&self, by: Duration) {
        *self.current_time.write().unwrap_or_else(|e| e.into_inner()) += by;
    }
}

impl TimeProvider for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fake_clock_advance() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
        clock.set_time(start);
        assert_eq!(clock.now(), start);
    }
}
