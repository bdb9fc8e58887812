//! 时间类型模块
//!
//! `Timestamp` 是可序列化的毫秒时间戳，用于会话创建时间、令牌过期时间等场景。
//! 与 `chrono` 的互转集中在此处，视图层只拿到格式化后的字符串。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 创建新的时间戳
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 当前时间
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// 获取毫秒值
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// 解析毫秒字符串（认证服务以字符串形式返回 `createdAt`）
    pub fn parse_millis(s: &str) -> Option<Self> {
        s.trim().parse::<i64>().ok().map(Self)
    }

    /// 解析 RFC 3339 字符串
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.timestamp_millis()))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.to_datetime().map(|dt| dt.date_naive())
    }

    /// 格式化为 `YYYY-MM-DD`
    pub fn to_date_string(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// 格式化为 `HH:MM`
    pub fn to_time_string(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_millis() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_millis() {
        let ts = Timestamp::parse_millis("1705312200000").unwrap();
        assert_eq!(ts.to_date_string(), "2024-01-15");
        assert_eq!(ts.to_time_string(), "09:50");
    }

    #[test]
    fn parses_rfc3339() {
        let ts = Timestamp::parse_rfc3339("2024-01-12T10:15:00Z").unwrap();
        assert_eq!(ts.to_date_string(), "2024-01-12");
        assert_eq!(ts.to_time_string(), "10:15");
        assert!(Timestamp::parse_rfc3339("yesterday").is_none());
    }

    #[test]
    fn adds_duration() {
        let ts = Timestamp::new(1_000) + Duration::from_secs(3600);
        assert_eq!(ts.as_millis(), 3_601_000);
    }
}
