// ==========================================
// ERP → 数据仓库同步 - 数据清洗器
// ==========================================
// 职责: NULL 标准化 / 日期与数值强制转换
// 约定: 非法值与哨兵值转换为 None / 0, 不报错
// ==========================================

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct DataCleaner;

impl DataCleaner {
    /// 空白字符串 → None, 其余 TRIM
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析源系统日期（YYYYMMDD, 兼容 YYYY-MM-DD）
    ///
    /// 全零日期、空值、非法日期 → None
    pub fn parse_sap_date(&self, value: Option<&str>) -> Option<NaiveDate> {
        let value = self.normalize_null(value)?;
        if value.chars().all(|c| c == '0') {
            return None;
        }
        NaiveDate::parse_from_str(&value, "%Y%m%d")
            .or_else(|_| NaiveDate::parse_from_str(&value, "%Y-%m-%d"))
            .ok()
    }

    /// 解析数值, 失败 → 0
    pub fn parse_decimal(&self, value: Option<&str>) -> Decimal {
        let Some(value) = self.normalize_null(value) else {
            return Decimal::ZERO;
        };
        Decimal::from_str(&value)
            .ok()
            .or_else(|| Decimal::from_scientific(&value).ok())
            .unwrap_or(Decimal::ZERO)
    }

    /// 浮点数 → Decimal, NaN/无穷 → 0
    pub fn decimal_from_f64(&self, value: Option<f64>) -> Decimal {
        value
            .filter(|v| v.is_finite())
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ")), None);
        assert_eq!(cleaner.normalize_null(Some("")), None);
        assert_eq!(cleaner.normalize_null(Some("  v  ")), Some("v".to_string()));
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_parse_sap_date() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.parse_sap_date(Some("20260120")),
            NaiveDate::from_ymd_opt(2026, 1, 20)
        );
        assert_eq!(
            cleaner.parse_sap_date(Some("2026-01-20")),
            NaiveDate::from_ymd_opt(2026, 1, 20)
        );
    }

    #[test]
    fn test_parse_sap_date_coerces_sentinels() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_sap_date(Some("00000000")), None);
        assert_eq!(cleaner.parse_sap_date(Some("20261341")), None);
        assert_eq!(cleaner.parse_sap_date(Some("")), None);
        assert_eq!(cleaner.parse_sap_date(None), None);
    }

    #[test]
    fn test_parse_decimal_coerces_to_zero() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_decimal(Some("12.5000")), Decimal::new(125, 1));
        assert_eq!(cleaner.parse_decimal(Some("-3")), Decimal::from(-3));
        assert_eq!(cleaner.parse_decimal(Some("1e2")), Decimal::from(100));
        assert_eq!(cleaner.parse_decimal(Some("abc")), Decimal::ZERO);
        assert_eq!(cleaner.parse_decimal(None), Decimal::ZERO);
    }

    #[test]
    fn test_decimal_from_f64() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.decimal_from_f64(Some(f64::NAN)), Decimal::ZERO);
        assert_eq!(cleaner.decimal_from_f64(None), Decimal::ZERO);
        assert_eq!(cleaner.decimal_from_f64(Some(2.5)), Decimal::new(25, 1));
    }
}
