//! 截面 ↔ 保護裝置額定值對照表
//!
//! 兩種嚴苛度檔位：標準檔（standard）與保守檔（pessimistic，
//! 對應不利的敷設條件）。表值為簡化保守版，非完整載流量模型。

use serde::{Deserialize, Serialize};

/// 保護判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionStatus {
    /// 合規
    Ok,
    /// 僅在有利敷設條件下合規（需以附註呈現）
    Info,
    /// 不合規（阻斷匯出）
    Danger,
}

/// 對照表服務
pub struct StandardsTable;

/// (截面 mm², 標準檔最大額定 A, 保守檔最大額定 A)
const RATING_TABLE: &[(f64, u32, u32)] = &[
    (1.5, 16, 10),
    (2.5, 25, 16),
    (4.0, 32, 25),
    (6.0, 40, 32),
    (10.0, 63, 50),
    (16.0, 80, 63),
    (25.0, 100, 80),
    (35.0, 125, 100),
];

impl StandardsTable {
    /// 標準檔：截面允許的最大保護額定值
    pub fn max_device_rating_standard(section_mm2: f64) -> Option<u32> {
        RATING_TABLE
            .iter()
            .find(|(s, _, _)| (*s - section_mm2).abs() < 1e-9)
            .map(|(_, standard, _)| *standard)
    }

    /// 保守檔：截面允許的最大保護額定值
    pub fn max_device_rating_pessimistic(section_mm2: f64) -> Option<u32> {
        RATING_TABLE
            .iter()
            .find(|(s, _, _)| (*s - section_mm2).abs() < 1e-9)
            .map(|(_, _, pessimistic)| *pessimistic)
    }

    /// 額定值允許的最小截面（標準檔覆蓋該額定值的最小截面）
    pub fn min_section_for_rating(rating_a: u32) -> f64 {
        RATING_TABLE
            .iter()
            .find(|(_, standard, _)| *standard >= rating_a)
            .map(|(s, _, _)| *s)
            .unwrap_or_else(|| RATING_TABLE.last().map(|(s, _, _)| *s).unwrap_or(35.0))
    }

    /// 保護額定值是否超出截面的標準檔上限（不合規）
    pub fn is_protection_too_high_for_section(section_mm2: f64, rating_a: u32) -> bool {
        match Self::max_device_rating_standard(section_mm2) {
            Some(max) => rating_a > max,
            // 未知截面一律視為不合規
            None => true,
        }
    }

    /// 保護判定
    ///
    /// - `Danger`：超出標準檔上限
    /// - `Info`：超出保守檔上限但未超標準檔
    /// - `Ok`：其餘
    pub fn protection_status(section_mm2: f64, rating_a: u32) -> ProtectionStatus {
        if Self::is_protection_too_high_for_section(section_mm2, rating_a) {
            return ProtectionStatus::Danger;
        }
        match Self::max_device_rating_pessimistic(section_mm2) {
            Some(max) if rating_a > max => ProtectionStatus::Info,
            _ => ProtectionStatus::Ok,
        }
    }

    /// 截面相對額定值是否過大（僅為提示，永不是錯誤）
    pub fn is_section_oversized(section_mm2: f64, rating_a: u32) -> bool {
        section_mm2 > Self::min_section_for_rating(rating_a)
    }
}
