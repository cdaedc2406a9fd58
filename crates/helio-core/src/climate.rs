//! 氣候查詢（外部協作者）
//!
//! 引擎只消費 `{最低溫, 最高環境溫}`；提供者實作可替換。

use serde::{Deserialize, Serialize};

/// 站點氣候極值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateInfo {
    /// 冬季最低環境溫度（°C）
    pub min_temperature: f64,

    /// 夏季最高環境溫度（°C）
    pub max_ambient_temperature: f64,
}

impl ClimateInfo {
    pub fn new(min_temperature: f64, max_ambient_temperature: f64) -> Self {
        Self {
            min_temperature,
            max_ambient_temperature,
        }
    }
}

/// 氣候提供者
pub trait ClimateProvider {
    /// 郵遞區號 + 海拔 → 氣候極值
    fn climate_for(&self, postal_code: &str, altitude_m: f64) -> ClimateInfo;
}

/// 預設氣候表（按省份前兩碼，海拔每 200 m 冬季最低溫再降 1 °C）
#[derive(Debug, Clone, Default)]
pub struct DefaultClimateTable;

impl DefaultClimateTable {
    /// 省份基準極值（冬季最低溫, 夏季最高溫）
    fn department_base(department: &str) -> (f64, f64) {
        match department {
            // 地中海沿岸
            "06" | "13" | "83" | "34" | "66" | "11" | "30" => (-5.0, 38.0),
            // 大西洋沿岸
            "33" | "40" | "64" | "17" | "44" | "29" | "56" => (-6.0, 35.0),
            // 山區省份
            "04" | "05" | "38" | "73" | "74" | "15" | "48" => (-18.0, 32.0),
            // 東北部
            "54" | "57" | "67" | "68" | "88" | "25" | "90" => (-15.0, 34.0),
            // 其餘本土
            _ => (-10.0, 35.0),
        }
    }
}

impl ClimateProvider for DefaultClimateTable {
    fn climate_for(&self, postal_code: &str, altitude_m: f64) -> ClimateInfo {
        let department = if postal_code.len() >= 2 {
            &postal_code[..2]
        } else {
            ""
        };
        let (base_min, base_max) = Self::department_base(department);

        // 海拔修正：每開始的 200 m 再降 1 °C
        let altitude_penalty = if altitude_m > 0.0 {
            (altitude_m / 200.0).ceil()
        } else {
            0.0
        };

        ClimateInfo::new(base_min - altitude_penalty, base_max)
    }
}
