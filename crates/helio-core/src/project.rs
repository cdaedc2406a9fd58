//! 專案配置模型
//!
//! 不可變配置快照；所有推導值（報告、選型、BOM）每次變更後
//! 由調用方以純函數全量重算，引擎不保留任何狀態。

use crate::inverter::{InverterConfig, Phase};
use crate::roof::RoofField;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// 支架系統品牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MountingBrand {
    K2Systems,
    Renusol,
}

/// 充電樁選項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvChargerOption {
    /// 未選
    None,
    /// 已選：功率（kW）
    Selected { power_kw: f64 },
}

impl EvChargerOption {
    pub fn is_selected(&self) -> bool {
        matches!(self, EvChargerOption::Selected { .. })
    }
}

/// 專案配置（引擎的唯一輸入快照）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// 站點名稱
    pub site_name: String,

    /// 郵遞區號（→ 氣候查詢）
    pub postal_code: String,

    /// 海拔（m）
    pub altitude_m: f64,

    /// 建檔日期
    pub created_on: NaiveDate,

    /// 屋面列表
    pub roof_fields: Vec<RoofField>,

    /// 支架品牌
    pub mounting_brand: MountingBrand,

    /// 逆變器配置
    pub inverter: InverterConfig,

    /// 充電樁選項
    pub ev_charger: EvChargerOption,

    /// 價格覆寫（目錄 id → 單價）
    pub price_overrides: HashMap<String, Decimal>,
}

impl ProjectConfig {
    /// 創建新的專案配置
    pub fn new(
        site_name: impl Into<String>,
        postal_code: impl Into<String>,
        inverter: InverterConfig,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            postal_code: postal_code.into(),
            altitude_m: 0.0,
            created_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
            roof_fields: Vec::new(),
            mounting_brand: MountingBrand::K2Systems,
            inverter,
            ev_charger: EvChargerOption::None,
            price_overrides: HashMap::new(),
        }
    }

    /// 建構器模式：海拔
    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    /// 建構器模式：建檔日期
    pub fn with_created_on(mut self, created_on: NaiveDate) -> Self {
        self.created_on = created_on;
        self
    }

    /// 建構器模式：支架品牌
    pub fn with_mounting_brand(mut self, brand: MountingBrand) -> Self {
        self.mounting_brand = brand;
        self
    }

    /// 建構器模式：充電樁
    pub fn with_ev_charger(mut self, power_kw: f64) -> Self {
        self.ev_charger = EvChargerOption::Selected { power_kw };
        self
    }

    /// 添加屋面
    pub fn add_roof_field(&mut self, field: RoofField) {
        self.roof_fields.push(field);
    }

    /// 設置價格覆寫
    pub fn override_price(&mut self, catalog_id: impl Into<String>, price: Decimal) {
        self.price_overrides.insert(catalog_id.into(), price);
    }

    /// 按 id 查找屋面
    pub fn roof_field(&self, id: Uuid) -> Option<&RoofField> {
        self.roof_fields.iter().find(|f| f.id == id)
    }

    /// 專案組件總數
    pub fn total_panel_count(&self) -> u32 {
        self.roof_fields.iter().map(|f| f.panel_count()).sum()
    }

    /// 是否具備電氣計算前提（至少一個屋面有組件）
    pub fn has_active_field(&self) -> bool {
        self.roof_fields.iter().any(|f| f.panel_count() > 0)
    }
}

/// 簽約容量諮詢結論（僅顯示用，不影響引擎判定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityVerdict {
    /// 簽約容量充裕
    Recommended,
    /// 相容但偏緊
    Compatible,
    /// 不足，建議調升
    Undersized,
}

/// 簽約容量狀態查詢（外部協作者的預設實作）
///
/// 以專案交流功率對照簽約容量（kVA 換算為 A）。
pub fn subscribed_capacity_verdict(
    phase: Phase,
    project_power_va: f64,
    subscribed_capacity_a: u32,
) -> CapacityVerdict {
    let voltage = match phase {
        Phase::Single => 230.0,
        Phase::Three => 400.0 * 3.0_f64.sqrt(),
    };
    if voltage <= 0.0 || project_power_va <= 0.0 {
        return CapacityVerdict::Recommended;
    }
    let required_a = project_power_va / voltage;
    let capacity = f64::from(subscribed_capacity_a);

    if capacity >= required_a * 1.2 {
        CapacityVerdict::Recommended
    } else if capacity >= required_a {
        CapacityVerdict::Compatible
    } else {
        CapacityVerdict::Undersized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inverter::InverterBrand;
    use crate::roof::PanelConfig;

    fn base_project() -> ProjectConfig {
        let inverter = InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single);
        ProjectConfig::new("Maison Dupont", "33700", inverter)
    }

    #[test]
    fn test_total_panel_count() {
        let mut project = base_project();
        project.add_roof_field(RoofField::new(
            "Sud",
            9.0,
            5.0,
            PanelConfig::grid("PAN-500-BF", 2, 6),
        ));
        project.add_roof_field(RoofField::new(
            "Ouest",
            6.0,
            4.0,
            PanelConfig::grid("PAN-500-BF", 1, 4),
        ));

        assert_eq!(project.total_panel_count(), 16);
        assert!(project.has_active_field());
    }

    #[test]
    fn test_empty_project_has_no_active_field() {
        let project = base_project();
        assert!(!project.has_active_field());
    }

    #[test]
    fn test_capacity_verdict_bands() {
        // 6 kVA 單相 ≈ 26.1 A
        assert_eq!(
            subscribed_capacity_verdict(Phase::Single, 6000.0, 45),
            CapacityVerdict::Recommended
        );
        assert_eq!(
            subscribed_capacity_verdict(Phase::Single, 6000.0, 30),
            CapacityVerdict::Compatible
        );
        assert_eq!(
            subscribed_capacity_verdict(Phase::Single, 6000.0, 20),
            CapacityVerdict::Undersized
        );
    }

    #[test]
    fn test_price_override_map() {
        let mut project = base_project();
        project.override_price("PAN-500-BF", Decimal::from(95));
        assert_eq!(
            project.price_overrides.get("PAN-500-BF"),
            Some(&Decimal::from(95))
        );
    }
}
