//! 光伏組件型號模型

use serde::{Deserialize, Serialize};

/// 光伏組件（面板）電氣與物理規格
///
/// 目錄條目，不可變；配置中以型號 id 引用，永不複製修改。
/// 電氣值皆為 STC（25 °C、1000 W/m²）額定值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelModel {
    /// 型號 id（目錄鍵）
    pub id: String,

    /// 商品描述
    pub description: String,

    /// 開路電壓 Voc（V）
    pub voc: f64,

    /// 短路電流 Isc（A）
    pub isc: f64,

    /// 最大功率點電壓 Vmp（V）
    pub vmp: f64,

    /// 最大功率點電流 Imp（A）
    pub imp: f64,

    /// 額定功率（Wc）
    pub power_wc: f64,

    /// Voc 溫度係數（%/°C，通常為負）
    pub coeff_voc_pct: f64,

    /// 功率/Vmp 溫度係數（%/°C，通常為負）
    pub coeff_power_pct: f64,

    /// 寬度（m，直式擺放）
    pub width_m: f64,

    /// 高度（m，直式擺放）
    pub height_m: f64,
}

impl PanelModel {
    /// 創建新的組件型號
    pub fn new(id: impl Into<String>, description: impl Into<String>, power_wc: f64) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            voc: 0.0,
            isc: 0.0,
            vmp: 0.0,
            imp: 0.0,
            power_wc,
            coeff_voc_pct: -0.27,
            coeff_power_pct: -0.34,
            width_m: 1.134,
            height_m: 1.722,
        }
    }

    /// 建構器模式：設置電氣規格
    pub fn with_electrical(mut self, voc: f64, isc: f64, vmp: f64, imp: f64) -> Self {
        self.voc = voc;
        self.isc = isc;
        self.vmp = vmp;
        self.imp = imp;
        self
    }

    /// 建構器模式：設置溫度係數（%/°C）
    pub fn with_coefficients(mut self, coeff_voc_pct: f64, coeff_power_pct: f64) -> Self {
        self.coeff_voc_pct = coeff_voc_pct;
        self.coeff_power_pct = coeff_power_pct;
        self
    }

    /// 建構器模式：設置物理尺寸（m）
    pub fn with_dimensions(mut self, width_m: f64, height_m: f64) -> Self {
        self.width_m = width_m;
        self.height_m = height_m;
        self
    }

    /// 溫度修正後的單片開路電壓（V）
    ///
    /// Voc(T) = Voc_STC × (1 + coeffVoc/100 × (T − 25))
    pub fn voc_at(&self, cell_temp_c: f64) -> f64 {
        self.voc * (1.0 + self.coeff_voc_pct / 100.0 * (cell_temp_c - 25.0))
    }

    /// 溫度修正後的單片最大功率點電壓（V）
    pub fn vmp_at(&self, cell_temp_c: f64) -> f64 {
        self.vmp * (1.0 + self.coeff_power_pct / 100.0 * (cell_temp_c - 25.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_500() -> PanelModel {
        PanelModel::new("PAN-500-BF", "Module 500 Wc biverre", 500.0)
            .with_electrical(45.2, 13.85, 37.8, 13.23)
            .with_coefficients(-0.25, -0.30)
    }

    #[test]
    fn test_voc_cold_increases() {
        let panel = panel_500();
        // 係數為負：低溫下 Voc 升高
        let cold = panel.voc_at(-15.0);
        assert!(cold > panel.voc);
        // 45.2 × (1 + (-0.25/100) × (-40)) = 45.2 × 1.10
        assert!((cold - 45.2 * 1.10).abs() < 1e-9);
    }

    #[test]
    fn test_vmp_hot_decreases() {
        let panel = panel_500();
        let hot = panel.vmp_at(70.0);
        assert!(hot < panel.vmp);
        assert!((hot - 37.8 * (1.0 - 0.30 / 100.0 * 45.0)).abs() < 1e-9);
    }

    #[test]
    fn test_stc_is_identity() {
        let panel = panel_500();
        assert!((panel.voc_at(25.0) - panel.voc).abs() < 1e-12);
        assert!((panel.vmp_at(25.0) - panel.vmp).abs() < 1e-12);
    }
}
