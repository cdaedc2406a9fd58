//! 屋面與組件佈局模型

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 屋面類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoofType {
    /// 瓦片
    Tile,
    /// 鋼板瓦
    SteelTile,
    /// 波形板
    Corrugated,
    /// 平屋頂
    Flat,
    /// 地面支架
    Ground,
}

/// 組件擺放方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// 直式（portrait）
    Portrait,
    /// 橫式（landscape）
    Landscape,
}

/// 組件佈局配置
///
/// 組件數量為推導值，永不冗餘儲存：
/// 有逐列配置時取其總和，否則取 rows × columns。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// 組件型號 id
    pub panel_model_id: String,

    /// 擺放方向
    pub orientation: Orientation,

    /// 列數
    pub rows: u32,

    /// 行數
    pub columns: u32,

    /// 逐列組件數（不規則佈局；存在時優先於 rows × columns）
    pub row_counts: Option<Vec<u32>>,
}

impl PanelConfig {
    /// 創建規則網格佈局
    pub fn grid(panel_model_id: impl Into<String>, rows: u32, columns: u32) -> Self {
        Self {
            panel_model_id: panel_model_id.into(),
            orientation: Orientation::Portrait,
            rows,
            columns,
            row_counts: None,
        }
    }

    /// 建構器模式：設置擺放方向
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// 建構器模式：設置不規則逐列配置
    pub fn with_row_counts(mut self, row_counts: Vec<u32>) -> Self {
        self.row_counts = Some(row_counts);
        self
    }

    /// 組件總數（推導值）
    pub fn panel_count(&self) -> u32 {
        match &self.row_counts {
            Some(counts) => counts.iter().sum(),
            None => self.rows * self.columns,
        }
    }

    /// 逐列組件數（規則網格展開為等長列）
    pub fn rows_layout(&self) -> Vec<u32> {
        match &self.row_counts {
            Some(counts) => counts.clone(),
            None => vec![self.columns; self.rows as usize],
        }
    }
}

/// 屋面（一個安裝面）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoofField {
    /// 屋面 id（串接配置引用此鍵）
    pub id: Uuid,

    /// 名稱（顯示用）
    pub name: String,

    /// 屋面寬度（m）
    pub width_m: f64,

    /// 屋面坡長（m）
    pub depth_m: f64,

    /// 傾角（度）
    pub pitch_deg: f64,

    /// 方位角（度，0 = 正南）
    pub azimuth_deg: f64,

    /// 屋面類型
    pub roof_type: RoofType,

    /// 邊緣安全邊距（m）
    pub edge_margin_m: f64,

    /// 組件佈局
    pub panels: PanelConfig,
}

impl RoofField {
    /// 創建新的屋面
    pub fn new(name: impl Into<String>, width_m: f64, depth_m: f64, panels: PanelConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            width_m,
            depth_m,
            pitch_deg: 30.0,
            azimuth_deg: 0.0,
            roof_type: RoofType::Tile,
            edge_margin_m: 0.3,
            panels,
        }
    }

    /// 建構器模式：設置傾角與方位角
    pub fn with_slope(mut self, pitch_deg: f64, azimuth_deg: f64) -> Self {
        self.pitch_deg = pitch_deg;
        self.azimuth_deg = azimuth_deg;
        self
    }

    /// 建構器模式：設置屋面類型
    pub fn with_roof_type(mut self, roof_type: RoofType) -> Self {
        self.roof_type = roof_type;
        self
    }

    /// 建構器模式：設置安全邊距
    pub fn with_edge_margin(mut self, edge_margin_m: f64) -> Self {
        self.edge_margin_m = edge_margin_m;
        self
    }

    /// 屋面組件總數（推導值）
    pub fn panel_count(&self) -> u32 {
        self.panels.panel_count()
    }
}
