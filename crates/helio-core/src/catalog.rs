//! 產品目錄與 BOM 行模型
//!
//! 目錄由外部供應；引擎只讀，永不修改。

use crate::inverter::InverterSpecs;
use crate::panel::PanelModel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 目錄組件種類（帶標籤變體，取代可選欄位探測）
///
/// 每個變體只攜帶該種類相關的欄位；電氣規格內嵌於組件/逆變器變體。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ComponentKind {
    /// 光伏組件
    Panel(PanelModel),
    /// 集中式逆變器
    Inverter(InverterSpecs),
    /// 微型逆變器
    Micro(InverterSpecs),
    /// 電纜（成卷銷售）
    Cable {
        /// 截面（mm²）
        section_mm2: f64,
        /// 卷長（m，C50 = 50、C100 = 100）
        reel_length_m: f64,
    },
    /// 保護箱（AC/DC）
    ProtectionBox,
    /// 結構件（導軌、壓塊、掛鉤）
    Structural,
    /// 配件（網關、電表、標識貼紙…）
    Accessory,
}

/// 目錄條目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// 目錄 id
    pub id: String,

    /// 商品描述
    pub description: String,

    /// 計量單位（"u"、"m"…）
    pub unit: String,

    /// 單價（未稅）
    pub price: Decimal,

    /// 種類
    pub kind: ComponentKind,

    /// 技術文件連結
    pub datasheet: Option<String>,
}

impl CatalogItem {
    /// 創建新的目錄條目
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        kind: ComponentKind,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            unit: "u".to_string(),
            price,
            kind,
            datasheet: None,
        }
    }

    /// 建構器模式：計量單位
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// 建構器模式：技術文件
    pub fn with_datasheet(mut self, url: impl Into<String>) -> Self {
        self.datasheet = Some(url.into());
        self
    }

    /// 是否為電纜條目
    pub fn is_cable(&self) -> bool {
        matches!(self.kind, ComponentKind::Cable { .. })
    }
}

/// 產品目錄（id → 條目，只讀）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
}

impl Catalog {
    /// 創建空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 載入條目（目錄建立期使用；引擎側只讀）
    pub fn insert(&mut self, item: CatalogItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// 按 id 查詢
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    /// 按 id 取組件電氣規格
    pub fn panel_model(&self, id: &str) -> Option<&PanelModel> {
        match self.items.get(id).map(|item| &item.kind) {
            Some(ComponentKind::Panel(model)) => Some(model),
            _ => None,
        }
    }

    /// 按 id 取逆變器（含微逆）電氣規格
    pub fn inverter_specs(&self, id: &str) -> Option<&InverterSpecs> {
        match self.items.get(id).map(|item| &item.kind) {
            Some(ComponentKind::Inverter(specs)) | Some(ComponentKind::Micro(specs)) => Some(specs),
            _ => None,
        }
    }

    /// 條目數
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 某截面的全部電纜卷條目（卷長升序）
    ///
    /// 非正卷長的條目視為目錄資料錯誤，直接排除。
    pub fn cable_reels_for_section(&self, section_mm2: f64, id_prefix: &str) -> Vec<&CatalogItem> {
        let mut reels: Vec<&CatalogItem> = self
            .items
            .values()
            .filter(|item| {
                item.id.starts_with(id_prefix)
                    && matches!(
                        item.kind,
                        ComponentKind::Cable { section_mm2: s, reel_length_m: l }
                            if (s - section_mm2).abs() < 1e-9 && l > 0.0
                    )
            })
            .collect();
        reels.sort_by(|a, b| {
            let la = match a.kind {
                ComponentKind::Cable { reel_length_m, .. } => reel_length_m,
                _ => 0.0,
            };
            let lb = match b.kind {
                ComponentKind::Cable { reel_length_m, .. } => reel_length_m,
                _ => 0.0,
            };
            la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
        });
        reels
    }
}

/// BOM 行（組裝結果）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// 目錄 id
    pub catalog_id: String,

    /// 描述（合併後可串接多個來源說明）
    pub description: String,

    /// 數量
    pub quantity: Decimal,

    /// 單價（未稅；套用價格覆寫後）
    pub unit_price: Decimal,

    /// 計量單位
    pub unit: String,

    /// 技術文件連結
    pub datasheet: Option<String>,

    /// 來源說明（追溯用，例如 "AC2 10 mm² × 10 m"）
    pub source: String,

    /// 待報價旗標（目錄缺失時的占位行）
    pub to_be_priced: bool,
}

impl Material {
    /// 從目錄條目創建 BOM 行
    pub fn from_catalog(item: &CatalogItem, quantity: Decimal, source: impl Into<String>) -> Self {
        Self {
            catalog_id: item.id.clone(),
            description: item.description.clone(),
            quantity,
            unit_price: item.price,
            unit: item.unit.clone(),
            datasheet: item.datasheet.clone(),
            source: source.into(),
            to_be_priced: false,
        }
    }

    /// 目錄缺失時的「À chiffrer」占位行
    pub fn to_be_priced(catalog_id: impl Into<String>, quantity: Decimal, source: impl Into<String>) -> Self {
        let catalog_id = catalog_id.into();
        Self {
            description: format!("À chiffrer — {catalog_id}"),
            catalog_id,
            quantity,
            unit_price: Decimal::ZERO,
            unit: "u".to_string(),
            datasheet: None,
            source: source.into(),
            to_be_priced: true,
        }
    }

    /// 行小計
    pub fn line_total(&self) -> Decimal {
        self.unit_price * self.quantity
    }
}
