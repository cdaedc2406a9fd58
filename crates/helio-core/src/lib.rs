//! # Helio Core
//!
//! 光伏設計引擎的核心資料模型與類型定義

pub mod catalog;
pub mod climate;
pub mod inverter;
pub mod panel;
pub mod project;
pub mod roof;

// Re-export 主要類型
pub use catalog::{Catalog, CatalogItem, ComponentKind, Material};
pub use climate::{ClimateInfo, ClimateProvider, DefaultClimateTable};
pub use inverter::{
    ConfiguredString, DcCablingRun, InverterBrand, InverterConfig, InverterSpecs, MicroBranch,
    Phase,
};
pub use panel::PanelModel;
pub use project::{
    CapacityVerdict, EvChargerOption, MountingBrand, ProjectConfig, subscribed_capacity_verdict,
};
pub use roof::{Orientation, PanelConfig, RoofField, RoofType};

/// 設計引擎錯誤類型
///
/// 僅用於調用方使用錯誤（例如串接引用了不存在的屋面）；
/// 所有業務判定（不相容、警告、缺料）以結構化報告欄位表達，永不拋錯。
#[derive(Debug, thiserror::Error)]
pub enum DimError {
    #[error("找不到屋面: {0}")]
    RoofFieldNotFound(uuid::Uuid),

    #[error("找不到組件型號: {0}")]
    PanelModelNotFound(String),

    #[error("配置不完整: {0}")]
    IncompleteConfiguration(String),

    #[error("目錄錯誤: {0}")]
    CatalogError(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DimError>;
