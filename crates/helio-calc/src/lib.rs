//! # Helio Calculation Engine
//!
//! 光伏電氣設計與 BOM 生成引擎：純函數、單執行緒、無保留狀態。
//! 相同（配置, 目錄）輸入必得相同輸出。

pub mod bom;
pub mod branches;
pub mod calculator;
pub mod compat;
pub mod grouping;
pub mod rules;
pub mod sizing;
pub mod standards;

// Re-export 主要類型
pub use branches::MicroBranchesReport;
pub use calculator::recompute;
pub use compat::{AcCurrentBasis, CompatibilityReport, IssueSeverity};
pub use grouping::GroupedBom;
pub use sizing::{DropSeverity, SectionChoice};
pub use standards::{ProtectionStatus, StandardsTable};

use serde::{Deserialize, Serialize};

/// 單一交流段（AC1 或 AC2）選型結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcSegmentSizing {
    /// 段長（m）
    pub length_m: f64,

    /// 截面選型
    pub choice: SectionChoice,

    /// 壓降嚴重度
    pub severity: DropSeverity,
}

/// 單 MPPT 直流佈線選型結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcRunSizing {
    /// MPPT 序號
    pub mppt_index: u32,

    /// 佈線長度（m）
    pub length_m: f64,

    /// 截面選型
    pub choice: SectionChoice,

    /// 壓降嚴重度
    pub severity: DropSeverity,
}

/// 選型摘要（互動畫面、稽核報告與匯出共用同一數據源）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingSummary {
    /// AC1 段（集中式才有）
    pub ac1: Option<AcSegmentSizing>,

    /// AC2 段（幹線）
    pub ac2: Option<AcSegmentSizing>,

    /// 每 MPPT 直流選型
    pub dc_runs: Vec<DcRunSizing>,

    /// 理論最小保護額定值（A）
    pub theoretical_min_rating_a: u32,

    /// 按功率規格化的商用額定值（A）
    pub normalized_breaker_a: u32,

    /// 最終保留額定值（簽約容量映射優先於規格化值）
    pub retained_breaker_a: u32,

    /// 保留值是否來自簽約容量
    pub breaker_from_subscription: bool,

    /// 集中式系統 AC2 截面 < AC1 截面（阻斷）
    pub ac_section_order_violation: bool,
}

/// 引擎輸出：一次配置變更的全量重算結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOutput {
    /// 相容性報告
    pub compatibility: CompatibilityReport,

    /// 選型摘要
    pub sizing: SizingSummary,

    /// 微逆支路報告（微逆系統才有）
    pub micro_report: Option<MicroBranchesReport>,

    /// 扁平 BOM
    pub bom: Vec<helio_core::Material>,

    /// 分組後 BOM（顯示/匯出用）
    pub grouped: GroupedBom,

    /// 是否阻斷匯出/定稿
    pub export_blocked: bool,

    /// 阻斷原因（追溯用）
    pub blocking_reasons: Vec<String>,

    /// 缺失輸入（長度未填等）：對應段不選型，但明確列示而非靜默略過
    pub data_gaps: Vec<String>,
}
