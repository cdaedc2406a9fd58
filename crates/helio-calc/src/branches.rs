//! 微逆交流支路報告
//!
//! 每支路電流以 `台數 × 單機功率 / 相電壓` 為基礎，壓降沿用
//! 交流壓降公式；「生產側累計壓降」= 最差支路壓降 + 幹線壓降。

use crate::compat::{CompatIssue, IssueSeverity};
use crate::sizing::{self, DropSeverity};
use helio_core::{MicroBranch, Phase};
use serde::{Deserialize, Serialize};

/// 支路相電壓（每支路掛單相，三相系統亦然）
const BRANCH_VOLTAGE: f64 = 230.0;

/// 單支路分析
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchAnalysis {
    /// 支路序號
    pub index: u32,

    /// 微逆台數
    pub micro_count: u32,

    /// 支路電流（A）
    pub current_a: f64,

    /// 支路壓降（%）
    pub drop_percent: f64,

    /// 議題
    pub issues: Vec<CompatIssue>,
}

impl BranchAnalysis {
    pub fn has_error(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }
}

/// 微逆支路報告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroBranchesReport {
    /// 逐支路分析
    pub branches: Vec<BranchAnalysis>,

    /// 最差支路壓降（%）
    pub worst_branch_drop_percent: f64,

    /// 幹線壓降（%，AC 幹線段）
    pub trunk_drop_percent: f64,

    /// 生產側累計壓降（最差支路 + 幹線，%）
    pub cumulative_drop_percent: f64,

    /// 系統交流參考功率（VA，台數 × 單機功率）
    pub system_ac_power_va: f64,

    /// 是否無阻斷性議題
    pub is_compatible: bool,
}

/// 建立微逆支路報告
///
/// `micro_model_id` 用於查每支路台數上限（字面 id 鍵值表）。
pub fn compute_micro_branches_report(
    branches: &[MicroBranch],
    micro_model_id: &str,
    unit_power_va: f64,
    trunk_drop_percent: f64,
) -> MicroBranchesReport {
    let branch_limit = crate::rules::branch_limit_for(micro_model_id);
    let mut analyses = Vec::new();
    let mut total_units: u32 = 0;

    for branch in branches {
        total_units += branch.micro_count;
        let current = f64::from(branch.micro_count) * unit_power_va / BRANCH_VOLTAGE;
        let drop = sizing::voltage_drop_percent(
            current,
            branch.length_m,
            branch.section_mm2,
            Phase::Single,
            BRANCH_VOLTAGE,
        );

        let mut issues = Vec::new();
        if let Some(limit) = branch_limit {
            if branch.micro_count > limit {
                issues.push(CompatIssue::error(format!(
                    "branche {} : {} micro-onduleurs pour un maximum constructeur de {limit}",
                    branch.index, branch.micro_count
                )));
            }
        }
        match sizing::drop_severity(drop) {
            DropSeverity::Blocking => issues.push(CompatIssue::error(format!(
                "branche {} : chute de tension {drop:.2}% > plafond 3%",
                branch.index
            ))),
            DropSeverity::Advisory => issues.push(CompatIssue::warning(format!(
                "branche {} : chute de tension {drop:.2}% entre 1% et 3%",
                branch.index
            ))),
            DropSeverity::Ok => {}
        }

        analyses.push(BranchAnalysis {
            index: branch.index,
            micro_count: branch.micro_count,
            current_a: current,
            drop_percent: drop,
            issues,
        });
    }

    let worst = analyses
        .iter()
        .map(|a| a.drop_percent)
        .fold(0.0_f64, f64::max);
    let is_compatible = analyses.iter().all(|a| !a.has_error());

    MicroBranchesReport {
        branches: analyses,
        worst_branch_drop_percent: worst,
        trunk_drop_percent,
        cumulative_drop_percent: worst + trunk_drop_percent,
        system_ac_power_va: f64::from(total_units) * unit_power_va,
        is_compatible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_current_basis() {
        let branches = vec![MicroBranch::new(0, 8, 15.0, 6.0)];
        let report = compute_micro_branches_report(&branches, "MIC-ENP-IQ8P", 480.0, 0.2);

        // 8 × 480 / 230 = 16.7 A
        assert!((report.branches[0].current_a - 8.0 * 480.0 / 230.0).abs() < 1e-9);
        assert!(report.is_compatible);
        assert!((report.cumulative_drop_percent
            - (report.worst_branch_drop_percent + 0.2))
            .abs()
            < 1e-12);
    }

    #[test]
    fn test_branch_over_device_limit() {
        // IQ8P 上限 11 台
        let branches = vec![MicroBranch::new(0, 12, 10.0, 6.0)];
        let report = compute_micro_branches_report(&branches, "MIC-ENP-IQ8P", 480.0, 0.0);

        assert!(!report.is_compatible);
        assert!(report.branches[0].has_error());
    }

    #[test]
    fn test_unknown_model_has_no_limit() {
        // 未知型號：不套用任何上限（既知缺口）
        let branches = vec![MicroBranch::new(0, 25, 5.0, 10.0)];
        let report = compute_micro_branches_report(&branches, "MIC-ENP-IQ9", 480.0, 0.0);

        assert!(report
            .branches[0]
            .issues
            .iter()
            .all(|i| !i.message.contains("maximum constructeur")));
    }

    #[test]
    fn test_worst_branch_selected() {
        let branches = vec![
            MicroBranch::new(0, 4, 5.0, 6.0),
            MicroBranch::new(1, 10, 30.0, 6.0),
        ];
        let report = compute_micro_branches_report(&branches, "MIC-ENP-IQ8", 480.0, 0.5);

        assert!(report.worst_branch_drop_percent >= report.branches[0].drop_percent);
        assert!((report.worst_branch_drop_percent - report.branches[1].drop_percent).abs() < 1e-12);
        assert!((report.system_ac_power_va - 14.0 * 480.0).abs() < 1e-9);
    }

    #[test]
    fn test_blocking_drop_flagged() {
        // 10 台 × 480 VA / 230 V ≈ 20.9 A sur 60 m en 2,5 mm² → > 3%
        let branches = vec![MicroBranch::new(0, 10, 60.0, 2.5)];
        let report = compute_micro_branches_report(&branches, "MIC-ENP-IQ8", 480.0, 0.0);

        assert!(!report.is_compatible);
    }
}
