//! 相容性分析：組件串 × 逆變器電氣限制
//!
//! 無狀態純函數：輸入組件型號、逆變器規格、氣候極值與串接拓撲，
//! 對每條電氣路徑（MPPT 或微逆）產出一筆分析，外加全域電氣摘要。

use helio_core::{
    ClimateInfo, ConfiguredString, DcCablingRun, InverterSpecs, PanelModel, Phase,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// 熱態電池片溫度 = 夏季最高環境溫 + 固定偏移
pub const HOT_CELL_OFFSET_C: f64 = 35.0;

/// 接近上限警告門檻（Voc 冷態 ≥ 95% 最大輸入電壓）
const VOC_WARN_RATIO: f64 = 0.95;

/// 接近下限警告門檻（Vmp 熱態 ≤ 105% MPPT 下限）
const VMP_WARN_RATIO: f64 = 1.05;

/// 議題嚴重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// 提示（不阻斷）
    Warning,
    /// 阻斷性不相容
    Error,
}

/// 分析議題
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

impl CompatIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }
}

/// 交流參考電流的取值依據（必須隨數值一起回報，
/// 下游選型/稽核/匯出才能與顯示值一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcCurrentBasis {
    /// 申報最大交流電流
    DeclaredMax,
    /// 申報額定交流電流
    DeclaredNominal,
    /// 以功率/電壓推導（單相 /230，三相 /(400×√3)）
    PowerDerived,
}

/// 交流參考電流與其依據
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcReference {
    pub current_a: f64,
    pub basis: AcCurrentBasis,
}

/// 單 MPPT 分析結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpptAnalysis {
    /// MPPT 序號
    pub mppt_index: u32,

    /// 串聯組件數（跨段合計）
    pub panels_in_series: u32,

    /// 並聯串數
    pub parallel_strings: u32,

    /// 冷態開路電壓 Voc(Tmin)（V）
    pub voc_cold_v: f64,

    /// 熱態工作電壓 Vmp(Thot)（V）
    pub vmp_hot_v: f64,

    /// 計算電流 Isc × 並聯 × 1.25（A）
    pub isc_calc_a: f64,

    /// 議題
    pub issues: Vec<CompatIssue>,
}

impl MpptAnalysis {
    /// 是否存在阻斷性議題
    pub fn has_error(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }
}

/// 相容性報告（每次配置變更全量重算，永不持久化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// 每 MPPT 分析
    pub mppt_analyses: Vec<MpptAnalysis>,

    /// 全域議題（串接分配錯誤等）
    pub global_issues: Vec<CompatIssue>,

    /// 直流總額定功率（Wc）
    pub total_dc_power_wc: f64,

    /// DC/AC 功率比
    pub dc_ac_ratio: f64,

    /// 交流參考電流與依據
    pub ac_reference: AcReference,

    /// 理論最小保護額定值（A）
    pub theoretical_min_rating_a: u32,

    /// 規格化商用斷路器額定值（A）
    pub normalized_breaker_a: u32,

    /// 是否相容（無任何阻斷性議題）
    pub is_compatible: bool,
}

/// 交流參考電流：申報最大 > 申報額定 > 功率推導
pub fn ac_reference_current(specs: &InverterSpecs, phase: Phase) -> AcReference {
    if let Some(max) = specs.max_ac_current {
        if max > 0.0 {
            return AcReference {
                current_a: max,
                basis: AcCurrentBasis::DeclaredMax,
            };
        }
    }
    if let Some(nominal) = specs.nominal_ac_current {
        if nominal > 0.0 {
            return AcReference {
                current_a: nominal,
                basis: AcCurrentBasis::DeclaredNominal,
            };
        }
    }
    let divisor = match phase {
        Phase::Single => 230.0,
        Phase::Three => 400.0 * 3.0_f64.sqrt(),
    };
    let current = if specs.max_ac_power_va > 0.0 {
        specs.max_ac_power_va / divisor
    } else {
        0.0
    };
    AcReference {
        current_a: current,
        basis: AcCurrentBasis::PowerDerived,
    }
}

/// 集中式逆變器相容性報告
///
/// `field_models`：屋面 id → 該屋面的組件型號，串可跨屋面異質混接；
/// `field_panel_counts`：屋面 id → 可用組件數，用於串接分配檢核，
/// 任一屋面的指派合計 ≠ 可用數即為阻斷性「répartition incorrecte」。
pub fn compute_compatibility_report(
    field_models: &HashMap<Uuid, &PanelModel>,
    specs: &InverterSpecs,
    climate: ClimateInfo,
    strings: &[ConfiguredString],
    field_panel_counts: &HashMap<Uuid, u32>,
    phase: Phase,
    dc_runs: &[DcCablingRun],
) -> CompatibilityReport {
    let hot_cell_c = climate.max_ambient_temperature + HOT_CELL_OFFSET_C;

    // 按 MPPT 聚合串接段
    let mut per_mppt: HashMap<u32, Vec<&ConfiguredString>> = HashMap::new();
    for string in strings {
        per_mppt.entry(string.mppt_index).or_default().push(string);
    }
    let mut mppt_indices: Vec<u32> = per_mppt.keys().copied().collect();
    mppt_indices.sort_unstable();

    let mut mppt_analyses = Vec::new();
    for mppt_index in mppt_indices {
        let segments = &per_mppt[&mppt_index];
        let panels_in_series: u32 = segments.iter().map(|s| s.panel_count).sum();
        let parallel_strings = dc_runs
            .iter()
            .find(|r| r.mppt_index == mppt_index)
            .map(|r| r.parallel_strings.max(1))
            .unwrap_or(1);

        // 跨異質段逐段合計電壓；Isc 取各段最大值
        let mut voc_cold = 0.0;
        let mut vmp_hot = 0.0;
        let mut isc_max = 0.0_f64;
        for segment in segments.iter() {
            if let Some(model) = field_models.get(&segment.roof_field_id) {
                let count = f64::from(segment.panel_count);
                voc_cold += model.voc_at(climate.min_temperature) * count;
                vmp_hot += model.vmp_at(hot_cell_c) * count;
                isc_max = isc_max.max(model.isc);
            }
        }
        let isc_calc = isc_max * f64::from(parallel_strings) * 1.25;

        let mut issues = Vec::new();
        if voc_cold > specs.max_input_voltage {
            issues.push(CompatIssue::error(format!(
                "MPPT {mppt_index} : Voc à froid {voc_cold:.0} V > tension d'entrée max {:.0} V",
                specs.max_input_voltage
            )));
        } else if voc_cold >= specs.max_input_voltage * VOC_WARN_RATIO {
            issues.push(CompatIssue::warning(format!(
                "MPPT {mppt_index} : Voc à froid {voc_cold:.0} V proche de la limite {:.0} V",
                specs.max_input_voltage
            )));
        }

        if vmp_hot < specs.min_mppt_voltage {
            issues.push(CompatIssue::error(format!(
                "MPPT {mppt_index} : Vmp à chaud {vmp_hot:.0} V < plage MPPT min {:.0} V",
                specs.min_mppt_voltage
            )));
        } else if vmp_hot <= specs.min_mppt_voltage * VMP_WARN_RATIO {
            issues.push(CompatIssue::warning(format!(
                "MPPT {mppt_index} : Vmp à chaud {vmp_hot:.0} V proche du plancher {:.0} V",
                specs.min_mppt_voltage
            )));
        }

        if isc_calc > specs.max_input_current {
            issues.push(CompatIssue::error(format!(
                "MPPT {mppt_index} : Isc corrigé {isc_calc:.1} A > courant d'entrée max {:.1} A",
                specs.max_input_current
            )));
        }

        mppt_analyses.push(MpptAnalysis {
            mppt_index,
            panels_in_series,
            parallel_strings,
            voc_cold_v: voc_cold,
            vmp_hot_v: vmp_hot,
            isc_calc_a: isc_calc,
            issues,
        });
    }

    // 串接分配檢核：指派合計必須等於屋面可用數
    let mut global_issues = Vec::new();
    let mut field_entries: Vec<(Uuid, u32)> = field_panel_counts
        .iter()
        .map(|(&id, &count)| (id, count))
        .collect();
    field_entries.sort_unstable_by_key(|(id, _)| *id);
    for (field_id, available) in field_entries {
        let assigned: u32 = strings
            .iter()
            .filter(|s| s.roof_field_id == field_id)
            .map(|s| s.panel_count)
            .sum();
        if assigned != available {
            global_issues.push(CompatIssue::error(format!(
                "répartition incorrecte : {assigned} panneaux affectés pour {available} disponibles"
            )));
        }
    }

    let total_dc_power: f64 = strings
        .iter()
        .filter_map(|s| {
            field_models
                .get(&s.roof_field_id)
                .map(|model| model.power_wc * f64::from(s.panel_count))
        })
        .sum();
    let dc_ac_ratio = if specs.max_ac_power_va > 0.0 {
        total_dc_power / specs.max_ac_power_va
    } else {
        0.0
    };

    let ac_reference = ac_reference_current(specs, phase);
    let theoretical = crate::sizing::theoretical_min_rating(ac_reference.current_a);
    let normalized = crate::sizing::normalize_breaker_rating(theoretical, phase);

    let is_compatible = global_issues.iter().all(|i| i.severity != IssueSeverity::Error)
        && mppt_analyses.iter().all(|a| !a.has_error());

    CompatibilityReport {
        mppt_analyses,
        global_issues,
        total_dc_power_wc: total_dc_power,
        dc_ac_ratio,
        ac_reference,
        theoretical_min_rating_a: theoretical,
        normalized_breaker_a: normalized,
        is_compatible,
    }
}

/// 微型逆變器相容性（單機 1–2 片組件直驅）
///
/// 對每個屋面的組件型號檢核冷態 Voc 對微逆最大輸入電壓；
/// 無 MPPT 範圍與 DC/AC 比概念。台數 = ⌈總組件數 / 單機組件數⌉，
/// 系統交流參考功率 = 台數 × 單機最大交流功率，參考電流依相制推導。
pub fn compute_micro_compatibility(
    field_models: &HashMap<Uuid, &PanelModel>,
    field_panel_counts: &HashMap<Uuid, u32>,
    micro_specs: &InverterSpecs,
    climate: ClimateInfo,
    panels_per_unit: u32,
    phase: Phase,
) -> CompatibilityReport {
    let per_unit = panels_per_unit.max(1);
    let total_panels: u32 = field_panel_counts.values().sum();
    let unit_count = total_panels.div_ceil(per_unit);

    // 每個屋面型號各檢一次（按 id 去重，順序穩定）
    let mut field_ids: Vec<Uuid> = field_models.keys().copied().collect();
    field_ids.sort_unstable();
    let mut checked_models: Vec<&str> = Vec::new();
    let mut issues = Vec::new();
    let mut voc_cold_worst = 0.0_f64;
    let mut isc_max = 0.0_f64;
    for field_id in field_ids {
        let model = field_models[&field_id];
        if checked_models.contains(&model.id.as_str()) {
            continue;
        }
        checked_models.push(&model.id);

        let voc_cold = model.voc_at(climate.min_temperature) * f64::from(per_unit);
        voc_cold_worst = voc_cold_worst.max(voc_cold);
        isc_max = isc_max.max(model.isc);
        if voc_cold > micro_specs.max_input_voltage {
            issues.push(CompatIssue::error(format!(
                "{} : Voc à froid {voc_cold:.0} V > tension d'entrée max du micro-onduleur {:.0} V",
                model.id, micro_specs.max_input_voltage
            )));
        } else if voc_cold >= micro_specs.max_input_voltage * VOC_WARN_RATIO {
            issues.push(CompatIssue::warning(format!(
                "{} : Voc à froid {voc_cold:.0} V proche de la limite {:.0} V",
                model.id, micro_specs.max_input_voltage
            )));
        }
    }

    let system_ac_power = micro_specs.max_ac_power_va * f64::from(unit_count);
    let total_dc_power: f64 = field_panel_counts
        .iter()
        .filter_map(|(id, &count)| {
            field_models
                .get(id)
                .map(|model| model.power_wc * f64::from(count))
        })
        .sum();
    let has_error = issues.iter().any(|i| i.severity == IssueSeverity::Error);

    let divisor = match phase {
        Phase::Single => 230.0,
        Phase::Three => 400.0 * 3.0_f64.sqrt(),
    };
    let reference_current = system_ac_power / divisor;
    let theoretical = crate::sizing::theoretical_min_rating(reference_current);

    CompatibilityReport {
        mppt_analyses: vec![MpptAnalysis {
            mppt_index: 0,
            panels_in_series: per_unit,
            parallel_strings: 1,
            voc_cold_v: voc_cold_worst,
            vmp_hot_v: 0.0,
            isc_calc_a: isc_max * 1.25,
            issues,
        }],
        global_issues: Vec::new(),
        total_dc_power_wc: total_dc_power,
        dc_ac_ratio: 0.0,
        ac_reference: AcReference {
            current_a: reference_current,
            basis: AcCurrentBasis::PowerDerived,
        },
        theoretical_min_rating_a: theoretical,
        normalized_breaker_a: crate::sizing::normalize_breaker_rating(theoretical, phase),
        is_compatible: !has_error,
    }
}
