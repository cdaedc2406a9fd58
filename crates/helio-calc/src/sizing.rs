//! 電氣選型：壓降、截面自動選擇、斷路器規格化
//!
//! 公式約定：電阻率 ρ = 0.023 Ω·mm²/m（DC 與 AC 一致）；
//! 單相（含 DC）往返係數 2，三相係數 √3。
//! 異常輸入（長度/電流/截面 ≤ 0 或非有限值）一律回 0 壓降，不拋錯。

use crate::standards::{ProtectionStatus, StandardsTable};
use helio_core::Phase;
use serde::{Deserialize, Serialize};

/// 導體電阻率（Ω·mm²/m，銅）
pub const RESISTIVITY: f64 = 0.023;

/// AC 截面目錄（mm²，升序）
pub const AC_SECTIONS: &[f64] = &[2.5, 6.0, 10.0, 16.0, 25.0];

/// DC 截面目錄（mm²，升序）
pub const DC_SECTIONS: &[f64] = &[2.5, 6.0, 10.0, 16.0];

/// DC 自動選型下限（自動選擇永不低於 6 mm²）
pub const DC_AUTO_FLOOR: f64 = 6.0;

/// 三相商用斷路器階梯（A）
pub const BREAKER_LADDER_THREE: &[u32] = &[16, 20, 25, 32, 40];

/// 單相商用斷路器階梯（A）
pub const BREAKER_LADDER_SINGLE: &[u32] = &[16, 20, 32, 40, 63];

/// 壓降嚴重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropSeverity {
    /// ≤ 1%
    Ok,
    /// 1–3%：提示
    Advisory,
    /// > 3%：硬上限，阻斷匯出
    Blocking,
}

/// 截面選型結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionChoice {
    /// 選定截面（mm²）
    pub section_mm2: f64,

    /// 該截面下的壓降（%）
    pub drop_percent: f64,

    /// 保護判定
    pub status: ProtectionStatus,

    /// 是否為強制截面（非自動）
    pub forced: bool,

    /// 截面是否超出該額定值所需的最小規範截面（僅提示，不阻斷）
    pub oversized: bool,
}

/// 電壓降（%）
///
/// 單相/DC：ΔU = 2ρLI/S；三相：ΔU = √3ρLI/S；百分比以參考電壓計。
pub fn voltage_drop_percent(
    current_a: f64,
    length_m: f64,
    section_mm2: f64,
    phase: Phase,
    reference_voltage: f64,
) -> f64 {
    if !current_a.is_finite()
        || !length_m.is_finite()
        || !section_mm2.is_finite()
        || current_a <= 0.0
        || length_m <= 0.0
        || section_mm2 <= 0.0
        || reference_voltage <= 0.0
    {
        return 0.0;
    }

    let factor = match phase {
        Phase::Single => 2.0,
        Phase::Three => 3.0_f64.sqrt(),
    };

    let drop_v = factor * RESISTIVITY * length_m * current_a / section_mm2;
    drop_v / reference_voltage * 100.0
}

/// 壓降嚴重度分級（1% 目標、3% 硬上限）
pub fn drop_severity(drop_percent: f64) -> DropSeverity {
    if drop_percent > 3.0 {
        DropSeverity::Blocking
    } else if drop_percent > 1.0 {
        DropSeverity::Advisory
    } else {
        DropSeverity::Ok
    }
}

/// 理論最小保護額定值：ceil(1.25 × 參考電流)
pub fn theoretical_min_rating(reference_current_a: f64) -> u32 {
    if !reference_current_a.is_finite() || reference_current_a <= 0.0 {
        return 0;
    }
    (reference_current_a * 1.25).ceil() as u32
}

/// 規格化為商用斷路器額定值（向上取階梯值；超出階梯時取最大值）
pub fn normalize_breaker_rating(theoretical_min_a: u32, phase: Phase) -> u32 {
    let ladder = match phase {
        Phase::Single => BREAKER_LADDER_SINGLE,
        Phase::Three => BREAKER_LADDER_THREE,
    };
    ladder
        .iter()
        .copied()
        .find(|&r| r >= theoretical_min_a)
        .unwrap_or_else(|| *ladder.last().unwrap_or(&0))
}

/// 簽約容量（AGCP）→ 慣用表前斷路器額定值
///
/// 固定分相對照帶；有值時優先於按功率推導的規格化額定值。
pub fn subscribed_capacity_to_commercial_breaker(agcp_a: u32, phase: Phase) -> Option<u32> {
    if agcp_a == 0 {
        return None;
    }
    match phase {
        Phase::Single => match agcp_a {
            1..=15 => Some(16),
            16..=20 => Some(20),
            21..=30 => Some(32),
            31..=45 => Some(40),
            46..=60 => Some(63),
            _ => None,
        },
        Phase::Three => match agcp_a {
            1..=16 => Some(16),
            17..=20 => Some(20),
            21..=25 => Some(25),
            26..=30 => Some(32),
            31..=40 => Some(40),
            _ => None,
        },
    }
}

/// 單相業務規則：規格化額定 32/40 A 時禁用 6 mm²
fn ac_section_excluded(section_mm2: f64, phase: Phase, rating_a: u32) -> bool {
    phase == Phase::Single && matches!(rating_a, 32 | 40) && (section_mm2 - 6.0).abs() < 1e-9
}

/// AC 截面自動選擇
///
/// 第一輪：壓降 ≤ 1% 且保護 `Ok`；
/// 第二輪：壓降 ≤ 1% 且保護非 `Danger`（接受 `Info`）；
/// 無截面達到 1% 目標時回目錄最大截面（保證截面隨長度/電流
/// 單調不減；壓降是否超過 3% 硬上限由報告層判阻斷）。
pub fn compute_ac_section(
    current_a: f64,
    length_m: f64,
    phase: Phase,
    rating_a: u32,
) -> SectionChoice {
    let reference_voltage = phase.reference_voltage();
    let candidates: Vec<f64> = AC_SECTIONS
        .iter()
        .copied()
        .filter(|&s| !ac_section_excluded(s, phase, rating_a))
        .collect();

    let drop_of =
        |s: f64| voltage_drop_percent(current_a, length_m, s, phase, reference_voltage);

    for &section in &candidates {
        if drop_of(section) <= 1.0
            && StandardsTable::protection_status(section, rating_a) == ProtectionStatus::Ok
        {
            return choice(section, drop_of(section), rating_a, false);
        }
    }
    for &section in &candidates {
        if drop_of(section) <= 1.0
            && StandardsTable::protection_status(section, rating_a) != ProtectionStatus::Danger
        {
            return choice(section, drop_of(section), rating_a, false);
        }
    }

    let last = *candidates.last().unwrap_or(&25.0);
    choice(last, drop_of(last), rating_a, false)
}

/// DC 截面自動選擇（每 MPPT）
///
/// 參考電壓為該 MPPT 的熱態工作電壓；候選從 6 mm² 下限起。
/// 壓降 ≤ 1% 的最小截面；無截面達標時回目錄最大截面
/// （同樣保證單調；3% 硬上限由報告層判阻斷）。
pub fn compute_dc_auto_section(isc_calc_a: f64, length_m: f64, vmp_hot_v: f64) -> SectionChoice {
    let candidates: Vec<f64> = DC_SECTIONS
        .iter()
        .copied()
        .filter(|&s| s >= DC_AUTO_FLOOR)
        .collect();
    let rating = theoretical_min_rating(isc_calc_a);

    let drop_of = |s: f64| voltage_drop_percent(isc_calc_a, length_m, s, Phase::Single, vmp_hot_v);

    for &section in &candidates {
        if drop_of(section) <= 1.0 {
            return choice(section, drop_of(section), rating, false);
        }
    }

    let last = *candidates.last().unwrap_or(&16.0);
    choice(last, drop_of(last), rating, false)
}

/// 以強制截面評估（不自動，只算壓降與保護判定）
pub fn evaluate_forced_section(
    section_mm2: f64,
    current_a: f64,
    length_m: f64,
    phase: Phase,
    reference_voltage: f64,
    rating_a: u32,
) -> SectionChoice {
    let drop = voltage_drop_percent(current_a, length_m, section_mm2, phase, reference_voltage);
    choice(section_mm2, drop, rating_a, true)
}

fn choice(section_mm2: f64, drop_percent: f64, rating_a: u32, forced: bool) -> SectionChoice {
    SectionChoice {
        section_mm2,
        drop_percent,
        status: StandardsTable::protection_status(section_mm2, rating_a),
        forced,
        oversized: StandardsTable::is_section_oversized(section_mm2, rating_a),
    }
}
