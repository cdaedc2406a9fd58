//! 品牌業務規則表
//!
//! 原始業務規則多以目錄 id 內嵌判斷；此處集中為可稽核的鍵值表。
//! 微逆每支路台數上限以字面 id 為鍵：目錄新增型號時不會自動
//! 套用任何上限（既知缺口，維持原行為）。

use helio_core::{InverterBrand, MountingBrand, Phase};

/// 每支路最大微逆台數（按型號 id 字面值）
pub fn branch_limit_for(micro_model_id: &str) -> Option<u32> {
    match micro_model_id {
        "MIC-ENP-IQ8" => Some(13),
        "MIC-ENP-IQ8P" => Some(11),
        "MIC-ENP-IQ8HC" => Some(9),
        _ => None,
    }
}

/// 配件規則（目錄 id、數量、來源說明）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryRule {
    pub catalog_id: &'static str,
    pub quantity: u32,
    pub reason: &'static str,
}

/// 品牌必備配件（網關、電流互感器、電表、接地電纜、標識貼紙）
pub fn accessories_for_brand(brand: InverterBrand, phase: Phase) -> Vec<AccessoryRule> {
    let mut rules = Vec::new();

    match brand {
        InverterBrand::Huawei => {
            rules.push(AccessoryRule {
                catalog_id: "ACC-HUA-DONGLE",
                quantity: 1,
                reason: "passerelle de communication Huawei",
            });
            rules.push(AccessoryRule {
                catalog_id: match phase {
                    Phase::Single => "ACC-HUA-DTSU666",
                    Phase::Three => "ACC-HUA-DTSU666-H",
                },
                quantity: 1,
                reason: "compteur de production Huawei",
            });
        }
        InverterBrand::Fronius => {
            rules.push(AccessoryRule {
                catalog_id: "ACC-FRO-SMETER",
                quantity: 1,
                reason: "smart meter Fronius",
            });
        }
        InverterBrand::Enphase => {
            rules.push(AccessoryRule {
                catalog_id: "ACC-ENP-ENVOY",
                quantity: 1,
                reason: "passerelle Envoy",
            });
            rules.push(AccessoryRule {
                catalog_id: "ACC-ENP-CT",
                quantity: match phase {
                    Phase::Single => 2,
                    Phase::Three => 3,
                },
                reason: "transformateur de courant Enphase",
            });
        }
    }

    // 全品牌共通
    rules.push(AccessoryRule {
        catalog_id: "CAB-TER16-C25",
        quantity: 1,
        reason: "câble de terre 16 mm²",
    });
    rules.push(AccessoryRule {
        catalog_id: "ACC-STICK-PV",
        quantity: 1,
        reason: "étiquettes réglementaires photovoltaïque",
    });

    rules
}

/// AC 保護箱 id（相制 × 斷路器額定檔位 × 電池旗標）
pub fn ac_box_id(phase: Phase, breaker_rating_a: u32, has_battery: bool) -> &'static str {
    let base = match (phase, breaker_rating_a) {
        (Phase::Single, r) if r <= 20 => "BOX-AC-M1-20",
        (Phase::Single, r) if r <= 32 => "BOX-AC-M1-32",
        (Phase::Single, r) if r <= 40 => "BOX-AC-M1-40",
        (Phase::Single, _) => "BOX-AC-M1-63",
        (Phase::Three, r) if r <= 20 => "BOX-AC-T4-20",
        (Phase::Three, r) if r <= 32 => "BOX-AC-T4-32",
        (Phase::Three, _) => "BOX-AC-T4-40",
    };
    if has_battery {
        match base {
            "BOX-AC-M1-20" => "BOX-AC-M1-20-BAT",
            "BOX-AC-M1-32" => "BOX-AC-M1-32-BAT",
            "BOX-AC-M1-40" => "BOX-AC-M1-40-BAT",
            "BOX-AC-M1-63" => "BOX-AC-M1-63-BAT",
            "BOX-AC-T4-20" => "BOX-AC-T4-20-BAT",
            "BOX-AC-T4-32" => "BOX-AC-T4-32-BAT",
            _ => "BOX-AC-T4-40-BAT",
        }
    } else {
        base
    }
}

/// DC 保護箱 id（集中式逆變器按串數；微逆系統無 DC 箱）
pub fn dc_box_id(brand: InverterBrand, string_count: u32) -> Option<&'static str> {
    if brand.is_micro() || string_count == 0 {
        return None;
    }
    Some(match string_count {
        1 => "BOX-DC-1E1S",
        2 => "BOX-DC-2E2S",
        _ => "BOX-DC-3E3S",
    })
}

/// 充電樁部件與專用保護（相制規則）
pub fn ev_charger_parts(phase: Phase) -> Vec<AccessoryRule> {
    match phase {
        Phase::Single => vec![
            AccessoryRule {
                catalog_id: "EVC-BORNE-7K",
                quantity: 1,
                reason: "borne de recharge 7,4 kW",
            },
            AccessoryRule {
                catalog_id: "PRO-DJ40",
                quantity: 1,
                reason: "disjoncteur 40 A dédié borne",
            },
            AccessoryRule {
                catalog_id: "PRO-ID40-B",
                quantity: 1,
                reason: "interrupteur différentiel type B",
            },
        ],
        Phase::Three => vec![
            AccessoryRule {
                catalog_id: "EVC-BORNE-11K",
                quantity: 1,
                reason: "borne de recharge 11 kW",
            },
            AccessoryRule {
                catalog_id: "PRO-DJ40-T4",
                quantity: 1,
                reason: "disjoncteur tétrapolaire 40 A dédié borne",
            },
            AccessoryRule {
                catalog_id: "PRO-ID40-B-T4",
                quantity: 1,
                reason: "interrupteur différentiel type B tétrapolaire",
            },
        ],
    }
}

/// 支架套件參數（按品牌）
#[derive(Debug, Clone, PartialEq)]
pub struct MountingKit {
    pub rail_id: &'static str,
    /// 單支導軌長度（m）
    pub rail_length_m: f64,
    pub mid_clamp_id: &'static str,
    pub end_clamp_id: &'static str,
    pub hook_id: &'static str,
    /// 掛鉤間距（m）
    pub hook_spacing_m: f64,
}

/// 支架品牌 → 套件參數
pub fn mounting_kit(brand: MountingBrand) -> MountingKit {
    match brand {
        MountingBrand::K2Systems => MountingKit {
            rail_id: "K2-RAIL-420",
            rail_length_m: 4.20,
            mid_clamp_id: "K2-CLAMP-MID",
            end_clamp_id: "K2-CLAMP-END",
            hook_id: "K2-HOOK-CROSS",
            hook_spacing_m: 1.2,
        },
        MountingBrand::Renusol => MountingKit {
            rail_id: "REN-RAIL-330",
            rail_length_m: 3.30,
            mid_clamp_id: "REN-CLAMP-MID",
            end_clamp_id: "REN-CLAMP-END",
            hook_id: "REN-HOOK-VS",
            hook_spacing_m: 1.0,
        },
    }
}
