//! 主重算管線
//!
//! 配置變更後由調用方顯式呼叫 `recompute`：氣候查詢 → 相容性
//! 分析 → 電氣選型 → BOM 組裝 → 顯示分組。引擎內無隱式相依
//! 追蹤，亦無呼叫間可變狀態。

use crate::bom;
use crate::branches;
use crate::compat;
use crate::grouping;
use crate::sizing;
use crate::standards::ProtectionStatus;
use crate::{AcSegmentSizing, DcRunSizing, EngineOutput, SizingSummary};
use helio_core::{Catalog, ClimateProvider, DimError, Phase, ProjectConfig};
use std::collections::HashMap;
use uuid::Uuid;

/// 全量重算入口
///
/// 業務不相容以報告欄位表達；`Err` 僅限調用方使用錯誤
/// （串接引用未知屋面、配置引用未目錄化的型號）。
pub fn recompute(
    project: &ProjectConfig,
    catalog: &Catalog,
    climate_provider: &dyn ClimateProvider,
) -> helio_core::Result<EngineOutput> {
    tracing::info!(
        "開始重算：站點 {}，{} 屋面，{} 組件",
        project.site_name,
        project.roof_fields.len(),
        project.total_panel_count()
    );

    if !project.has_active_field() {
        return Err(DimError::IncompleteConfiguration(
            "aucun champ de panneaux actif".to_string(),
        ));
    }

    // 串接引用檢查（調用方使用錯誤，非業務判定）
    for string in &project.inverter.strings {
        if project.roof_field(string.roof_field_id).is_none() {
            return Err(DimError::RoofFieldNotFound(string.roof_field_id));
        }
    }

    // 每屋面各自解析組件型號（屋面可混用不同型號）
    let mut field_models: HashMap<Uuid, &helio_core::PanelModel> = HashMap::new();
    for field in &project.roof_fields {
        let model_id = &field.panels.panel_model_id;
        let model = catalog
            .panel_model(model_id)
            .ok_or_else(|| DimError::PanelModelNotFound(model_id.clone()))?;
        field_models.insert(field.id, model);
    }
    let specs = catalog
        .inverter_specs(&project.inverter.model_id)
        .ok_or_else(|| DimError::CatalogError(format!(
            "onduleur absent du catalogue: {}",
            project.inverter.model_id
        )))?;

    // Step 1: 氣候查詢
    tracing::debug!("Step 1: 氣候查詢 {}", project.postal_code);
    let climate = climate_provider.climate_for(&project.postal_code, project.altitude_m);

    // Step 2: 相容性分析
    tracing::debug!("Step 2: 相容性分析");
    let field_counts: HashMap<Uuid, u32> = project
        .roof_fields
        .iter()
        .map(|f| (f.id, f.panel_count()))
        .collect();

    let is_micro = project.inverter.brand.is_micro();
    let compatibility = if is_micro {
        compat::compute_micro_compatibility(
            &field_models,
            &field_counts,
            specs,
            climate,
            project.inverter.micro_panels_per_unit,
            project.inverter.phase,
        )
    } else {
        compat::compute_compatibility_report(
            &field_models,
            specs,
            climate,
            &project.inverter.strings,
            &field_counts,
            project.inverter.phase,
            &project.inverter.dc_runs,
        )
    };

    // Step 3: 電氣選型
    tracing::debug!("Step 3: 電氣選型");
    let sizing_summary = compute_sizing_summary(project, &compatibility, is_micro);

    // 缺失長度不選型，但明確列示（不阻斷，不靜默）
    let mut data_gaps = Vec::new();
    if !is_micro && project.inverter.ac1_length_m <= 0.0 {
        data_gaps.push("longueur AC1 manquante : segment non dimensionné".to_string());
    }
    if project.inverter.ac2_length_m <= 0.0 {
        let segment = if is_micro { "du tronc AC" } else { "AC2" };
        data_gaps.push(format!("longueur {segment} manquante : segment non dimensionné"));
    }
    if !is_micro {
        let mut strung_mppts: Vec<u32> = project
            .inverter
            .strings
            .iter()
            .map(|s| s.mppt_index)
            .collect();
        strung_mppts.sort_unstable();
        strung_mppts.dedup();
        for mppt in strung_mppts {
            let has_run = project
                .inverter
                .dc_runs
                .iter()
                .any(|r| r.mppt_index == mppt && r.length_m > 0.0);
            if !has_run {
                data_gaps.push(format!(
                    "longueur DC MPPT {mppt} manquante : câble non dimensionné"
                ));
            }
        }
    }

    // Step 4: 微逆支路報告
    let micro_report = if is_micro {
        let trunk_drop = sizing_summary
            .ac2
            .as_ref()
            .map(|s| s.choice.drop_percent)
            .unwrap_or(0.0);
        Some(branches::compute_micro_branches_report(
            &project.inverter.micro_branches,
            &project.inverter.model_id,
            specs.max_ac_power_va,
            trunk_drop,
        ))
    } else {
        None
    };

    // Step 5: BOM 組裝
    tracing::debug!("Step 5: BOM 組裝");
    let ac1 = sizing_summary
        .ac1
        .as_ref()
        .map(|s| (s.choice, s.length_m));
    let ac2 = sizing_summary
        .ac2
        .as_ref()
        .map(|s| (s.choice, s.length_m));
    let dc_sections: Vec<(f64, f64)> = sizing_summary
        .dc_runs
        .iter()
        .map(|r| (r.choice.section_mm2, r.length_m))
        .collect();

    let bill = bom::build_bill_of_materials(
        project,
        catalog,
        ac1,
        ac2,
        &dc_sections,
        sizing_summary.retained_breaker_a,
    );

    // Step 6: 顯示分組
    tracing::debug!("Step 6: 顯示分組");
    let grouped = grouping::group_materials(bill.clone(), project.ev_charger.is_selected());

    // 匯出阻斷彙總
    let mut blocking_reasons = Vec::new();
    if !compatibility.is_compatible {
        blocking_reasons.push("incompatibilité électrique".to_string());
    }
    for segment in [&sizing_summary.ac1, &sizing_summary.ac2]
        .into_iter()
        .flatten()
    {
        if segment.severity == sizing::DropSeverity::Blocking {
            blocking_reasons.push(format!(
                "chute de tension AC {:.2}% > plafond 3%",
                segment.choice.drop_percent
            ));
        }
        if segment.choice.status == ProtectionStatus::Danger {
            blocking_reasons.push(format!(
                "protection non conforme pour section {} mm²",
                segment.choice.section_mm2
            ));
        }
    }
    for run in &sizing_summary.dc_runs {
        if run.severity == sizing::DropSeverity::Blocking {
            blocking_reasons.push(format!(
                "chute de tension DC MPPT {} : {:.2}% > plafond 3%",
                run.mppt_index, run.choice.drop_percent
            ));
        }
        if run.choice.status == ProtectionStatus::Danger {
            blocking_reasons.push(format!(
                "protection non conforme pour section DC {} mm² (MPPT {})",
                run.choice.section_mm2, run.mppt_index
            ));
        }
    }
    if sizing_summary.ac_section_order_violation {
        blocking_reasons.push("section AC2 inférieure à la section AC1".to_string());
    }
    if let Some(report) = &micro_report {
        if !report.is_compatible {
            blocking_reasons.push("branche micro-onduleurs non conforme".to_string());
        }
    }

    let export_blocked = !blocking_reasons.is_empty();
    tracing::info!(
        "重算完成：BOM {} 行，匯出阻斷 = {}",
        bill.len(),
        export_blocked
    );

    Ok(EngineOutput {
        compatibility,
        sizing: sizing_summary,
        micro_report,
        bom: bill,
        grouped,
        export_blocked,
        blocking_reasons,
        data_gaps,
    })
}

/// 選型摘要計算
///
/// 保留額定值優先序：簽約容量映射 > 按參考電流規格化。
fn compute_sizing_summary(
    project: &ProjectConfig,
    compatibility: &crate::CompatibilityReport,
    is_micro: bool,
) -> SizingSummary {
    let phase = project.inverter.phase;
    let theoretical = compatibility.theoretical_min_rating_a;
    let normalized = compatibility.normalized_breaker_a;

    let (retained, from_subscription) = match project
        .inverter
        .subscribed_capacity_a
        .and_then(|agcp| sizing::subscribed_capacity_to_commercial_breaker(agcp, phase))
    {
        Some(rating) => (rating, true),
        None => (normalized, false),
    };

    let current = compatibility.ac_reference.current_a;

    let ac_segment = |length_m: f64, forced: Option<f64>| -> Option<AcSegmentSizing> {
        if length_m <= 0.0 {
            return None;
        }
        let choice = match forced {
            Some(section) => sizing::evaluate_forced_section(
                section,
                current,
                length_m,
                phase,
                phase.reference_voltage(),
                retained,
            ),
            None => sizing::compute_ac_section(current, length_m, phase, retained),
        };
        Some(AcSegmentSizing {
            length_m,
            severity: sizing::drop_severity(choice.drop_percent),
            choice,
        })
    };

    let ac1 = if is_micro {
        None
    } else {
        ac_segment(
            project.inverter.ac1_length_m,
            project.inverter.ac1_forced_section,
        )
    };
    let ac2 = ac_segment(
        project.inverter.ac2_length_m,
        project.inverter.ac2_forced_section,
    );

    let ac_section_order_violation = match (&ac1, &ac2) {
        (Some(a1), Some(a2)) => a2.choice.section_mm2 < a1.choice.section_mm2,
        _ => false,
    };

    let mut dc_runs = Vec::new();
    if !is_micro {
        for run in &project.inverter.dc_runs {
            if run.length_m <= 0.0 {
                continue;
            }
            let analysis = compatibility
                .mppt_analyses
                .iter()
                .find(|a| a.mppt_index == run.mppt_index);
            let (isc_calc, vmp_hot) = match analysis {
                Some(a) => (a.isc_calc_a, a.vmp_hot_v),
                // 無對應 MPPT 分析時不選型（缺串接，報告層已示警）
                None => continue,
            };
            let choice = match run.forced_section {
                Some(section) => sizing::evaluate_forced_section(
                    section,
                    isc_calc,
                    run.length_m,
                    Phase::Single,
                    vmp_hot,
                    sizing::theoretical_min_rating(isc_calc),
                ),
                None => sizing::compute_dc_auto_section(isc_calc, run.length_m, vmp_hot),
            };
            dc_runs.push(DcRunSizing {
                mppt_index: run.mppt_index,
                length_m: run.length_m,
                severity: sizing::drop_severity(choice.drop_percent),
                choice,
            });
        }
    }

    SizingSummary {
        ac1,
        ac2,
        dc_runs,
        theoretical_min_rating_a: theoretical,
        normalized_breaker_a: normalized,
        retained_breaker_a: retained,
        breaker_from_subscription: from_subscription,
        ac_section_order_violation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_core::{
        CatalogItem, ComponentKind, ConfiguredString, DcCablingRun, DefaultClimateTable,
        InverterBrand, InverterConfig, InverterSpecs, PanelConfig, PanelModel, RoofField,
    };
    use rust_decimal::Decimal;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(CatalogItem::new(
            "PAN-500-BF",
            "Module 500 Wc biverre",
            Decimal::from(98),
            ComponentKind::Panel(
                PanelModel::new("PAN-500-BF", "Module 500 Wc biverre", 500.0)
                    .with_electrical(45.2, 13.85, 37.8, 13.23)
                    .with_coefficients(-0.25, -0.30),
            ),
        ));
        catalog.insert(CatalogItem::new(
            "INV-HUA-6K",
            "Onduleur hybride 6 kVA",
            Decimal::from(1290),
            ComponentKind::Inverter(
                InverterSpecs::new("INV-HUA-6K", "Onduleur hybride 6 kVA", 6000.0)
                    .with_dc_limits(1100.0, 140.0, 980.0, 19.5, 2),
            ),
        ));
        for (id, section, reel) in [
            ("CAB-AC6-C50", 6.0, 50.0),
            ("CAB-AC10-C50", 10.0, 50.0),
            ("CAB-DC6-C50", 6.0, 50.0),
            ("CAB-DC6-C100", 6.0, 100.0),
        ] {
            catalog.insert(CatalogItem::new(
                id,
                format!("Câble {section} mm² — couronne {reel} m"),
                Decimal::from(85),
                ComponentKind::Cable {
                    section_mm2: section,
                    reel_length_m: reel,
                },
            ));
        }
        catalog
    }

    fn project() -> ProjectConfig {
        let mut inverter =
            InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single)
                .with_ac_lengths(3.0, 10.0);
        let field = RoofField::new("Sud", 9.0, 5.0, PanelConfig::grid("PAN-500-BF", 2, 6));
        inverter.add_string(ConfiguredString::new(field.id, 0, 12));
        inverter.dc_runs.push(DcCablingRun::new(0, 20.0));

        let mut project = ProjectConfig::new("Maison Test", "33000", inverter);
        project.add_roof_field(field);
        project
    }

    #[test]
    fn test_recompute_full_pipeline() {
        let output = recompute(&project(), &catalog(), &DefaultClimateTable).unwrap();

        assert!(output.compatibility.is_compatible);
        assert!(!output.export_blocked, "{:?}", output.blocking_reasons);
        assert!(output.sizing.ac1.is_some());
        assert!(output.sizing.ac2.is_some());
        assert_eq!(output.sizing.dc_runs.len(), 1);
        assert!(!output.bom.is_empty());
        assert!(output.data_gaps.is_empty(), "{:?}", output.data_gaps);
    }

    #[test]
    fn test_missing_dc_length_listed_as_data_gap() {
        let mut project = project();
        // 串接存在但未填直流長度：不選型、不阻斷，列入缺失清單
        project.inverter.dc_runs.clear();

        let output = recompute(&project, &catalog(), &DefaultClimateTable).unwrap();
        assert!(output.sizing.dc_runs.is_empty());
        assert!(!output.export_blocked, "{:?}", output.blocking_reasons);
        assert!(output
            .data_gaps
            .iter()
            .any(|g| g.contains("DC MPPT 0")));
    }

    #[test]
    fn test_missing_ac_lengths_listed_as_data_gaps() {
        let mut project = project();
        project.inverter.ac1_length_m = 0.0;
        project.inverter.ac2_length_m = 0.0;

        let output = recompute(&project, &catalog(), &DefaultClimateTable).unwrap();
        assert!(output.sizing.ac1.is_none());
        assert!(output.sizing.ac2.is_none());
        assert!(output.data_gaps.iter().any(|g| g.contains("AC1")));
        assert!(output.data_gaps.iter().any(|g| g.contains("AC2")));
    }

    #[test]
    fn test_each_field_resolves_its_own_panel_model() {
        let mut catalog = catalog();
        catalog.insert(CatalogItem::new(
            "PAN-300-BF",
            "Module 300 Wc",
            Decimal::from(70),
            ComponentKind::Panel(
                PanelModel::new("PAN-300-BF", "Module 300 Wc", 300.0)
                    .with_electrical(30.0, 9.6, 25.1, 9.1)
                    .with_coefficients(-0.25, -0.30),
            ),
        ));

        let mut project = project();
        let second = RoofField::new("Ouest", 6.0, 4.0, PanelConfig::grid("PAN-300-BF", 2, 5));
        project
            .inverter
            .add_string(ConfiguredString::new(second.id, 1, 10));
        project.inverter.dc_runs.push(DcCablingRun::new(1, 15.0));
        project.add_roof_field(second);

        let output = recompute(&project, &catalog, &DefaultClimateTable).unwrap();
        let mppt1 = output
            .compatibility
            .mppt_analyses
            .iter()
            .find(|a| a.mppt_index == 1)
            .unwrap();
        // MPPT 1 以自家 300 Wc 型號計：10 × 30.0 × 1.0875 = 326.25 V
        assert!((mppt1.voc_cold_v - 326.25).abs() < 0.1, "{}", mppt1.voc_cold_v);
        // 總功率按各型號合計：12 × 500 + 10 × 300
        assert!((output.compatibility.total_dc_power_wc - 9000.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_panel_model_on_any_field_is_caller_error() {
        let mut project = project();
        project.add_roof_field(RoofField::new(
            "Ouest",
            6.0,
            4.0,
            PanelConfig::grid("PAN-INCONNU", 1, 4),
        ));

        let result = recompute(&project, &catalog(), &DefaultClimateTable);
        assert!(matches!(result, Err(DimError::PanelModelNotFound(_))));
    }

    #[test]
    fn test_recompute_deterministic() {
        let project = project();
        let catalog = catalog();
        let a = recompute(&project, &catalog, &DefaultClimateTable).unwrap();
        let b = recompute(&project, &catalog, &DefaultClimateTable).unwrap();

        assert_eq!(a.bom, b.bom);
        assert_eq!(
            a.sizing.retained_breaker_a,
            b.sizing.retained_breaker_a
        );
        assert_eq!(a.export_blocked, b.export_blocked);
    }

    #[test]
    fn test_unknown_string_reference_is_caller_error() {
        let mut project = project();
        project
            .inverter
            .add_string(ConfiguredString::new(Uuid::new_v4(), 1, 4));

        let result = recompute(&project, &catalog(), &DefaultClimateTable);
        assert!(matches!(result, Err(DimError::RoofFieldNotFound(_))));
    }

    #[test]
    fn test_no_active_field_is_incomplete() {
        let inverter = InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single);
        let project = ProjectConfig::new("Vide", "33000", inverter);

        let result = recompute(&project, &catalog(), &DefaultClimateTable);
        assert!(matches!(result, Err(DimError::IncompleteConfiguration(_))));
    }

    #[test]
    fn test_agcp_takes_precedence_over_normalized() {
        let mut project = project();
        project.inverter.subscribed_capacity_a = Some(45);

        let output = recompute(&project, &catalog(), &DefaultClimateTable).unwrap();
        assert!(output.sizing.breaker_from_subscription);
        assert_eq!(output.sizing.retained_breaker_a, 40);
    }

    #[test]
    fn test_ac_order_violation_blocks_export() {
        let mut project = project();
        // AC1 強制 10 mm²，AC2 強制 6 mm² → 順序違規
        project.inverter.ac1_forced_section = Some(10.0);
        project.inverter.ac2_forced_section = Some(6.0);

        let output = recompute(&project, &catalog(), &DefaultClimateTable).unwrap();
        assert!(output.sizing.ac_section_order_violation);
        assert!(output.export_blocked);
        assert!(output
            .blocking_reasons
            .iter()
            .any(|r| r.contains("AC2")));
    }

    #[test]
    fn test_string_mismatch_blocks_export() {
        let mut project = project();
        // 12 片屋面指派 14 片
        project.inverter.strings[0].panel_count = 8;
        let field_id = project.roof_fields[0].id;
        project
            .inverter
            .add_string(ConfiguredString::new(field_id, 1, 6));

        let output = recompute(&project, &catalog(), &DefaultClimateTable).unwrap();
        assert!(!output.compatibility.is_compatible);
        assert!(output.export_blocked);
    }
}
