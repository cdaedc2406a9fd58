//! BOM 組裝引擎
//!
//! 配置 + 目錄 → 扁平零件清單的確定性轉換。
//! 目錄缺失永不中止組裝：以「À chiffrer」占位行補齊，
//! 讓清單保持完整並明確標示需人工報價的項目。

use crate::sizing::SectionChoice;
use helio_core::{Catalog, ComponentKind, Material, Orientation, ProjectConfig};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// AC 段角色標籤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcRole {
    /// 逆變器 → AC 箱
    Ac1,
    /// AC 箱 → 配電總箱
    Ac2,
}

impl AcRole {
    fn label(&self) -> &'static str {
        match self {
            AcRole::Ac1 => "AC1 onduleur → coffret AC",
            AcRole::Ac2 => "AC2 coffret AC → tableau principal",
        }
    }
}

/// 從目錄取行；缺失時產出占位行
fn material_or_placeholder(
    catalog: &Catalog,
    catalog_id: &str,
    quantity: Decimal,
    source: &str,
) -> Material {
    match catalog.get(catalog_id) {
        Some(item) => Material::from_catalog(item, quantity, source),
        None => {
            tracing::debug!("目錄缺失，產出占位行: {}", catalog_id);
            Material::to_be_priced(catalog_id, quantity, source)
        }
    }
}

/// Step 1：屋面結構件與組件（含微逆）
///
/// 依屋面幾何與支架品牌推導導軌/壓塊/掛鉤數量；跨屋面按目錄 id
/// 合併（數量相加）。
pub fn structural_materials(project: &ProjectConfig, catalog: &Catalog) -> Vec<Material> {
    let kit = crate::rules::mounting_kit(project.mounting_brand);
    let mut out: Vec<Material> = Vec::new();

    let mut add = |catalog_id: &str, quantity: Decimal, source: &str, catalog: &Catalog| {
        if let Some(existing) = out.iter_mut().find(|m| m.catalog_id == catalog_id) {
            existing.quantity += quantity;
            return;
        }
        out.push(material_or_placeholder(catalog, catalog_id, quantity, source));
    };

    for field in &project.roof_fields {
        let panel_count = field.panel_count();
        if panel_count == 0 {
            continue;
        }

        // 組件行
        add(
            &field.panels.panel_model_id,
            Decimal::from(panel_count),
            &format!("champ {} : {} panneaux", field.name, panel_count),
            catalog,
        );

        // 微逆系統：台數 = ⌈組件數 / 單機組件數⌉
        if project.inverter.brand.is_micro() {
            let per_unit = project.inverter.micro_panels_per_unit.max(1);
            add(
                &project.inverter.model_id,
                Decimal::from(panel_count.div_ceil(per_unit)),
                &format!("micro-onduleurs champ {}", field.name),
                catalog,
            );
        }

        // 列向寬度取目錄型號尺寸；橫式取高度。型號缺失時退回
        // 常見 500 Wc 級尺寸。
        let (model_width, model_height) = catalog
            .panel_model(&field.panels.panel_model_id)
            .map(|model| (model.width_m, model.height_m))
            .unwrap_or((1.134, 1.722));
        let panel_width = match field.panels.orientation {
            Orientation::Portrait => model_width,
            Orientation::Landscape => model_height,
        };

        let mut total_rail_m = 0.0_f64;
        let mut mid_clamps = 0u32;
        let mut end_clamps = 0u32;
        for row_panels in field.panels.rows_layout() {
            if row_panels == 0 {
                continue;
            }
            // 每列兩支導軌，長度 = 列寬 + 固定裕度
            let row_width = f64::from(row_panels) * panel_width + 0.2;
            total_rail_m += 2.0 * row_width;
            mid_clamps += 2 * (row_panels - 1);
            end_clamps += 4;
        }

        let rails = (total_rail_m / kit.rail_length_m).ceil() as u32;
        let hooks = (total_rail_m / 2.0 / kit.hook_spacing_m).ceil() as u32;

        let source = format!("structure champ {}", field.name);
        add(kit.rail_id, Decimal::from(rails), &source, catalog);
        add(kit.mid_clamp_id, Decimal::from(mid_clamps), &source, catalog);
        add(kit.end_clamp_id, Decimal::from(end_clamps), &source, catalog);
        add(kit.hook_id, Decimal::from(hooks), &source, catalog);
    }

    out
}

/// 按截面產生電纜卷行（C50/C100 量化，波費最小化）
///
/// 先嘗試能覆蓋聚合長度的最小卷；超過最大卷時逐卷扣減。
/// 該截面無目錄 SKU 時產出按米數的占位行。
pub fn cable_reel_materials(
    catalog: &Catalog,
    id_prefix: &str,
    section_mm2: f64,
    total_length_m: f64,
    source: &str,
) -> Vec<Material> {
    if total_length_m <= 0.0 {
        return Vec::new();
    }

    let reels = catalog.cable_reels_for_section(section_mm2, id_prefix);
    if reels.is_empty() {
        let quantity =
            Decimal::from_f64(total_length_m.ceil()).unwrap_or(Decimal::ONE);
        let placeholder_id = format!("{id_prefix}{}-SPECIAL", section_mm2 as u32);
        return vec![Material::to_be_priced(placeholder_id, quantity, source)];
    }

    let mut counts: Vec<(usize, u32)> = vec![(0, 0); reels.len()];
    let mut remaining = total_length_m;
    while remaining > 0.0 {
        // 能覆蓋剩餘長度的最小卷；否則用最大卷扣減
        let pick = reels
            .iter()
            .position(|item| match item.kind {
                ComponentKind::Cable { reel_length_m, .. } => reel_length_m >= remaining,
                _ => false,
            })
            .unwrap_or(reels.len() - 1);
        counts[pick].1 += 1;
        let reel_length = match reels[pick].kind {
            ComponentKind::Cable { reel_length_m, .. } => reel_length_m,
            _ => break,
        };
        remaining -= reel_length;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(i, n)| Material::from_catalog(reels[i], Decimal::from(n), source))
        .collect()
}

/// Step 2–3：集中式逆變器 + AC1/AC2 + 每 MPPT 直流電纜
pub fn central_electrical_materials(
    project: &ProjectConfig,
    catalog: &Catalog,
    ac1: Option<(SectionChoice, f64)>,
    ac2: Option<(SectionChoice, f64)>,
    dc_sections: &[(f64, f64)],
) -> Vec<Material> {
    let mut out = Vec::new();

    out.push(material_or_placeholder(
        catalog,
        &project.inverter.model_id,
        Decimal::ONE,
        "onduleur central",
    ));

    for (role, segment) in [(AcRole::Ac1, ac1), (AcRole::Ac2, ac2)] {
        let Some((choice, length_m)) = segment else {
            continue;
        };
        if length_m <= 0.0 {
            continue;
        }
        let source = format!(
            "{} — {} mm² × {:.0} m",
            role.label(),
            choice.section_mm2,
            length_m
        );
        out.extend(cable_reel_materials(
            catalog,
            "CAB-AC",
            choice.section_mm2,
            length_m,
            &source,
        ));
    }

    // 直流：按解析後截面跨 MPPT 聚合（正負極成對，長度 × 2）
    let mut aggregated: Vec<(f64, f64)> = Vec::new();
    for &(section, length) in dc_sections {
        if length <= 0.0 {
            continue;
        }
        match aggregated
            .iter_mut()
            .find(|(s, _)| (*s - section).abs() < 1e-9)
        {
            Some((_, total)) => *total += length * 2.0,
            None => aggregated.push((section, length * 2.0)),
        }
    }
    for (section, total_length) in aggregated {
        let source = format!("câble DC {} mm² — {:.0} m cumulés", section, total_length);
        out.extend(cable_reel_materials(
            catalog,
            "CAB-DC",
            section,
            total_length,
            &source,
        ));
    }

    out
}

/// Step 4–5：品牌配件、保護箱、充電樁部件
pub fn accessory_materials(
    project: &ProjectConfig,
    catalog: &Catalog,
    retained_breaker_a: u32,
    string_count: u32,
) -> Vec<Material> {
    let mut out = Vec::new();
    let inverter = &project.inverter;

    for rule in crate::rules::accessories_for_brand(inverter.brand, inverter.phase) {
        out.push(material_or_placeholder(
            catalog,
            rule.catalog_id,
            Decimal::from(rule.quantity),
            rule.reason,
        ));
    }

    out.push(material_or_placeholder(
        catalog,
        crate::rules::ac_box_id(inverter.phase, retained_breaker_a, inverter.has_battery),
        Decimal::ONE,
        "coffret de protection AC",
    ));

    if let Some(dc_box) = crate::rules::dc_box_id(inverter.brand, string_count) {
        out.push(material_or_placeholder(
            catalog,
            dc_box,
            Decimal::ONE,
            "coffret de protection DC",
        ));
    }

    if project.ev_charger.is_selected() {
        for rule in crate::rules::ev_charger_parts(inverter.phase) {
            out.push(material_or_placeholder(
                catalog,
                rule.catalog_id,
                Decimal::from(rule.quantity),
                rule.reason,
            ));
        }
    }

    out
}

/// Step 6：套用使用者價格覆寫（按目錄 id）
pub fn apply_price_overrides(materials: &mut [Material], project: &ProjectConfig) {
    for material in materials.iter_mut() {
        if let Some(price) = project.price_overrides.get(&material.catalog_id) {
            material.unit_price = *price;
            material.to_be_priced = false;
        }
    }
}

/// 是否為電纜行（id 樣式，否則目錄描述樣式）
fn is_cable_line(material: &Material, catalog: &Catalog) -> bool {
    if material.catalog_id.starts_with("CAB-") {
        return true;
    }
    match catalog.get(&material.catalog_id) {
        Some(item) => {
            item.is_cable()
                || item.description.to_lowercase().contains("câble")
                || item.description.to_lowercase().contains("cable")
        }
        None => false,
    }
}

/// Step 7：電纜卷行合併去重
///
/// 卷行本身已代表計算後的總長，合併取數量**最大值**而非相加
/// （相加會重複計數）；非電纜行永不合併。合併行的來源說明
/// 串接各去重來源以利追溯。冪等：對已合併清單重跑結果不變。
pub fn merge_cable_lines(materials: Vec<Material>, catalog: &Catalog) -> Vec<Material> {
    let mut out: Vec<Material> = Vec::new();

    for material in materials {
        if !is_cable_line(&material, catalog) {
            out.push(material);
            continue;
        }

        match out
            .iter_mut()
            .find(|m| m.catalog_id == material.catalog_id && is_cable_line(m, catalog))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.max(material.quantity);
                if !existing.source.contains(material.source.as_str()) {
                    existing.source = format!("{} + {}", existing.source, material.source);
                }
            }
            None => out.push(material),
        }
    }

    out
}

/// 完整 BOM 組裝（Step 1–7）
///
/// 電纜段選型結果由調用方（管線）提供，組裝本身不重算電氣。
pub fn build_bill_of_materials(
    project: &ProjectConfig,
    catalog: &Catalog,
    ac1: Option<(SectionChoice, f64)>,
    ac2: Option<(SectionChoice, f64)>,
    dc_sections: &[(f64, f64)],
    retained_breaker_a: u32,
) -> Vec<Material> {
    tracing::debug!("BOM Step 1: 結構件與組件");
    let mut materials = structural_materials(project, catalog);

    if !project.inverter.brand.is_micro() {
        tracing::debug!("BOM Step 2–3: 集中式電氣件");
        materials.extend(central_electrical_materials(
            project, catalog, ac1, ac2, dc_sections,
        ));
    } else if let Some((choice, length_m)) = ac2 {
        // 微逆系統仍有幹線段
        if length_m > 0.0 {
            let source = format!(
                "tronc AC micro-onduleurs — {} mm² × {:.0} m",
                choice.section_mm2, length_m
            );
            materials.extend(cable_reel_materials(
                catalog,
                "CAB-AC",
                choice.section_mm2,
                length_m,
                &source,
            ));
        }
    }

    tracing::debug!("BOM Step 4–5: 配件與保護箱");
    let string_count = project
        .inverter
        .dc_runs
        .iter()
        .filter(|r| r.length_m > 0.0 || r.parallel_strings > 0)
        .count() as u32;
    materials.extend(accessory_materials(
        project,
        catalog,
        retained_breaker_a,
        string_count,
    ));

    tracing::debug!("BOM Step 6: 價格覆寫");
    apply_price_overrides(&mut materials, project);

    tracing::debug!("BOM Step 7: 電纜行合併");
    merge_cable_lines(materials, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_core::{
        CatalogItem, InverterBrand, InverterConfig, InverterSpecs, PanelConfig, PanelModel, Phase,
        RoofField,
    };
    use crate::standards::ProtectionStatus;

    fn test_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(CatalogItem::new(
            "PAN-500-BF",
            "Module 500 Wc biverre",
            Decimal::from(98),
            ComponentKind::Panel(
                PanelModel::new("PAN-500-BF", "Module 500 Wc biverre", 500.0)
                    .with_electrical(45.2, 13.85, 37.8, 13.23),
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
            ("CAB-AC10-C50", 10.0, 50.0),
            ("CAB-AC10-C100", 10.0, 100.0),
            ("CAB-DC6-C50", 6.0, 50.0),
            ("CAB-DC6-C100", 6.0, 100.0),
        ] {
            catalog.insert(CatalogItem::new(
                id,
                format!("Câble {section} mm² — couronne {reel} m"),
                Decimal::from(90),
                ComponentKind::Cable {
                    section_mm2: section,
                    reel_length_m: reel,
                },
            ));
        }
        catalog.insert(CatalogItem::new(
            "K2-RAIL-420",
            "Rail K2 4,20 m",
            Decimal::from(32),
            ComponentKind::Structural,
        ));
        catalog
    }

    fn choice(section: f64) -> SectionChoice {
        SectionChoice {
            section_mm2: section,
            drop_percent: 0.5,
            status: ProtectionStatus::Ok,
            forced: false,
            oversized: false,
        }
    }

    fn project() -> ProjectConfig {
        let inverter = InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single);
        let mut project = ProjectConfig::new("Test", "33000", inverter);
        project.add_roof_field(RoofField::new(
            "Sud",
            9.0,
            5.0,
            PanelConfig::grid("PAN-500-BF", 2, 6),
        ));
        project
    }

    #[test]
    fn test_structural_materials_quantities() {
        let materials = structural_materials(&project(), &test_catalog());

        let panels = materials
            .iter()
            .find(|m| m.catalog_id == "PAN-500-BF")
            .unwrap();
        assert_eq!(panels.quantity, Decimal::from(12));

        // 2 列 × (6 × 1.134 + 0.2) × 2 導軌 = 28.02 m → ceil(28.02/4.2) = 7 支
        let rails = materials
            .iter()
            .find(|m| m.catalog_id == "K2-RAIL-420")
            .unwrap();
        assert_eq!(rails.quantity, Decimal::from(7));

        // 壓塊：中間 2×5×2 列 = 20、端部 4×2 = 8
        let mids = materials
            .iter()
            .find(|m| m.catalog_id == "K2-CLAMP-MID")
            .unwrap();
        assert_eq!(mids.quantity, Decimal::from(20));
        // 壓塊目錄缺失 → 占位行
        assert!(mids.to_be_priced);
    }

    #[test]
    fn test_rail_count_follows_panel_dimensions() {
        // 1,50 m 寬型號：2 列 × (6 × 1.5 + 0.2) × 2 導軌 = 36.8 m → 9 支
        let mut catalog = test_catalog();
        catalog.insert(CatalogItem::new(
            "PAN-600-XL",
            "Module 600 Wc grand format",
            Decimal::from(120),
            ComponentKind::Panel(
                PanelModel::new("PAN-600-XL", "Module 600 Wc grand format", 600.0)
                    .with_electrical(49.0, 14.5, 41.0, 13.9)
                    .with_dimensions(1.5, 2.0),
            ),
        ));

        let inverter = InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single);
        let mut project = ProjectConfig::new("Test", "33000", inverter);
        project.add_roof_field(RoofField::new(
            "Sud",
            10.0,
            5.0,
            PanelConfig::grid("PAN-600-XL", 2, 6),
        ));

        let materials = structural_materials(&project, &catalog);
        let rails = materials
            .iter()
            .find(|m| m.catalog_id == "K2-RAIL-420")
            .unwrap();
        assert_eq!(rails.quantity, Decimal::from(9));
    }

    #[test]
    fn test_micro_unit_count_divides_by_panels_per_unit() {
        let inverter = InverterConfig::new(InverterBrand::Enphase, "MIC-ENP-IQ8HC", Phase::Single)
            .with_micro_panels_per_unit(2);
        let mut project = ProjectConfig::new("Test", "33000", inverter);
        // 13 片 ÷ 2 → 7 台
        project.add_roof_field(RoofField::new(
            "Sud",
            9.0,
            5.0,
            PanelConfig::grid("PAN-500-BF", 1, 13),
        ));

        let materials = structural_materials(&project, &test_catalog());
        let micros = materials
            .iter()
            .find(|m| m.catalog_id == "MIC-ENP-IQ8HC")
            .unwrap();
        assert_eq!(micros.quantity, Decimal::from(7));
    }

    #[test]
    fn test_reel_quantization_prefers_smallest_covering() {
        let catalog = test_catalog();
        // 40 m → 一卷 C50
        let lines = cable_reel_materials(&catalog, "CAB-DC", 6.0, 40.0, "test");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].catalog_id, "CAB-DC6-C50");
        assert_eq!(lines[0].quantity, Decimal::ONE);

        // 80 m → 一卷 C100
        let lines = cable_reel_materials(&catalog, "CAB-DC", 6.0, 80.0, "test");
        assert_eq!(lines[0].catalog_id, "CAB-DC6-C100");

        // 130 m → C100 + C50
        let lines = cable_reel_materials(&catalog, "CAB-DC", 6.0, 130.0, "test");
        let total: Decimal = lines.iter().map(|l| l.quantity).sum();
        assert_eq!(total, Decimal::from(2));
    }

    #[test]
    fn test_reel_fallback_to_be_priced() {
        let catalog = test_catalog();
        // 16 mm² DC 無 SKU → 按米數占位
        let lines = cable_reel_materials(&catalog, "CAB-DC", 16.0, 35.0, "test");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].to_be_priced);
        assert_eq!(lines[0].quantity, Decimal::from(35));
    }

    #[test]
    fn test_zero_length_reel_sku_falls_back_to_placeholder() {
        // 卷長 0 的目錄錯誤條目：量化必須收斂到占位行而非停滯
        let mut catalog = Catalog::new();
        catalog.insert(CatalogItem::new(
            "CAB-DC6-BAD",
            "Câble solaire 6 mm²",
            Decimal::from(60),
            ComponentKind::Cable {
                section_mm2: 6.0,
                reel_length_m: 0.0,
            },
        ));

        let lines = cable_reel_materials(&catalog, "CAB-DC", 6.0, 40.0, "test");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].to_be_priced);
        assert_eq!(lines[0].quantity, Decimal::from(40));
    }

    #[test]
    fn test_merge_cable_lines_takes_max_not_sum() {
        let catalog = test_catalog();
        let item = catalog.get("CAB-DC6-C50").unwrap();
        let materials = vec![
            Material::from_catalog(item, Decimal::from(2), "MPPT 1"),
            Material::from_catalog(item, Decimal::from(3), "MPPT 2"),
        ];

        let merged = merge_cable_lines(materials, &catalog);
        assert_eq!(merged.len(), 1);
        // 卷行已是計算後總長：取最大值，相加會重複計數
        assert_eq!(merged[0].quantity, Decimal::from(3));
        assert!(merged[0].source.contains("MPPT 1"));
        assert!(merged[0].source.contains("MPPT 2"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let catalog = test_catalog();
        let item = catalog.get("CAB-AC10-C50").unwrap();
        let materials = vec![
            Material::from_catalog(item, Decimal::from(2), "AC1"),
            Material::from_catalog(item, Decimal::from(1), "AC2"),
        ];

        let once = merge_cable_lines(materials, &catalog);
        let twice = merge_cable_lines(once.clone(), &catalog);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_cable_lines_never_merged() {
        let catalog = test_catalog();
        let inverter = catalog.get("INV-HUA-6K").unwrap();
        let materials = vec![
            Material::from_catalog(inverter, Decimal::ONE, "a"),
            Material::from_catalog(inverter, Decimal::ONE, "b"),
        ];

        let merged = merge_cable_lines(materials, &catalog);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_price_override_applied() {
        let mut project = project();
        project.override_price("PAN-500-BF", Decimal::from(89));

        let bom = build_bill_of_materials(
            &project,
            &test_catalog(),
            Some((choice(10.0), 3.0)),
            Some((choice(10.0), 10.0)),
            &[(6.0, 20.0)],
            32,
        );

        let panels = bom.iter().find(|m| m.catalog_id == "PAN-500-BF").unwrap();
        assert_eq!(panels.unit_price, Decimal::from(89));
    }

    #[test]
    fn test_full_bom_contains_all_sections() {
        let bom = build_bill_of_materials(
            &project(),
            &test_catalog(),
            Some((choice(10.0), 3.0)),
            Some((choice(10.0), 10.0)),
            &[(6.0, 20.0)],
            32,
        );

        assert!(bom.iter().any(|m| m.catalog_id == "INV-HUA-6K"));
        assert!(bom.iter().any(|m| m.catalog_id.starts_with("CAB-AC10")));
        assert!(bom.iter().any(|m| m.catalog_id.starts_with("CAB-DC6")));
        assert!(bom.iter().any(|m| m.catalog_id.starts_with("BOX-AC-M1")));
        assert!(bom.iter().any(|m| m.catalog_id == "ACC-STICK-PV"));
        // AC1 3 m + AC2 10 m 同截面 → 合併後一行 C50
        let ac_lines: Vec<_> = bom
            .iter()
            .filter(|m| m.catalog_id == "CAB-AC10-C50")
            .collect();
        assert_eq!(ac_lines.len(), 1);
        assert_eq!(ac_lines[0].quantity, Decimal::ONE);
    }
}
