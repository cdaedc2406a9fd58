//! 微型逆變器系統完整範例
//!
//! 展示 Enphase 系統的支路分析與 BOM 生成

use helio_calc::recompute;
use helio_core::*;
use rust_decimal::Decimal;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("===== Micro-onduleurs Enphase — exemple complet =====\n");

    // 步驟 1: 建立目錄
    println!("[1] Create Catalog");
    let catalog = create_catalog();
    println!("    Items: {}\n", catalog.len());

    // 步驟 2: 專案配置 — 16 panneaux sur deux branches
    println!("[2] Configure Project");
    let field = RoofField::new("Pan est", 10.0, 7.0, PanelConfig::grid("PAN-500-BF", 2, 8))
        .with_slope(25.0, -90.0);

    let mut inverter = InverterConfig::new(InverterBrand::Enphase, "MIC-ENP-IQ8P", Phase::Single)
        .with_ac_lengths(0.0, 12.0);
    inverter.add_string(ConfiguredString::new(field.id, 0, 16));
    inverter
        .micro_branches
        .push(MicroBranch::new(0, 8, 15.0, 6.0));
    inverter
        .micro_branches
        .push(MicroBranch::new(1, 8, 22.0, 6.0));
    println!("    16 × IQ8+ en 2 branches de 8, tronc AC 12 m");

    let mut project = ProjectConfig::new("Longère Martin", "44300", inverter);
    project.add_roof_field(field);
    println!("    Site: {} ({})\n", project.site_name, project.postal_code);

    // 步驟 3: 全量重算
    println!("[3] Recompute");
    let output = recompute(&project, &catalog, &DefaultClimateTable)?;

    // 步驟 4: 支路報告
    println!("[4] Branch Report");
    if let Some(report) = &output.micro_report {
        for branch in &report.branches {
            println!(
                "    Branche {}: {} micros — {:.1} A, chute {:.2}%",
                branch.index, branch.micro_count, branch.current_a, branch.drop_percent
            );
            for issue in &branch.issues {
                println!("      ! {}", issue.message);
            }
        }
        println!(
            "    Chute cumulée côté production: {:.2}% (pire branche {:.2}% + tronc {:.2}%)",
            report.cumulative_drop_percent,
            report.worst_branch_drop_percent,
            report.trunk_drop_percent
        );
        println!(
            "    Puissance AC système: {:.0} VA — compatible: {}\n",
            report.system_ac_power_va, report.is_compatible
        );
    }

    // 步驟 5: BOM
    println!("[5] Bill of Materials");
    let mut total = Decimal::ZERO;
    for line in &output.bom {
        let flag = if line.to_be_priced { " [À chiffrer]" } else { "" };
        println!(
            "    {} × {} — {} € HT{}",
            line.quantity, line.catalog_id, line.line_total(), flag
        );
        total += line.line_total();
    }
    println!("    Total HT: {total} €\n");

    println!(
        "[6] Export: {}",
        if output.export_blocked { "BLOQUÉ" } else { "autorisé" }
    );
    for reason in &output.blocking_reasons {
        println!("    - {reason}");
    }

    Ok(())
}

fn create_catalog() -> Catalog {
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
        "MIC-ENP-IQ8P",
        "Micro-onduleur Enphase IQ8+",
        Decimal::from(165),
        ComponentKind::Micro(
            InverterSpecs::new("MIC-ENP-IQ8P", "Micro-onduleur Enphase IQ8+", 480.0)
                .with_dc_limits(60.0, 0.0, 0.0, 0.0, 0),
        ),
    ));

    for (id, section, reel, price) in [
        ("CAB-AC10-C50", 10.0, 50.0, 118),
        ("CAB-AC16-C50", 16.0, 50.0, 172),
    ] {
        catalog.insert(CatalogItem::new(
            id,
            format!("Câble {section} mm² — couronne {reel} m"),
            Decimal::from(price),
            ComponentKind::Cable {
                section_mm2: section,
                reel_length_m: reel,
            },
        ));
    }

    for (id, description, price) in [
        ("K2-RAIL-420", "Rail K2 CrossRail 4,20 m", 32),
        ("K2-CLAMP-MID", "Pince intermédiaire K2", 2),
        ("K2-CLAMP-END", "Pince d'extrémité K2", 2),
        ("K2-HOOK-CROSS", "Crochet de toit K2", 6),
    ] {
        catalog.insert(CatalogItem::new(
            id,
            description,
            Decimal::from(price),
            ComponentKind::Structural,
        ));
    }

    catalog.insert(CatalogItem::new(
        "BOX-AC-M1-63",
        "Coffret AC monophasé 63 A",
        Decimal::from(240),
        ComponentKind::ProtectionBox,
    ));

    for (id, description, price) in [
        ("ACC-ENP-ENVOY", "Passerelle Enphase Envoy-S", 420),
        ("ACC-ENP-CT", "Transformateur de courant Enphase", 35),
        ("CAB-TER16-C25", "Câble de terre 16 mm² — couronne 25 m", 48),
        ("ACC-STICK-PV", "Étiquettes réglementaires PV", 12),
    ] {
        catalog.insert(CatalogItem::new(
            id,
            description,
            Decimal::from(price),
            ComponentKind::Accessory,
        ));
    }

    catalog
}
