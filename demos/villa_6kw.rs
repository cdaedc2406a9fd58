//! 6 kWc 單相別墅完整範例
//!
//! 展示從專案配置到 BOM 分組的完整計算流程

use helio_calc::recompute;
use helio_core::*;
use rust_decimal::Decimal;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("===== Villa 6 kWc — exemple complet =====\n");

    // 步驟 1: 建立產品目錄
    println!("[1] Create Catalog");
    let catalog = create_catalog();
    println!("    Items: {}\n", catalog.len());

    // 步驟 2: 建立專案配置
    println!("[2] Configure Project");
    let field = RoofField::new("Pan sud", 9.0, 5.0, PanelConfig::grid("PAN-500-BF", 2, 6))
        .with_slope(30.0, 0.0)
        .with_roof_type(RoofType::Tile);
    println!("    Champ: {} — {} panneaux", field.name, field.panel_count());

    let mut inverter = InverterConfig::new(InverterBrand::Huawei, "INV-HUA-6K", Phase::Single)
        .with_ac_lengths(3.0, 10.0)
        .with_subscribed_capacity(30);
    inverter.add_string(ConfiguredString::new(field.id, 0, 12));
    inverter.dc_runs.push(DcCablingRun::new(0, 20.0));
    println!("    Onduleur: Huawei 6 kVA monophasé, AGCP 30 A");

    let mut project = ProjectConfig::new("Villa Dupont", "33700", inverter);
    project.add_roof_field(field);
    println!("    Site: {} ({})\n", project.site_name, project.postal_code);

    // 步驟 3: 全量重算
    println!("[3] Recompute");
    let output = recompute(&project, &catalog, &DefaultClimateTable)?;

    // 步驟 4: 相容性報告
    println!("[4] Compatibility Report");
    for mppt in &output.compatibility.mppt_analyses {
        println!(
            "    MPPT {}: {} panneaux — Voc froid {:.0} V, Vmp chaud {:.0} V, Isc calc {:.1} A",
            mppt.mppt_index, mppt.panels_in_series, mppt.voc_cold_v, mppt.vmp_hot_v, mppt.isc_calc_a
        );
        for issue in &mppt.issues {
            println!("      ! {}", issue.message);
        }
    }
    println!(
        "    Ratio DC/AC: {:.2} — compatible: {}\n",
        output.compatibility.dc_ac_ratio, output.compatibility.is_compatible
    );

    // 步驟 5: 電氣選型
    println!("[5] Electrical Sizing");
    println!(
        "    Disjoncteur: théorique {} A → retenu {} A (AGCP: {})",
        output.sizing.theoretical_min_rating_a,
        output.sizing.retained_breaker_a,
        output.sizing.breaker_from_subscription
    );
    if let Some(ac1) = &output.sizing.ac1 {
        println!(
            "    AC1: {} mm² sur {} m — chute {:.2}%",
            ac1.choice.section_mm2, ac1.length_m, ac1.choice.drop_percent
        );
    }
    if let Some(ac2) = &output.sizing.ac2 {
        println!(
            "    AC2: {} mm² sur {} m — chute {:.2}%",
            ac2.choice.section_mm2, ac2.length_m, ac2.choice.drop_percent
        );
    }
    for run in &output.sizing.dc_runs {
        println!(
            "    DC MPPT {}: {} mm² sur {} m — chute {:.2}%",
            run.mppt_index, run.choice.section_mm2, run.length_m, run.choice.drop_percent
        );
    }
    println!();

    // 步驟 6: BOM 分組輸出
    println!("[6] Grouped Bill of Materials");
    let sections: [(&str, &[Material]); 5] = [
        ("Panneaux", &output.grouped.panels),
        ("Onduleurs", &output.grouped.inverters),
        ("Électrique", &output.grouped.electrical),
        ("Structure", &output.grouped.structural),
        ("Accessoires", &output.grouped.accessories),
    ];
    let mut total = Decimal::ZERO;
    for (title, lines) in sections {
        if lines.is_empty() {
            continue;
        }
        println!("    -- {title} --");
        for line in lines {
            let flag = if line.to_be_priced { " [À chiffrer]" } else { "" };
            println!(
                "    {} × {} — {} € HT{}",
                line.quantity, line.catalog_id, line.line_total(), flag
            );
            total += line.line_total();
        }
    }
    println!("    Total HT: {total} €\n");

    println!(
        "[7] Export: {}",
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
        "INV-HUA-6K",
        "Onduleur hybride Huawei 6 kVA",
        Decimal::from(1290),
        ComponentKind::Inverter(
            InverterSpecs::new("INV-HUA-6K", "Onduleur hybride Huawei 6 kVA", 6000.0)
                .with_dc_limits(1100.0, 140.0, 980.0, 19.5, 2),
        ),
    ));

    for (id, section, reel, price) in [
        ("CAB-AC10-C50", 10.0, 50.0, 118),
        ("CAB-AC10-C100", 10.0, 100.0, 212),
        ("CAB-DC6-C50", 6.0, 50.0, 62),
        ("CAB-DC6-C100", 6.0, 100.0, 109),
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

    for (id, description, price) in [
        ("BOX-AC-M1-32", "Coffret AC monophasé 32 A", 185),
        ("BOX-DC-1E1S", "Coffret DC 1 entrée 1 sortie", 95),
    ] {
        catalog.insert(CatalogItem::new(
            id,
            description,
            Decimal::from(price),
            ComponentKind::ProtectionBox,
        ));
    }

    for (id, description, price) in [
        ("ACC-HUA-DONGLE", "Passerelle WiFi Huawei", 45),
        ("ACC-HUA-DTSU666", "Compteur DTSU666 monophasé", 89),
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
