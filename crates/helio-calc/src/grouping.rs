//! BOM 顯示分組
//!
//! 按 id/描述樣式歸類為顯示類別；電氣類內部固定排序：
//! 標識貼紙 → AC 箱 → 斷路器/漏保 → DC 箱 → 其餘配件。
//! 選配充電樁時，其專用保護抽出為獨立小節。

use helio_core::Material;
use serde::{Deserialize, Serialize};

/// 顯示類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Panels,
    Inverters,
    Electrical,
    Structural,
    Accessories,
}

/// 分組後的 BOM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedBom {
    pub panels: Vec<Material>,
    pub inverters: Vec<Material>,
    pub electrical: Vec<Material>,
    pub structural: Vec<Material>,
    pub accessories: Vec<Material>,
    /// 充電樁專區（選配時）
    pub ev_section: Vec<Material>,
}

/// EV 專用部件（借樁與專屬保護）
fn is_ev_item(material: &Material) -> bool {
    material.catalog_id.starts_with("EVC-")
        || material.catalog_id.starts_with("PRO-DJ40")
        || material.catalog_id.starts_with("PRO-ID40-B")
}

/// 歸類（id 前綴樣式）
pub fn categorize(material: &Material) -> Category {
    let id = material.catalog_id.as_str();
    if id.starts_with("PAN-") {
        Category::Panels
    } else if id.starts_with("INV-") || id.starts_with("MIC-") {
        Category::Inverters
    } else if id.starts_with("CAB-")
        || id.starts_with("BOX-")
        || id.starts_with("PRO-")
        || id == "ACC-STICK-PV"
    {
        Category::Electrical
    } else if id.starts_with("K2-") || id.starts_with("REN-") {
        Category::Structural
    } else {
        Category::Accessories
    }
}

/// 電氣類排序優先級（小者在前）
fn electrical_priority(material: &Material) -> u8 {
    let id = material.catalog_id.as_str();
    if id == "ACC-STICK-PV" {
        0
    } else if id.starts_with("BOX-AC") {
        1
    } else if id.starts_with("PRO-") {
        2
    } else if id.starts_with("BOX-DC") {
        3
    } else {
        4
    }
}

/// 將扁平 BOM 分組為顯示結構
pub fn group_materials(materials: Vec<Material>, ev_selected: bool) -> GroupedBom {
    let mut grouped = GroupedBom {
        panels: Vec::new(),
        inverters: Vec::new(),
        electrical: Vec::new(),
        structural: Vec::new(),
        accessories: Vec::new(),
        ev_section: Vec::new(),
    };

    for material in materials {
        if ev_selected && is_ev_item(&material) {
            grouped.ev_section.push(material);
            continue;
        }
        match categorize(&material) {
            Category::Panels => grouped.panels.push(material),
            Category::Inverters => grouped.inverters.push(material),
            Category::Electrical => grouped.electrical.push(material),
            Category::Structural => grouped.structural.push(material),
            Category::Accessories => grouped.accessories.push(material),
        }
    }

    // 穩定排序保留同優先級的組裝順序
    grouped
        .electrical
        .sort_by_key(|m| electrical_priority(m));

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn material(id: &str) -> Material {
        Material::to_be_priced(id, Decimal::ONE, "test")
    }

    #[test]
    fn test_categorize_by_prefix() {
        assert_eq!(categorize(&material("PAN-500-BF")), Category::Panels);
        assert_eq!(categorize(&material("INV-HUA-6K")), Category::Inverters);
        assert_eq!(categorize(&material("MIC-ENP-IQ8P")), Category::Inverters);
        assert_eq!(categorize(&material("CAB-DC6-C50")), Category::Electrical);
        assert_eq!(categorize(&material("K2-RAIL-420")), Category::Structural);
        assert_eq!(categorize(&material("ACC-HUA-DONGLE")), Category::Accessories);
    }

    #[test]
    fn test_electrical_ordering() {
        let materials = vec![
            material("CAB-AC10-C50"),
            material("BOX-DC-2E2S"),
            material("PRO-DJ40"),
            material("BOX-AC-M1-32"),
            material("ACC-STICK-PV"),
        ];

        let grouped = group_materials(materials, false);
        let order: Vec<&str> = grouped
            .electrical
            .iter()
            .map(|m| m.catalog_id.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "ACC-STICK-PV",
                "BOX-AC-M1-32",
                "PRO-DJ40",
                "BOX-DC-2E2S",
                "CAB-AC10-C50"
            ]
        );
    }

    #[test]
    fn test_ev_section_extraction() {
        let materials = vec![
            material("EVC-BORNE-7K"),
            material("PRO-ID40-B"),
            material("BOX-AC-M1-32"),
        ];

        let with_ev = group_materials(materials.clone(), true);
        assert_eq!(with_ev.ev_section.len(), 2);
        assert_eq!(with_ev.electrical.len(), 1);

        // 未選充電樁時不抽出
        let without_ev = group_materials(materials, false);
        assert!(without_ev.ev_section.is_empty());
        assert_eq!(without_ev.electrical.len(), 3);
    }
}
