//! 逆變器配置與電氣規格模型

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 電網相制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// 單相（230 V）
    Single,
    /// 三相（400 V）
    Three,
}

impl Phase {
    /// 參考電壓（V）
    pub fn reference_voltage(&self) -> f64 {
        match self {
            Phase::Single => 230.0,
            Phase::Three => 400.0,
        }
    }
}

/// 逆變器品牌（配件與保護箱規則表以此為鍵）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InverterBrand {
    Huawei,
    Fronius,
    /// 微型逆變器系統
    Enphase,
}

impl InverterBrand {
    /// 是否為微型逆變器系統
    pub fn is_micro(&self) -> bool {
        matches!(self, InverterBrand::Enphase)
    }
}

/// 逆變器電氣限制規格（目錄條目，不可變）
///
/// 集中式逆變器填全部欄位；微型逆變器只有最大輸入電壓
/// 與單機交流功率有意義（無 MPPT 範圍、無 DC/AC 比概念）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterSpecs {
    /// 型號 id（目錄鍵）
    pub id: String,

    /// 商品描述
    pub description: String,

    /// 最大直流輸入電壓（V）
    pub max_input_voltage: f64,

    /// MPPT 工作電壓下限（V）
    pub min_mppt_voltage: f64,

    /// MPPT 工作電壓上限（V）
    pub max_mppt_voltage: f64,

    /// 單 MPPT 最大輸入電流（A）
    pub max_input_current: f64,

    /// MPPT 數量
    pub mppt_count: u32,

    /// 最大交流輸出功率（VA）
    pub max_ac_power_va: f64,

    /// 額定交流電流（A，可能未申報）
    pub nominal_ac_current: Option<f64>,

    /// 最大交流電流（A，可能未申報）
    pub max_ac_current: Option<f64>,
}

impl InverterSpecs {
    /// 創建新的逆變器規格
    pub fn new(id: impl Into<String>, description: impl Into<String>, max_ac_power_va: f64) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            max_input_voltage: 0.0,
            min_mppt_voltage: 0.0,
            max_mppt_voltage: 0.0,
            max_input_current: 0.0,
            mppt_count: 0,
            max_ac_power_va,
            nominal_ac_current: None,
            max_ac_current: None,
        }
    }

    /// 建構器模式：設置直流輸入限制
    pub fn with_dc_limits(
        mut self,
        max_input_voltage: f64,
        min_mppt_voltage: f64,
        max_mppt_voltage: f64,
        max_input_current: f64,
        mppt_count: u32,
    ) -> Self {
        self.max_input_voltage = max_input_voltage;
        self.min_mppt_voltage = min_mppt_voltage;
        self.max_mppt_voltage = max_mppt_voltage;
        self.max_input_current = max_input_current;
        self.mppt_count = mppt_count;
        self
    }

    /// 建構器模式：設置申報交流電流
    pub fn with_ac_currents(mut self, nominal: Option<f64>, max: Option<f64>) -> Self {
        self.nominal_ac_current = nominal;
        self.max_ac_current = max;
        self
    }
}

/// 串接配置：將屋面的組件數指派到一個 MPPT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredString {
    /// 屋面 id
    pub roof_field_id: Uuid,

    /// MPPT 序號（0 起）
    pub mppt_index: u32,

    /// 指派的組件數（串聯）
    pub panel_count: u32,
}

impl ConfiguredString {
    pub fn new(roof_field_id: Uuid, mppt_index: u32, panel_count: u32) -> Self {
        Self {
            roof_field_id,
            mppt_index,
            panel_count,
        }
    }
}

/// 每 MPPT 的直流佈線參數
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcCablingRun {
    /// MPPT 序號
    pub mppt_index: u32,

    /// 佈線長度（m，單程）
    pub length_m: f64,

    /// 強制截面（mm²；None = 自動選擇）
    pub forced_section: Option<f64>,

    /// 並聯串數
    pub parallel_strings: u32,
}

impl DcCablingRun {
    pub fn new(mppt_index: u32, length_m: f64) -> Self {
        Self {
            mppt_index,
            length_m,
            forced_section: None,
            parallel_strings: 1,
        }
    }

    /// 建構器模式：強制截面
    pub fn with_forced_section(mut self, section_mm2: f64) -> Self {
        self.forced_section = Some(section_mm2);
        self
    }

    /// 建構器模式：並聯串數
    pub fn with_parallel_strings(mut self, count: u32) -> Self {
        self.parallel_strings = count;
        self
    }
}

/// 微型逆變器交流支路
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroBranch {
    /// 支路序號
    pub index: u32,

    /// 微逆台數
    pub micro_count: u32,

    /// 支路電纜長度（m）
    pub length_m: f64,

    /// 支路電纜截面（mm²）
    pub section_mm2: f64,

    /// 所屬相（三相時 0..=2）
    pub phase_tag: u32,
}

impl MicroBranch {
    pub fn new(index: u32, micro_count: u32, length_m: f64, section_mm2: f64) -> Self {
        Self {
            index,
            micro_count,
            length_m,
            section_mm2,
            phase_tag: 0,
        }
    }

    /// 建構器模式：所屬相
    pub fn with_phase_tag(mut self, phase_tag: u32) -> Self {
        self.phase_tag = phase_tag;
        self
    }
}

/// 逆變器配置（專案層）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverterConfig {
    /// 品牌
    pub brand: InverterBrand,

    /// 型號 id（集中式逆變器或微逆型號）
    pub model_id: String,

    /// 相制
    pub phase: Phase,

    /// 是否帶電池
    pub has_battery: bool,

    /// 是否帶備援（backup）
    pub has_backup: bool,

    /// 簽約容量 AGCP（A；None = 未知）
    pub subscribed_capacity_a: Option<u32>,

    /// 串接配置（屋面 → MPPT）
    pub strings: Vec<ConfiguredString>,

    /// 每 MPPT 直流佈線
    pub dc_runs: Vec<DcCablingRun>,

    /// 微逆交流支路（僅微型系統）
    pub micro_branches: Vec<MicroBranch>,

    /// 每台微逆直驅的組件數（1 或 2，雙輸入機型為 2）
    pub micro_panels_per_unit: u32,

    /// AC1 段長度（m，逆變器 → AC 箱）
    pub ac1_length_m: f64,

    /// AC2 段長度（m，AC 箱 → 配電總箱）
    pub ac2_length_m: f64,

    /// AC1 強制截面（mm²；None = 自動）
    pub ac1_forced_section: Option<f64>,

    /// AC2 強制截面（mm²；None = 自動）
    pub ac2_forced_section: Option<f64>,
}

impl InverterConfig {
    /// 創建新的逆變器配置
    pub fn new(brand: InverterBrand, model_id: impl Into<String>, phase: Phase) -> Self {
        Self {
            brand,
            model_id: model_id.into(),
            phase,
            has_battery: false,
            has_backup: false,
            subscribed_capacity_a: None,
            strings: Vec::new(),
            dc_runs: Vec::new(),
            micro_branches: Vec::new(),
            micro_panels_per_unit: 1,
            ac1_length_m: 0.0,
            ac2_length_m: 0.0,
            ac1_forced_section: None,
            ac2_forced_section: None,
        }
    }

    /// 建構器模式：電池/備援旗標
    pub fn with_battery(mut self, has_battery: bool, has_backup: bool) -> Self {
        self.has_battery = has_battery;
        self.has_backup = has_backup;
        self
    }

    /// 建構器模式：簽約容量
    pub fn with_subscribed_capacity(mut self, agcp_a: u32) -> Self {
        self.subscribed_capacity_a = Some(agcp_a);
        self
    }

    /// 建構器模式：每台微逆直驅組件數（雙輸入機型）
    pub fn with_micro_panels_per_unit(mut self, count: u32) -> Self {
        self.micro_panels_per_unit = count.max(1);
        self
    }

    /// 建構器模式：交流段長度
    pub fn with_ac_lengths(mut self, ac1_length_m: f64, ac2_length_m: f64) -> Self {
        self.ac1_length_m = ac1_length_m;
        self.ac2_length_m = ac2_length_m;
        self
    }

    /// 添加串接配置
    pub fn add_string(&mut self, string: ConfiguredString) {
        self.strings.push(string);
    }

    /// 某屋面的已指派組件總數
    pub fn assigned_panels_for(&self, roof_field_id: Uuid) -> u32 {
        self.strings
            .iter()
            .filter(|s| s.roof_field_id == roof_field_id)
            .map(|s| s.panel_count)
            .sum()
    }

    /// 屋面組件數變更後自動重平衡串接
    ///
    /// 超額時從最近加入的串開始縮減；不足且該屋面只有一條串時，
    /// 由該串吸收新增組件。多串且不足時不自動增長（留給相容性
    /// 分析以「répartition incorrecte」阻斷）。
    pub fn rebalance_strings(&mut self, roof_field_id: Uuid, available_panels: u32) {
        let assigned = self.assigned_panels_for(roof_field_id);

        if assigned > available_panels {
            // 縮減：後加入的串先縮
            let mut excess = assigned - available_panels;
            for string in self.strings.iter_mut().rev() {
                if excess == 0 {
                    break;
                }
                if string.roof_field_id != roof_field_id {
                    continue;
                }
                let take = excess.min(string.panel_count);
                string.panel_count -= take;
                excess -= take;
            }
            // 清除縮到 0 的串
            self.strings
                .retain(|s| s.roof_field_id != roof_field_id || s.panel_count > 0);
        } else if assigned < available_panels {
            let field_strings: Vec<usize> = self
                .strings
                .iter()
                .enumerate()
                .filter(|(_, s)| s.roof_field_id == roof_field_id)
                .map(|(i, _)| i)
                .collect();

            if field_strings.len() == 1 {
                // 唯一串吸收新增組件
                self.strings[field_strings[0]].panel_count = available_panels;
            }
        }
    }
}
