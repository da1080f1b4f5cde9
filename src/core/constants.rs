use crate::domain::model::{Category, PerCategory, FACE_COUNT};
use crate::domain::model::Category::{Base as B, Fly as F};

/// 單次執行專用的可變常數，Base 與 Fly 依序共用同一份
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingConstants {
    pub rung_count: u32,
    pub pitch: f64,
    pub dist_end_to_first_rung: f64,
    pub section_width: f64,
    pub stile_width: f64,
    pub stile_height: f64,
    pub stile_length: f64,
    pub dist_end_to_last_rung_cut: PerCategory<f64>,
}

impl Default for WorkingConstants {
    fn default() -> Self {
        Self {
            rung_count: 13,
            pitch: 305.0,
            dist_end_to_first_rung: 290.0,
            section_width: 450.0,
            stile_width: 30.0,
            stile_height: 76.0,
            stile_length: 3555.0,
            dist_end_to_last_rung_cut: PerCategory::new(305.0, 305.0),
        }
    }
}

impl WorkingConstants {
    /// 每個類別開始時重設外寬與第一根橫檔距離
    pub fn begin_section(&mut self, category: Category) {
        match category {
            Category::Base => {
                self.section_width = 450.0;
                self.dist_end_to_first_rung = 290.0;
            }
            Category::Fly => {
                self.section_width = 367.0;
                self.dist_end_to_first_rung = 305.0;
            }
        }
    }

    pub fn end_cut(&self, category: Category) -> f64 {
        *self.dist_end_to_last_rung_cut.get(category)
    }

    pub fn set_end_cut(&mut self, category: Category, value: f64) {
        *self.dist_end_to_last_rung_cut.get_mut(category) = value;
    }

    /// 配方檔頭的梯柱長度：第一根橫檔距離 + 節距 × (橫檔數 − 1) + min(端切距離, 節距)
    pub fn recipe_stile_length(&self, category: Category) -> f64 {
        self.dist_end_to_first_rung
            + self.pitch * f64::from(self.rung_count.saturating_sub(1))
            + self.end_cut(category).min(self.pitch)
    }

    pub fn needs_docking(&self, category: Category) -> bool {
        self.end_cut(category) < self.pitch
    }
}

/// 靜態梯段規格
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSpec {
    pub length: f64,
    pub category: Category,
    pub stile_length: f64,
    pub rung_count: u32,
}

const fn spec(length: f64, category: Category, stile_length: f64, rung_count: u32) -> SectionSpec {
    SectionSpec {
        length,
        category,
        stile_length,
        rung_count,
    }
}

pub const SECTION_TABLE: &[SectionSpec] = &[
    spec(3.9, B, 2065.0, 6),
    spec(3.9, F, 2403.0, 8),
    spec(4.0, B, 2380.0, 7),
    spec(4.0, F, 2455.0, 7),
    spec(5.1, B, 2665.0, 8),
    spec(5.1, F, 3003.0, 10),
    spec(5.2, B, 2990.0, 9),
    spec(5.2, F, 3065.0, 9),
    spec(6.3, B, 3265.0, 10),
    spec(6.3, F, 3603.0, 12),
    spec(6.4, B, 3600.0, 11),
    spec(6.4, F, 3675.0, 11),
    spec(7.5, B, 3865.0, 12),
    spec(7.5, F, 4203.0, 14),
    spec(7.6, B, 4210.0, 13),
    spec(7.6, F, 4285.0, 13),
    spec(8.7, B, 4465.0, 14),
    spec(8.7, F, 4803.0, 16),
    spec(8.8, B, 4820.0, 15),
    spec(8.8, F, 4895.0, 15),
    spec(9.4, B, 5430.0, 17),
    spec(9.4, F, 5505.0, 17),
    spec(9.6, B, 5430.0, 17),
    spec(9.6, F, 5505.0, 17),
    spec(9.8, B, 5430.0, 17),
    spec(9.8, F, 5505.0, 17),
];

pub fn lookup_section(length: f64, category: Category) -> Option<&'static SectionSpec> {
    SECTION_TABLE
        .iter()
        .find(|s| s.category == category && (s.length - length).abs() < 1e-6)
}

/// 歐規 (FEU) 梯段的節距
pub const REGIONAL_PITCH: f64 = 300.0;

pub fn regional_first_rung(category: Category) -> f64 {
    match category {
        Category::Base => 300.0,
        Category::Fly => 260.0,
    }
}

/// 某面的孔在指定軸上必須等於的值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneRule {
    pub axis: usize,
    pub value: f64,
}

/// 某面的孔在指定軸上的合理區間（開區間）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRule {
    pub axis: usize,
    pub lower: f64,
    pub upper: f64,
}

impl RangeRule {
    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// 各面代碼的平面與區間限制；面 0 沒有限制
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedGeometry {
    pub plane: [Option<PlaneRule>; FACE_COUNT],
    pub range: [Option<RangeRule>; FACE_COUNT],
}

impl ExpectedGeometry {
    pub fn for_category(category: Category, constants: &WorkingConstants) -> Self {
        let width = constants.stile_width;
        let half_height = constants.stile_height / 2.0;
        // 梯柱內側與外側在 y 軸上的位置
        let (inner, outer) = match category {
            Category::Base => (195.0, 195.0 + width),
            Category::Fly => (183.5 - width, 183.5),
        };

        let plane = |axis, value| Some(PlaneRule { axis, value });
        let range = |axis, lower, upper| Some(RangeRule { axis, lower, upper });

        Self {
            plane: [
                None,
                plane(2, half_height),
                plane(1, outer),
                plane(1, inner),
                plane(2, -half_height),
                plane(2, half_height),
                plane(1, -outer),
                plane(1, -inner),
                plane(2, -half_height),
            ],
            range: [
                None,
                range(1, inner, outer),
                range(2, -half_height, half_height),
                range(2, -half_height, half_height),
                range(1, inner, outer),
                range(1, -outer, -inner),
                range(2, -half_height, half_height),
                range(2, -half_height, half_height),
                range(1, -outer, -inner),
            ],
        }
    }
}
