use serde::{Deserialize, Serialize};
use std::fmt;

/// 梯段類別：Base 固定段、Fly 伸縮段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "B")]
    Base,
    #[serde(rename = "F")]
    Fly,
}

impl Category {
    /// Base 必須先處理，Fly 的公式會用到 Base 判斷出的腳座/鎖扣類型
    pub const PROCESSING_ORDER: [Category; 2] = [Category::Base, Category::Fly];

    pub fn code(self) -> &'static str {
        match self {
            Category::Base => "B",
            Category::Fly => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "B" | "b" => Some(Category::Base),
            "F" | "f" => Some(Category::Fly),
            _ => None,
        }
    }

    /// 由子工單的產品名稱推斷類別：名稱含 "fly" 為 F，否則為 B
    pub fn from_product_name(name: &str) -> Self {
        if name.to_lowercase().contains("fly") {
            Category::Fly
        } else {
            Category::Base
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 依類別分開存放的一組值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerCategory<T> {
    pub base: T,
    pub fly: T,
}

impl<T> PerCategory<T> {
    pub fn new(base: T, fly: T) -> Self {
        Self { base, fly }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Base => &self.base,
            Category::Fly => &self.fly,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Base => &mut self.base,
            Category::Fly => &mut self.fly,
        }
    }
}

/// 鑽孔面代碼 0..=8 的數量
pub const FACE_COUNT: usize = 9;

const FACE_LABELS: [&str; FACE_COUNT] = ["0", "LU", "LO", "LI", "LD", "RU", "RO", "RI", "RD"];

// 排序優先序，以面代碼為索引
const FACE_PRIORITY: [u8; FACE_COUNT] = [0, 5, 4, 6, 7, 2, 3, 1, 8];

pub fn face_label(face: u8) -> &'static str {
    FACE_LABELS.get(face as usize).copied().unwrap_or("Unknown")
}

pub fn face_priority(face: u8) -> u8 {
    FACE_PRIORITY.get(face as usize).copied().unwrap_or(u8::MAX)
}

/// 目錄 positions 表的一列：一個零件實例的定位資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub id: i64,
    pub part_no: String,
    pub category: Category,
    pub description: String,
    pub z_offset: Option<f64>,
    pub base_x: f64,
    pub base_y: f64,
    pub base_z: f64,
    pub x_formula: Option<String>,
    pub y_formula: Option<String>,
    pub end_cut_formula: Option<String>,
}

impl PositionRecord {
    pub fn x_formula(&self) -> Option<&str> {
        non_blank(&self.x_formula)
    }

    pub fn y_formula(&self) -> Option<&str> {
        non_blank(&self.y_formula)
    }

    pub fn end_cut_formula(&self) -> Option<&str> {
        non_blank(&self.end_cut_formula)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 目錄 holes 表的一列：屬於某個實例的一個孔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoleRecord {
    pub link_id: i64,
    pub diameter: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub base_x: f64,
    pub base_y: f64,
    pub base_z: f64,
    pub face: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub id: String,
    pub description: String,
}

/// 世界座標系中的一個孔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub part_id: String,
    pub description: String,
    pub diameter: f64,
    pub face: u8,
}

impl Coordinate {
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn set_axis(&mut self, axis: usize, value: f64) {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
    }
}

pub fn axis_name(axis: usize) -> &'static str {
    match axis {
        0 => "x",
        1 => "y",
        _ => "z",
    }
}

/// 分類後的一個零件及其在目錄中的實例 ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub part_id: String,
    pub instances: Vec<i64>,
}

impl PartEntry {
    pub fn new(part_id: impl Into<String>, instances: Vec<i64>) -> Self {
        Self {
            part_id: part_id.into(),
            instances,
        }
    }
}

pub type ClassifiedParts = PerCategory<Vec<PartEntry>>;

/// ERP 工單中的一行原料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    /// ERP 產品標籤，格式為 "[CODE] Description"
    pub product: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomDocument {
    pub parent_ref: String,
    pub bom_name: String,
    pub product_display_name: String,
    pub child_category: Category,
    pub lines: Vec<BomLine>,
}

/// 配方檔頭的梯段資料
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeHeader {
    pub item: String,
    pub category: Category,
    pub outside_width: f64,
    pub pitch: f64,
    pub first_rung_offset: f64,
    pub stile_length: f64,
    pub rung_count: u32,
    pub docking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub header: RecipeHeader,
    pub coordinates: Vec<Coordinate>,
    pub text: String,
}

impl Recipe {
    pub fn category(&self) -> Category {
        self.header.category
    }
}

/// 一次執行產生的全部配方
#[derive(Debug, Clone)]
pub struct RecipeSet {
    pub recipes: Vec<Recipe>,
    pub requested: Category,
    /// 要求的梯段是否仍需對接（最後一根橫檔到端部的距離不等於節距）
    pub requested_needs_docking: bool,
}

impl RecipeSet {
    pub fn requested_recipe(&self) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.category() == self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_labels_and_unknown() {
        assert_eq!(face_label(0), "0");
        assert_eq!(face_label(3), "LI");
        assert_eq!(face_label(8), "RD");
        assert_eq!(face_label(9), "Unknown");
    }

    #[test]
    fn test_face_priority_order() {
        // face 7 (RI) sorts first after 0, face 8 (RD) sorts last
        let mut faces: Vec<u8> = (0..9).collect();
        faces.sort_by_key(|f| face_priority(*f));
        assert_eq!(faces, vec![0, 7, 5, 6, 2, 1, 3, 4, 8]);
        assert_eq!(face_priority(42), u8::MAX);
    }

    #[test]
    fn test_category_from_product_name() {
        assert_eq!(Category::from_product_name("F-LAD FEU 6.3 FLY"), Category::Fly);
        assert_eq!(Category::from_product_name("S-LAD FED BASE 9.8"), Category::Base);
        assert_eq!(Category::from_code(" f "), Some(Category::Fly));
        assert_eq!(Category::from_code("X"), None);
    }
}
