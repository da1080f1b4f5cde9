use crate::domain::model::{BomDocument, BomLine};
use regex::Regex;
use std::sync::OnceLock;

const STOCK_LOCATION: &str = "BM/Stock";
const KIT_MARKER: &str = "kit";

/// 一行原料轉成分類器讀取的文字：產品、庫位、數量、單位、延伸數量
pub fn format_line(line: &BomLine) -> String {
    format!(
        "{}\t{}\t{:.2}\t{}\t{:.2}",
        line.product, STOCK_LOCATION, line.quantity, line.unit, line.quantity
    )
}

pub fn format_components(lines: &[BomLine]) -> String {
    lines.iter().map(format_line).collect::<Vec<_>>().join("\n")
}

/// "[CODE] Name" 取出 Name；沒有代碼時原樣回傳
pub fn display_name(product_label: &str) -> &str {
    match product_label.split_once("] ") {
        Some((_, name)) => name,
        None => product_label,
    }
}

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+").unwrap())
}

/// 成套 (kit) 梯子的工單沒有完整零件，需要換成對應尺寸的母工單
pub fn is_kitted(document: &BomDocument) -> bool {
    document.product_display_name.to_lowercase().contains(KIT_MARKER)
        || document.bom_name.to_lowercase().contains(KIT_MARKER)
}

/// 產品名稱中第一個 N.N 數字即為梯子尺寸
pub fn ladder_size(product_display_name: &str) -> Option<&str> {
    size_pattern().find(product_display_name).map(|m| m.as_str())
}
