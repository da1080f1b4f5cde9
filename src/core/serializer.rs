use crate::core::constants::WorkingConstants;
use crate::domain::model::{face_label, Category, Coordinate, RecipeHeader};
use std::fmt::Write;

/// 以本次常數組出配方檔頭
pub fn build_header(item: &str, category: Category, constants: &WorkingConstants) -> RecipeHeader {
    RecipeHeader {
        item: item.to_string(),
        category,
        outside_width: constants.section_width,
        pitch: constants.pitch,
        first_rung_offset: constants.dist_end_to_first_rung,
        stile_length: constants.recipe_stile_length(category),
        rung_count: constants.rung_count,
        docking: constants.needs_docking(category),
    }
}

/// 數值輸出；-0 一律寫成 0
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// 孔座標與孔徑一律以浮點格式輸出（整數值帶 `.0`）；-0 寫成 0.0
pub fn format_coordinate_value(value: f64) -> String {
    format!("{:?}", value + 0.0)
}

// 鑽孔機讀取的欄位名稱（含 STILELENGHT 拼字）不可更改
pub fn format_header(header: &RecipeHeader) -> String {
    format!(
        "ID:empty   ITEM: {}    TYPE:EXTENSION     FBDESIGNATION:{}     OUTSIDEWIDTH:{}     \
         PITCH:{}    FIRSTOFRUNGOFFSET:{}  STILELENGHT:{}   DOCKANGBOT:0   DOCKANGTOP:0   \
         RUNGNO:{}   DOCKING:{}     ",
        header.item,
        header.category.code(),
        format_number(header.outside_width),
        format_number(header.pitch),
        format_number(header.first_rung_offset),
        format_number(header.stile_length),
        header.rung_count,
        header.docking
    )
}

pub fn format_coordinate(coord: &Coordinate) -> String {
    format!(
        "X{} Y{} Z{} D{} P:{} - ({} - {})",
        format_coordinate_value(coord.x),
        format_coordinate_value(coord.y),
        format_coordinate_value(coord.z),
        format_coordinate_value(coord.diameter),
        face_label(coord.face),
        coord.part_id,
        coord.description
    )
}

/// 檔頭一行，之後每個孔各一行；檔尾不加換行
pub fn serialize(header: &RecipeHeader, coords: &[Coordinate]) -> String {
    let mut text = format_header(header);
    for coord in coords {
        // 寫入 String 不會失敗
        let _ = write!(text, "\n{}", format_coordinate(coord));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(docking: bool) -> RecipeHeader {
        RecipeHeader {
            item: "S-LAD FED BASE 6.3".to_string(),
            category: Category::Base,
            outside_width: 450.0,
            pitch: 305.0,
            first_rung_offset: 290.0,
            stile_length: 3335.0,
            rung_count: 10,
            docking,
        }
    }

    #[test]
    fn test_header_line() {
        assert_eq!(
            format_header(&header(true)),
            "ID:empty   ITEM: S-LAD FED BASE 6.3    TYPE:EXTENSION     FBDESIGNATION:B     \
             OUTSIDEWIDTH:450     PITCH:305    FIRSTOFRUNGOFFSET:290  STILELENGHT:3335   \
             DOCKANGBOT:0   DOCKANGTOP:0   RUNGNO:10   DOCKING:true     "
        );
        assert!(format_header(&header(false)).ends_with("DOCKING:false     "));
    }

    #[test]
    fn test_build_header_from_constants() {
        let mut constants = WorkingConstants::default();
        constants.rung_count = 10;
        constants.set_end_cut(Category::Base, 232.5);

        let header = build_header("S-LAD FED BASE 6.3", Category::Base, &constants);
        assert_eq!(header.stile_length, 290.0 + 305.0 * 9.0 + 232.5);
        assert!(header.docking);
        assert_eq!(header.outside_width, 450.0);
    }

    #[test]
    fn test_coordinate_lines() {
        let coords = vec![
            Coordinate {
                x: -1136.5,
                y: 225.0,
                z: -0.0,
                part_id: "BP-FCL-0023-01".to_string(),
                description: "BRACKET".to_string(),
                diameter: 6.5,
                face: 2,
            },
            Coordinate {
                x: -10.0,
                y: 1.0,
                z: 38.0,
                part_id: "BP-EXF-0032-02".to_string(),
                description: "GUIDE".to_string(),
                diameter: 8.0,
                face: 12,
            },
        ];
        let text = serialize(&header(false), &coords);
        let lines: Vec<&str> = text.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "X-1136.5 Y225.0 Z0.0 D6.5 P:LO - (BP-FCL-0023-01 - BRACKET)");
        assert_eq!(lines[2], "X-10.0 Y1.0 Z38.0 D8.0 P:Unknown - (BP-EXF-0032-02 - GUIDE)");
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_coordinate_values_keep_float_form() {
        assert_eq!(format_coordinate_value(-290.0), "-290.0");
        assert_eq!(format_coordinate_value(183.5), "183.5");
        assert_eq!(format_coordinate_value(-0.0), "0.0");
        assert_eq!(format_coordinate_value(0.1 + 0.2), "0.30000000000000004");
        // 檔頭沿用整數格式
        assert_eq!(format_number(305.0), "305");
        assert_eq!(format_number(-0.0), "0");
    }
}
