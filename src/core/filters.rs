use crate::core::configuration::TERRAIN_MASTER_COMPONENTS;
use crate::domain::model::{face_label, face_priority, Coordinate, PartEntry};
use std::cmp::Ordering;
use std::collections::HashSet;

/// 觸發 terrain master 位移的零件；比腳座判斷多一個調平件
const TERRAIN_MASTER_OFFSET_EXTRA: &str = "BP-LEV-0056-01";

/// 以含 terrain master 的橫檔數計算孔位、需要後退一個節距的零件
pub const TERRAIN_MASTER_AFFECTED_PARTS: &[&str] = &[
    "BP-FCL-0023-01",
    "BP-FCL-8050-01",
    "BP-FCL-0041-01",
    "BP-FCL-0016-01",
];

// 內側面：3 = LI 靠近前一根橫檔，7 = RI 靠近後一根橫檔
const INSIDE_LEFT: u8 = 3;
const INSIDE_RIGHT: u8 = 7;

/// 機械手臂可達範圍的門檻
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachLimits {
    /// 與橫檔距離小於此值的內側孔視為無法鑽
    pub rung_clearance: f64,
    /// z 低於此值才檢查
    pub z_threshold: f64,
}

impl Default for ReachLimits {
    fn default() -> Self {
        Self {
            rung_clearance: 120.0,
            z_threshold: -10.0,
        }
    }
}

fn face_then_descending_x(a: &Coordinate, b: &Coordinate) -> Ordering {
    face_priority(a.face)
        .cmp(&face_priority(b.face))
        .then_with(|| b.x.total_cmp(&a.x))
}

/// 穩定排序：先依面的優先序，同一面內 x 由大到小
pub fn sort_by_face_and_x(coords: &mut [Coordinate]) {
    coords.sort_by(face_then_descending_x);
}

pub fn has_terrain_master(entries: &[PartEntry]) -> bool {
    entries.iter().any(|e| {
        TERRAIN_MASTER_COMPONENTS.contains(&e.part_id.as_str()) || e.part_id == TERRAIN_MASTER_OFFSET_EXTRA
    })
}

/// 受影響零件的孔 x 減一個節距後重新排序，回傳移動的孔數
pub fn apply_terrain_master_offset(coords: &mut [Coordinate], pitch: f64) -> usize {
    let mut shifted = 0;
    for coord in coords
        .iter_mut()
        .filter(|c| TERRAIN_MASTER_AFFECTED_PARTS.contains(&c.part_id.as_str()))
    {
        coord.x -= pitch;
        shifted += 1;
    }
    sort_by_face_and_x(coords);
    tracing::info!("Terrain master detected: shifted {} holes by {}", shifted, pitch);
    shifted
}

fn is_unreachable(coord: &Coordinate, pitch: f64, limits: &ReachLimits) -> bool {
    if coord.x >= 0.0 || coord.z >= limits.z_threshold {
        return false;
    }
    let from_rung = coord.x.abs() % pitch;
    match coord.face {
        INSIDE_LEFT => from_rung < limits.rung_clearance,
        INSIDE_RIGHT => pitch - from_rung < limits.rung_clearance,
        _ => false,
    }
}

/// 移除太靠近橫檔的內側孔，回傳被移除的孔
pub fn remove_unreachable(coords: &mut Vec<Coordinate>, pitch: f64, limits: &ReachLimits) -> Vec<Coordinate> {
    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(coords)
        .into_iter()
        .partition(|c| is_unreachable(c, pitch, limits));
    *coords = kept;

    for coord in &removed {
        tracing::info!(
            "Removed unreachable hole {} X{} Z{} - {}",
            face_label(coord.face),
            coord.x,
            coord.z,
            coord.part_id
        );
    }
    removed
}

// -0.0 與 0.0 視為同一位置
fn position_key(coord: &Coordinate) -> (u64, u64, u64) {
    (
        (coord.x + 0.0).to_bits(),
        (coord.y + 0.0).to_bits(),
        (coord.z + 0.0).to_bits(),
    )
}

/// 相同 (x, y, z) 的孔只保留第一個
pub fn remove_duplicates(coords: &mut Vec<Coordinate>) -> usize {
    let before = coords.len();
    let mut seen = HashSet::new();
    coords.retain(|c| seen.insert(position_key(c)));
    let removed = before - coords.len();
    if removed > 0 {
        tracing::debug!("Removed {} duplicate holes", removed);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(part_id: &str, x: f64, z: f64, face: u8) -> Coordinate {
        Coordinate {
            x,
            y: 0.0,
            z,
            part_id: part_id.to_string(),
            description: String::new(),
            diameter: 6.5,
            face,
        }
    }

    #[test]
    fn test_sort_by_face_priority_then_descending_x() {
        let mut coords = vec![
            coord("A", -10.0, 0.0, 8),
            coord("B", -50.0, 0.0, 7),
            coord("C", -5.0, 0.0, 7),
            coord("D", 0.0, 0.0, 1),
            coord("E", -5.0, 0.0, 7),
        ];
        sort_by_face_and_x(&mut coords);

        let order: Vec<&str> = coords.iter().map(|c| c.part_id.as_str()).collect();
        assert_eq!(order, vec!["C", "E", "B", "D", "A"]);

        let again = {
            let mut copy = coords.clone();
            sort_by_face_and_x(&mut copy);
            copy
        };
        assert_eq!(again, coords);
    }

    #[test]
    fn test_terrain_master_offset_shifts_affected_parts() {
        let mut coords = vec![
            coord("BP-FCL-0023-01", -1136.5, 0.0, 2),
            coord("BP-EXF-0032-02", -1136.5, 0.0, 2),
        ];
        let shifted = apply_terrain_master_offset(&mut coords, 305.0);

        assert_eq!(shifted, 1);
        assert_eq!(coords[0].part_id, "BP-EXF-0032-02");
        assert_eq!(coords[1].x, -1441.5);
    }

    #[test]
    fn test_has_terrain_master_includes_levelling_part() {
        assert!(has_terrain_master(&[PartEntry::new("BP-LEV-0056-01", vec![1])]));
        assert!(has_terrain_master(&[PartEntry::new("BP-LEV-8700-01", vec![1])]));
        assert!(!has_terrain_master(&[PartEntry::new("BP-EXF-0094-01", vec![1])]));
    }

    #[test]
    fn test_unreachable_inside_left_near_rung() {
        let limits = ReachLimits::default();
        let mut coords = vec![
            coord("X", -40.0, -20.0, 3),
            coord("Y", -40.0, 5.0, 3),
            coord("Z", -200.0, -20.0, 3),
        ];
        let removed = remove_unreachable(&mut coords, 305.0, &limits);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].part_id, "X");
        let kept: Vec<&str> = coords.iter().map(|c| c.part_id.as_str()).collect();
        assert_eq!(kept, vec!["Y", "Z"]);
    }

    #[test]
    fn test_unreachable_inside_right_near_next_rung() {
        let limits = ReachLimits::default();
        let mut coords = vec![
            coord("near", -250.0, -20.0, 7),
            coord("far", -40.0, -20.0, 7),
            coord("positive", 250.0, -20.0, 7),
            coord("other face", -250.0, -20.0, 6),
        ];
        let removed = remove_unreachable(&mut coords, 305.0, &limits);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].part_id, "near");
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn test_remove_duplicates_keeps_first_and_is_idempotent() {
        let mut coords = vec![
            coord("first", -10.0, 0.0, 2),
            coord("second", -10.0, 0.0, 5),
            coord("third", -10.0, -0.0, 2),
            coord("other", -20.0, 0.0, 2),
        ];
        assert_eq!(remove_duplicates(&mut coords), 2);
        let ids: Vec<&str> = coords.iter().map(|c| c.part_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "other"]);

        let once = coords.clone();
        assert_eq!(remove_duplicates(&mut coords), 0);
        assert_eq!(coords, once);
    }
}
