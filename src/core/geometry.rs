use crate::core::constants::ExpectedGeometry;
use crate::domain::model::{axis_name, face_label, Coordinate};

/// 一次驗證的結果統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub corrected: usize,
    pub out_of_range: usize,
}

/// 檢查每個孔是否落在其面的平面上：不符者直接改成平面值；
/// 超出合理區間只記錄警告，不修改
pub fn validate_and_correct(coords: &mut [Coordinate], expected: &ExpectedGeometry) -> ValidationReport {
    let mut report = ValidationReport::default();

    for coord in coords.iter_mut() {
        let face = usize::from(coord.face);

        if let Some(Some(plane)) = expected.plane.get(face) {
            let current = coord.axis(plane.axis);
            if current != plane.value {
                tracing::warn!(
                    "Plane mismatch on face {} at {}: {} replaced with {} - {}",
                    face_label(coord.face),
                    axis_name(plane.axis),
                    current,
                    plane.value,
                    coord.part_id
                );
                coord.set_axis(plane.axis, plane.value);
                report.corrected += 1;
            }
        }

        if let Some(Some(range)) = expected.range.get(face) {
            let value = coord.axis(range.axis);
            if !range.contains(value) {
                tracing::warn!(
                    "Out of range on face {} at {}: {} not in ({}, {}), please validate - {}",
                    face_label(coord.face),
                    axis_name(range.axis),
                    value,
                    range.lower,
                    range.upper,
                    coord.part_id
                );
                report.out_of_range += 1;
            }
        }
    }

    if report.corrected > 0 || report.out_of_range > 0 {
        tracing::info!(
            "Geometry check: {} corrected, {} out of range",
            report.corrected,
            report.out_of_range
        );
    }
    report
}
