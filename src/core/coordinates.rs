use crate::core::configuration::{Configuration, LadderFoot, LatchType};
use crate::core::constants::WorkingConstants;
use crate::core::formula;
use crate::domain::model::{Category, Coordinate, PartEntry, FACE_COUNT};
use crate::domain::ports::ReferenceCatalog;
use crate::utils::error::{RecipeError, Result};

/// 旋轉腳座 Base 的端切距離
pub const SWIVEL_BASE_END_CUT: f64 = 232.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EndCut {
    Pitch,
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FootMatch {
    Swivel,
    Is(LadderFoot),
    Not(LadderFoot),
}

impl FootMatch {
    fn matches(self, foot: LadderFoot) -> bool {
        match self {
            FootMatch::Swivel => foot.is_swivel(),
            FootMatch::Is(expected) => foot == expected,
            FootMatch::Not(excluded) => foot != excluded,
        }
    }
}

struct EndCutRule {
    category: Category,
    foot: FootMatch,
    latch: Option<LatchType>,
    value: EndCut,
}

const END_CUT_RULES: &[EndCutRule] = &[
    EndCutRule {
        category: Category::Fly,
        foot: FootMatch::Not(LadderFoot::TerrainMaster),
        latch: Some(LatchType::Conventional),
        value: EndCut::Pitch,
    },
    EndCutRule {
        category: Category::Fly,
        foot: FootMatch::Swivel,
        latch: None,
        value: EndCut::Pitch,
    },
    EndCutRule {
        category: Category::Fly,
        foot: FootMatch::Is(LadderFoot::RubberFoot),
        latch: None,
        value: EndCut::Pitch,
    },
    EndCutRule {
        category: Category::Base,
        foot: FootMatch::Swivel,
        latch: None,
        value: EndCut::Fixed(SWIVEL_BASE_END_CUT),
    },
    EndCutRule {
        category: Category::Base,
        foot: FootMatch::Is(LadderFoot::RubberFoot),
        latch: None,
        value: EndCut::Pitch,
    },
];

/// 依硬體組合強制的端切距離；優先於各零件算出的最小值
pub fn end_cut_override(config: &Configuration, category: Category, pitch: f64) -> Option<f64> {
    END_CUT_RULES
        .iter()
        .find(|rule| {
            rule.category == category
                && rule.foot.matches(config.ladder_foot)
                && rule.latch.map_or(true, |latch| latch == config.latch)
        })
        .map(|rule| match rule.value {
            EndCut::Pitch => pitch,
            EndCut::Fixed(value) => value,
        })
}

pub struct CoordinateGenerator<'a, C: ReferenceCatalog> {
    catalog: &'a C,
}

impl<'a, C: ReferenceCatalog> CoordinateGenerator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// 產生該類別所有零件實例的孔座標，並順帶更新端切距離
    pub fn generate(
        &self,
        entries: &[PartEntry],
        category: Category,
        config: &Configuration,
        constants: &mut WorkingConstants,
    ) -> Result<Vec<Coordinate>> {
        let mut coords = Vec::new();

        for entry in entries {
            for &instance in &entry.instances {
                match self.instance_coordinates(instance, category, config, constants) {
                    Ok(holes) => coords.extend(holes),
                    Err(err @ RecipeError::MissingCatalogRow { .. }) => {
                        tracing::warn!("{} ({}); contributing no holes", err, entry.part_id);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        tracing::debug!(
            "Generated {} raw holes for {} (end cut {})",
            coords.len(),
            category,
            constants.end_cut(category)
        );
        Ok(coords)
    }

    fn instance_coordinates(
        &self,
        instance: i64,
        category: Category,
        config: &Configuration,
        constants: &mut WorkingConstants,
    ) -> Result<Vec<Coordinate>> {
        let holes = self.catalog.holes_for_instance(instance)?;
        let position = self
            .catalog
            .position_for_instance(instance)?
            .ok_or(RecipeError::MissingCatalogRow { instance })?;

        if let Some(end_cut_formula) = position.end_cut_formula() {
            match formula::evaluate(end_cut_formula, constants, category) {
                Ok(end_cut) if end_cut < constants.end_cut(category) => {
                    constants.set_end_cut(category, end_cut);
                }
                Ok(_) => {}
                Err(err) => tracing::warn!("{}; end cut ignored for {}", err, position.part_no),
            }
            if let Some(forced) = end_cut_override(config, category, constants.pitch) {
                constants.set_end_cut(category, forced);
            }
        }

        let x_offset = offset(position.x_formula(), constants, category);
        let y_offset = offset(position.y_formula(), constants, category);
        let z_offset = position.z_offset.unwrap_or(0.0);

        let coords = holes
            .into_iter()
            .filter_map(|hole| {
                if usize::from(hole.face) >= FACE_COUNT {
                    tracing::warn!(
                        "Hole of instance {} has invalid face code {}; skipped",
                        instance,
                        hole.face
                    );
                    return None;
                }
                Some(Coordinate {
                    x: hole.x + x_offset + position.base_x + hole.base_x,
                    y: hole.y + y_offset + position.base_y + hole.base_y,
                    z: hole.z + z_offset + position.base_z + hole.base_z,
                    part_id: position.part_no.clone(),
                    description: position.description.clone(),
                    diameter: hole.diameter,
                    face: hole.face,
                })
            })
            .collect();

        Ok(coords)
    }
}

// 無公式或公式無效時偏移為 0
fn offset(expression: Option<&str>, constants: &WorkingConstants, category: Category) -> f64 {
    match expression {
        Some(expression) => formula::evaluate(expression, constants, category).unwrap_or_else(|err| {
            tracing::warn!("{}; offset treated as 0", err);
            0.0
        }),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::InMemoryCatalog;
    use crate::domain::model::{HoleRecord, PositionRecord};

    fn position(id: i64, part_no: &str, category: Category) -> PositionRecord {
        PositionRecord {
            id,
            part_no: part_no.to_string(),
            category,
            description: "BRACKET".to_string(),
            z_offset: None,
            base_x: 0.0,
            base_y: 0.0,
            base_z: 0.0,
            x_formula: None,
            y_formula: None,
            end_cut_formula: None,
        }
    }

    fn hole(link_id: i64, x: f64, y: f64, z: f64, face: u8) -> HoleRecord {
        HoleRecord {
            link_id,
            diameter: 6.5,
            x,
            y,
            z,
            base_x: 0.0,
            base_y: 0.0,
            base_z: 0.0,
            face,
        }
    }

    #[test]
    fn test_world_coordinate_sums_offsets() {
        let mut pos = position(7, "BP-FCL-0023-01", Category::Base);
        pos.base_x = -10.0;
        pos.base_y = 5.0;
        pos.base_z = 1.0;
        pos.z_offset = Some(2.0);
        pos.x_formula = Some("-(DistEndToFirstRungRaw + Pitch)".to_string());
        pos.y_formula = Some("SectionWidth/2".to_string());
        let mut h = hole(7, 1.0, 2.0, 3.0, 2);
        h.base_x = 0.5;

        let catalog = InMemoryCatalog::builder().position(pos).hole(h).build();
        let mut constants = WorkingConstants::default();
        let entries = vec![PartEntry::new("BP-FCL-0023-01", vec![7])];

        let coords = CoordinateGenerator::new(&catalog)
            .generate(&entries, Category::Base, &Configuration::default(), &mut constants)
            .unwrap();

        assert_eq!(coords.len(), 1);
        let c = &coords[0];
        assert_eq!(c.x, 1.0 + -(290.0 + 305.0) - 10.0 + 0.5);
        assert_eq!(c.y, 2.0 + 225.0 + 5.0);
        assert_eq!(c.z, 3.0 + 2.0 + 1.0);
        assert_eq!(c.part_id, "BP-FCL-0023-01");
        assert_eq!(c.description, "BRACKET");
        assert_eq!(c.face, 2);
    }

    #[test]
    fn test_end_cut_keeps_minimum() {
        let mut first = position(1, "BP-EXF-0032-02", Category::Fly);
        first.end_cut_formula = Some("Pitch - 100".to_string());
        let mut second = position(2, "BP-EXF-0033-02", Category::Fly);
        second.end_cut_formula = Some("Pitch - 50".to_string());

        let catalog = InMemoryCatalog::builder().position(first).position(second).build();
        let mut constants = WorkingConstants::default();
        let entries = vec![
            PartEntry::new("BP-EXF-0032-02", vec![1]),
            PartEntry::new("BP-EXF-0033-02", vec![2]),
        ];
        let config = Configuration {
            ladder_foot: LadderFoot::TerrainMaster,
            ..Configuration::default()
        };

        CoordinateGenerator::new(&catalog)
            .generate(&entries, Category::Fly, &config, &mut constants)
            .unwrap();
        assert_eq!(constants.end_cut(Category::Fly), 205.0);
        assert_eq!(constants.end_cut(Category::Base), 305.0);
    }

    #[test]
    fn test_swivel_foot_forces_fly_end_cut_to_pitch() {
        let mut pos = position(1, "BP-EXF-0110-02-TEMP", Category::Fly);
        pos.end_cut_formula = Some("Pitch - 100".to_string());
        let catalog = InMemoryCatalog::builder().position(pos).build();
        let mut constants = WorkingConstants::default();
        let config = Configuration {
            ladder_foot: LadderFoot::SwivelFoot,
            ..Configuration::default()
        };

        CoordinateGenerator::new(&catalog)
            .generate(
                &[PartEntry::new("BP-EXF-0110-02-TEMP", vec![1])],
                Category::Fly,
                &config,
                &mut constants,
            )
            .unwrap();
        assert_eq!(constants.end_cut(Category::Fly), constants.pitch);
    }

    #[test]
    fn test_end_cut_override_table() {
        let swivel = Configuration {
            ladder_foot: LadderFoot::SwivelNoIcePick,
            ..Configuration::default()
        };
        assert_eq!(end_cut_override(&swivel, Category::Base, 305.0), Some(232.5));
        assert_eq!(end_cut_override(&swivel, Category::Fly, 305.0), Some(305.0));

        let rubber = Configuration {
            ladder_foot: LadderFoot::RubberFoot,
            ..Configuration::default()
        };
        assert_eq!(end_cut_override(&rubber, Category::Base, 300.0), Some(300.0));

        let tm_conventional = Configuration {
            ladder_foot: LadderFoot::TerrainMaster,
            latch: LatchType::Conventional,
            is_utility: false,
        };
        assert_eq!(end_cut_override(&tm_conventional, Category::Fly, 305.0), None);

        let unset_conventional = Configuration {
            latch: LatchType::Conventional,
            ..Configuration::default()
        };
        assert_eq!(end_cut_override(&unset_conventional, Category::Fly, 305.0), Some(305.0));
        assert_eq!(end_cut_override(&unset_conventional, Category::Base, 305.0), None);
    }

    #[test]
    fn test_missing_position_and_bad_formula_are_not_fatal() {
        let mut pos = position(3, "BP-FCL-8050-01", Category::Base);
        pos.x_formula = Some("Pitch * os.system".to_string());
        let catalog = InMemoryCatalog::builder()
            .position(pos)
            .hole(hole(3, 10.0, 0.0, 38.0, 1))
            .hole(hole(99, 0.0, 0.0, 0.0, 1))
            .build();
        let mut constants = WorkingConstants::default();
        let entries = vec![PartEntry::new("BP-FCL-8050-01", vec![99, 3])];

        let coords = CoordinateGenerator::new(&catalog)
            .generate(&entries, Category::Base, &Configuration::default(), &mut constants)
            .unwrap();
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0].x, 10.0);
    }

    #[test]
    fn test_invalid_face_code_skipped() {
        let catalog = InMemoryCatalog::builder()
            .position(position(4, "BP-FCL-8050-01", Category::Base))
            .hole(hole(4, 0.0, 0.0, 38.0, 9))
            .hole(hole(4, 5.0, 0.0, 38.0, 8))
            .build();
        let mut constants = WorkingConstants::default();

        let coords = CoordinateGenerator::new(&catalog)
            .generate(
                &[PartEntry::new("BP-FCL-8050-01", vec![4])],
                Category::Base,
                &Configuration::default(),
                &mut constants,
            )
            .unwrap();
        assert_eq!(coords.len(), 1);
        assert!(coords.iter().all(|c| usize::from(c.face) < FACE_COUNT));
    }
}
