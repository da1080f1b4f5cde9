use crate::core::classifier::{is_section_end, PartClassifier};
use crate::core::configuration::{Configuration, ConfigurationResolver};
use crate::core::constants::{ExpectedGeometry, WorkingConstants};
use crate::core::coordinates::CoordinateGenerator;
use crate::core::filters::{self, ReachLimits};
use crate::core::geometry;
use crate::core::section::SectionResolver;
use crate::core::serializer;
use crate::domain::model::{Category, Recipe, RecipeSet};
use crate::domain::ports::ReferenceCatalog;
use crate::utils::error::Result;

/// 配方產生引擎：一次執行依序處理 Base 與 Fly，常數與設定只屬於該次執行
pub struct RecipeEngine<C: ReferenceCatalog> {
    catalog: C,
    limits: ReachLimits,
}

impl<C: ReferenceCatalog> RecipeEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            limits: ReachLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ReachLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn generate(&self, raw_text: &str, product_display_name: &str, requested: Category) -> Result<RecipeSet> {
        let mut parts = PartClassifier::new(&self.catalog).classify(raw_text)?;
        let mut constants = WorkingConstants::default();
        let mut config = Configuration::default();
        let resolver = ConfigurationResolver::new();
        let mut recipes = Vec::with_capacity(Category::PROCESSING_ORDER.len());

        for category in Category::PROCESSING_ORDER {
            tracing::info!("Processing section {}", category);
            constants.begin_section(category);

            resolver.detect(&mut config, parts.get(category), category);
            let section = SectionResolver::new(&self.catalog).resolve(
                parts.get(category),
                category,
                &config,
                &mut constants,
            )?;
            resolver.apply_part_edits(
                &mut config,
                &mut parts,
                category,
                &section.item,
                product_display_name,
            );
            parts.get_mut(category).retain(|e| !is_section_end(&e.part_id));

            let entries = parts.get(category);
            let mut coords =
                CoordinateGenerator::new(&self.catalog).generate(entries, category, &config, &mut constants)?;

            filters::sort_by_face_and_x(&mut coords);
            geometry::validate_and_correct(&mut coords, &ExpectedGeometry::for_category(category, &constants));
            if filters::has_terrain_master(entries) {
                filters::apply_terrain_master_offset(&mut coords, constants.pitch);
            }
            filters::remove_unreachable(&mut coords, constants.pitch, &self.limits);
            filters::remove_duplicates(&mut coords);

            let header = serializer::build_header(&section.item, category, &constants);
            let text = serializer::serialize(&header, &coords);
            tracing::info!(
                "Recipe {} ready: {} holes, stile length {}, docking {}",
                category,
                coords.len(),
                header.stile_length,
                header.docking
            );

            recipes.push(Recipe {
                header,
                coordinates: coords,
                text,
            });
        }

        Ok(RecipeSet {
            recipes,
            requested,
            requested_needs_docking: constants.end_cut(requested) != constants.pitch,
        })
    }
}
