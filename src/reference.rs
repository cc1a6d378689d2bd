//! Static reference data: impact base values and region ore autofill.
//!
//! Both tables are read-only process-wide data. They are built by `builtin()`
//! constructors rather than baked into the call sites so tests can substitute
//! fixtures (e.g. a table with a category removed).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// =============================================================================
// Impact categories
// =============================================================================

/// The fifteen impact categories. The set is closed and identical across
/// runs; declaration order is the stable display order (the derived `Ord`
/// makes `BTreeMap` iteration follow it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactCategory {
    #[serde(rename = "Global Warming Potential")]
    GlobalWarmingPotential,
    #[serde(rename = "Energy Demand")]
    EnergyDemand,
    #[serde(rename = "Water Consumption")]
    WaterConsumption,
    #[serde(rename = "Particulate Matter")]
    ParticulateMatter,
    #[serde(rename = "Acidification")]
    Acidification,
    #[serde(rename = "Eutrophication")]
    Eutrophication,
    #[serde(rename = "Human Toxicity (Cancer)")]
    HumanToxicityCancer,
    #[serde(rename = "Ionizing Radiation")]
    IonizingRadiation,
    #[serde(rename = "Land Use")]
    LandUse,
    #[serde(rename = "Ozone Depletion")]
    OzoneDepletion,
    #[serde(rename = "Photochemical Ozone Creation")]
    PhotochemicalOzoneCreation,
    #[serde(rename = "Abiotic Depletion (Fossil)")]
    AbioticDepletionFossil,
    #[serde(rename = "Abiotic Depletion (Elements)")]
    AbioticDepletionElements,
    #[serde(rename = "Human Toxicity (Non-Cancer)")]
    HumanToxicityNonCancer,
    #[serde(rename = "Freshwater Ecotoxicity")]
    FreshwaterEcotoxicity,
}

impl ImpactCategory {
    pub const ALL: [ImpactCategory; 15] = [
        ImpactCategory::GlobalWarmingPotential,
        ImpactCategory::EnergyDemand,
        ImpactCategory::WaterConsumption,
        ImpactCategory::ParticulateMatter,
        ImpactCategory::Acidification,
        ImpactCategory::Eutrophication,
        ImpactCategory::HumanToxicityCancer,
        ImpactCategory::IonizingRadiation,
        ImpactCategory::LandUse,
        ImpactCategory::OzoneDepletion,
        ImpactCategory::PhotochemicalOzoneCreation,
        ImpactCategory::AbioticDepletionFossil,
        ImpactCategory::AbioticDepletionElements,
        ImpactCategory::HumanToxicityNonCancer,
        ImpactCategory::FreshwaterEcotoxicity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImpactCategory::GlobalWarmingPotential => "Global Warming Potential",
            ImpactCategory::EnergyDemand => "Energy Demand",
            ImpactCategory::WaterConsumption => "Water Consumption",
            ImpactCategory::ParticulateMatter => "Particulate Matter",
            ImpactCategory::Acidification => "Acidification",
            ImpactCategory::Eutrophication => "Eutrophication",
            ImpactCategory::HumanToxicityCancer => "Human Toxicity (Cancer)",
            ImpactCategory::IonizingRadiation => "Ionizing Radiation",
            ImpactCategory::LandUse => "Land Use",
            ImpactCategory::OzoneDepletion => "Ozone Depletion",
            ImpactCategory::PhotochemicalOzoneCreation => "Photochemical Ozone Creation",
            ImpactCategory::AbioticDepletionFossil => "Abiotic Depletion (Fossil)",
            ImpactCategory::AbioticDepletionElements => "Abiotic Depletion (Elements)",
            ImpactCategory::HumanToxicityNonCancer => "Human Toxicity (Non-Cancer)",
            ImpactCategory::FreshwaterEcotoxicity => "Freshwater Ecotoxicity",
        }
    }
}

/// Base value, absolute uncertainty and unit for one impact category.
///
/// `sd: None` means the sampler falls back to 10% of the mean; the table does
/// not pre-compute that so the fallback stays a sampler policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactSpec {
    pub mean: f64,
    pub sd: Option<f64>,
    pub unit: &'static str,
}

// =============================================================================
// Impact reference table
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReferenceTable {
    specs: BTreeMap<ImpactCategory, ImpactSpec>,
}

impl ReferenceTable {
    /// The canonical base values. GWP and Energy Demand match the published
    /// per-ton figures for primary steel; Ionizing Radiation carries an
    /// explicit sd because the 10%-of-mean fallback would degenerate at mean
    /// zero.
    pub fn builtin() -> Self {
        use ImpactCategory::*;
        let rows: [(ImpactCategory, f64, Option<f64>, &'static str); 15] = [
            (GlobalWarmingPotential, 2293.0, Some(150.0), "kg CO2-eq"),
            (EnergyDemand, 26454.0, Some(1500.0), "MJ"),
            (WaterConsumption, 150.0, Some(20.0), "m3"),
            (ParticulateMatter, 1.2, Some(0.15), "kg PM2.5-eq"),
            (Acidification, 12.5, Some(1.8), "kg SO2-eq"),
            (Eutrophication, 1.8, Some(0.3), "kg PO4-eq"),
            (HumanToxicityCancer, 0.00012, Some(0.00003), "CTUh"),
            (IonizingRadiation, 0.0, Some(0.5), "kBq U235-eq"),
            (LandUse, 45.0, Some(6.0), "m2a crop-eq"),
            (OzoneDepletion, 0.00018, Some(0.00004), "kg CFC-11-eq"),
            (PhotochemicalOzoneCreation, 8.4, Some(1.1), "kg NMVOC-eq"),
            (AbioticDepletionFossil, 24100.0, Some(2200.0), "MJ"),
            (AbioticDepletionElements, 0.0042, Some(0.0009), "kg Sb-eq"),
            (HumanToxicityNonCancer, 0.0009, Some(0.0002), "CTUh"),
            (FreshwaterEcotoxicity, 160.0, Some(25.0), "CTUe"),
        ];
        let specs = rows
            .into_iter()
            .map(|(cat, mean, sd, unit)| (cat, ImpactSpec { mean, sd, unit }))
            .collect();
        Self { specs }
    }

    pub fn spec_for(&self, category: ImpactCategory) -> Result<ImpactSpec, SimError> {
        self.specs
            .get(&category)
            .copied()
            .ok_or_else(|| SimError::UnknownCategory(category.name().to_string()))
    }

    /// Categories present in this table, in display order.
    pub fn all_categories(&self) -> Vec<ImpactCategory> {
        self.specs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// A copy of this table with one category removed. Fixture seam for
    /// failure-containment tests.
    pub fn without(&self, category: ImpactCategory) -> Self {
        let mut specs = self.specs.clone();
        specs.remove(&category);
        Self { specs }
    }
}

// =============================================================================
// Region ore autofill
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OreProfile {
    pub concentration: f64,
    pub ore_type: &'static str,
}

/// Region name to (ore concentration %, ore type). Mining-region presets for
/// the study form; anything not listed falls back to the defaults.
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: Vec<(&'static str, OreProfile)>,
}

impl RegionTable {
    pub const DEFAULT_CONCENTRATION: f64 = 50.0;
    pub const DEFAULT_ORE_TYPE: &'static str = "Bauxite";

    pub fn builtin() -> Self {
        let profile = |concentration: f64, ore_type: &'static str| OreProfile {
            concentration,
            ore_type,
        };
        Self {
            entries: vec![
                ("Odisha", profile(55.0, "Hematite")),
                ("Jharkhand", profile(58.0, "Hematite")),
                ("Chhattisgarh", profile(52.0, "Hematite")),
                ("Karnataka", profile(38.0, "Magnetite")),
                ("Goa", profile(45.0, "Limonite")),
                ("Pilbara", profile(62.0, "Hematite")),
                ("Queensland", profile(48.0, "Bauxite")),
                ("Guinea", profile(50.0, "Bauxite")),
                ("Minas Gerais", profile(60.0, "Hematite")),
                ("Atacama", profile(1.1, "Chalcopyrite")),
            ],
        }
    }

    /// Case-insensitive lookup; `None` means the caller should apply the
    /// defaults.
    pub fn lookup(&self, region: &str) -> Option<OreProfile> {
        let wanted = region.trim();
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, p)| *p)
    }

    /// Autofill result for a region, defaults applied.
    pub fn ore_for(&self, region: &str) -> OreProfile {
        self.lookup(region).unwrap_or(OreProfile {
            concentration: Self::DEFAULT_CONCENTRATION,
            ore_type: Self::DEFAULT_ORE_TYPE,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_fifteen_categories() {
        let table = ReferenceTable::builtin();
        assert_eq!(table.len(), 15);
        assert_eq!(table.all_categories(), ImpactCategory::ALL.to_vec());
        for cat in ImpactCategory::ALL {
            let spec = table.spec_for(cat).unwrap();
            assert!(spec.mean.is_finite());
            assert!(!spec.unit.is_empty());
        }
    }

    #[test]
    fn test_category_order_is_display_order() {
        // GWP must sort first so keyed maps iterate in display order.
        let mut cats = ImpactCategory::ALL.to_vec();
        cats.sort();
        assert_eq!(cats, ImpactCategory::ALL.to_vec());
        assert_eq!(cats[0], ImpactCategory::GlobalWarmingPotential);
    }

    #[test]
    fn test_category_serializes_to_display_name() {
        let json = serde_json::to_string(&ImpactCategory::HumanToxicityCancer).unwrap();
        assert_eq!(json, "\"Human Toxicity (Cancer)\"");
    }

    #[test]
    fn test_without_removes_only_the_named_category() {
        let table = ReferenceTable::builtin();
        let cut = table.without(ImpactCategory::LandUse);
        assert_eq!(cut.len(), 14);
        assert!(matches!(
            cut.spec_for(ImpactCategory::LandUse),
            Err(SimError::UnknownCategory(_))
        ));
        // The original is untouched.
        assert!(table.spec_for(ImpactCategory::LandUse).is_ok());
    }

    #[test]
    fn test_zero_mean_category_has_explicit_sd() {
        let spec = ReferenceTable::builtin()
            .spec_for(ImpactCategory::IonizingRadiation)
            .unwrap();
        assert_eq!(spec.mean, 0.0);
        assert!(spec.sd.unwrap() > 0.0);
    }

    #[test]
    fn test_region_lookup_known_and_unknown() {
        let regions = RegionTable::builtin();
        let odisha = regions.ore_for("Odisha");
        assert_eq!(odisha.concentration, 55.0);
        assert_eq!(odisha.ore_type, "Hematite");

        let atlantis = regions.ore_for("Atlantis");
        assert_eq!(atlantis.concentration, 50.0);
        assert_eq!(atlantis.ore_type, "Bauxite");
    }

    #[test]
    fn test_region_lookup_ignores_case_and_whitespace() {
        let regions = RegionTable::builtin();
        assert_eq!(regions.ore_for("  odisha ").ore_type, "Hematite");
        assert_eq!(regions.ore_for("PILBARA").concentration, 62.0);
    }
}
