//! Study descriptor: raw form input, closed-set enums, normalisation.
//!
//! Every raw field is optional; `normalise` fills defaults, trims, clamps and
//! autofills so the rest of the pipeline only ever sees concrete values.
//! Invalid inputs are silently defaulted rather than rejected: the form is
//! interactive and a half-filled study must still simulate.

use serde::{Deserialize, Serialize};

use crate::reference::RegionTable;

// =============================================================================
// Closed sets
// =============================================================================

fn parse_closed<T: Copy>(options: &[(T, &str)], s: &str) -> T {
    let wanted = s.trim();
    options
        .iter()
        .find(|(_, label)| label.eq_ignore_ascii_case(wanted))
        .map(|(v, _)| *v)
        // Out-of-set values fall back to the first option.
        .unwrap_or(options[0].0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemBoundary {
    #[serde(rename = "Cradle-to-Gate")]
    CradleToGate,
    #[serde(rename = "Cradle-to-Grave")]
    CradleToGrave,
    #[serde(rename = "Gate-to-Gate")]
    GateToGate,
    #[serde(rename = "Cradle-to-Cradle")]
    CradleToCradle,
}

impl SystemBoundary {
    const LABELS: [(SystemBoundary, &'static str); 4] = [
        (SystemBoundary::CradleToGate, "Cradle-to-Gate"),
        (SystemBoundary::CradleToGrave, "Cradle-to-Grave"),
        (SystemBoundary::GateToGate, "Gate-to-Gate"),
        (SystemBoundary::CradleToCradle, "Cradle-to-Cradle"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemBoundary::CradleToGate => "Cradle-to-Gate",
            SystemBoundary::CradleToGrave => "Cradle-to-Grave",
            SystemBoundary::GateToGate => "Gate-to-Gate",
            SystemBoundary::CradleToCradle => "Cradle-to-Cradle",
        }
    }

    pub fn parse(s: &str) -> Self {
        parse_closed(&Self::LABELS, s)
    }
}

impl Default for SystemBoundary {
    fn default() -> Self {
        SystemBoundary::CradleToGate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectCategory {
    Construction,
    Automotive,
    Aerospace,
    Packaging,
    Other,
}

impl ProjectCategory {
    const LABELS: [(ProjectCategory, &'static str); 5] = [
        (ProjectCategory::Construction, "Construction"),
        (ProjectCategory::Automotive, "Automotive"),
        (ProjectCategory::Aerospace, "Aerospace"),
        (ProjectCategory::Packaging, "Packaging"),
        (ProjectCategory::Other, "Other"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Construction => "Construction",
            ProjectCategory::Automotive => "Automotive",
            ProjectCategory::Aerospace => "Aerospace",
            ProjectCategory::Packaging => "Packaging",
            ProjectCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        parse_closed(&Self::LABELS, s)
    }
}

impl Default for ProjectCategory {
    fn default() -> Self {
        ProjectCategory::Construction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    Steel,
    Aluminum,
    Copper,
    Nickel,
    Titanium,
}

impl Material {
    const LABELS: [(Material, &'static str); 5] = [
        (Material::Steel, "Steel"),
        (Material::Aluminum, "Aluminum"),
        (Material::Copper, "Copper"),
        (Material::Nickel, "Nickel"),
        (Material::Titanium, "Titanium"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Steel => "Steel",
            Material::Aluminum => "Aluminum",
            Material::Copper => "Copper",
            Material::Nickel => "Nickel",
            Material::Titanium => "Titanium",
        }
    }

    pub fn parse(s: &str) -> Self {
        parse_closed(&Self::LABELS, s)
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Steel
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionProcess {
    #[serde(rename = "Primary Route")]
    PrimaryRoute,
    #[serde(rename = "Secondary Route")]
    SecondaryRoute,
    Smelting,
    Casting,
}

impl ProductionProcess {
    const LABELS: [(ProductionProcess, &'static str); 4] = [
        (ProductionProcess::PrimaryRoute, "Primary Route"),
        (ProductionProcess::SecondaryRoute, "Secondary Route"),
        (ProductionProcess::Smelting, "Smelting"),
        (ProductionProcess::Casting, "Casting"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionProcess::PrimaryRoute => "Primary Route",
            ProductionProcess::SecondaryRoute => "Secondary Route",
            ProductionProcess::Smelting => "Smelting",
            ProductionProcess::Casting => "Casting",
        }
    }

    /// Accepts both the canonical labels and the short study-form ones
    /// ("Primary"/"Secondary").
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            t if t.eq_ignore_ascii_case("Primary") => ProductionProcess::PrimaryRoute,
            t if t.eq_ignore_ascii_case("Secondary") => ProductionProcess::SecondaryRoute,
            t => parse_closed(&Self::LABELS, t),
        }
    }
}

impl Default for ProductionProcess {
    fn default() -> Self {
        ProductionProcess::PrimaryRoute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndOfLife {
    #[serde(rename = "90% Recycled")]
    Recycled90,
    #[serde(rename = "50% Recycled")]
    Recycled50,
    Landfill,
}

impl EndOfLife {
    const LABELS: [(EndOfLife, &'static str); 3] = [
        (EndOfLife::Recycled90, "90% Recycled"),
        (EndOfLife::Recycled50, "50% Recycled"),
        (EndOfLife::Landfill, "Landfill"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndOfLife::Recycled90 => "90% Recycled",
            EndOfLife::Recycled50 => "50% Recycled",
            EndOfLife::Landfill => "Landfill",
        }
    }

    pub fn parse(s: &str) -> Self {
        parse_closed(&Self::LABELS, s)
    }
}

impl Default for EndOfLife {
    fn default() -> Self {
        EndOfLife::Recycled90
    }
}

// =============================================================================
// Raw input
// =============================================================================

/// The untrusted study mapping from the presentation layer. Every field is
/// optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyInput {
    // Goal & scope
    pub intended_application: Option<String>,
    pub intended_audience: Option<String>,
    pub system_boundary: Option<String>,
    pub limitations: Option<String>,
    pub comparative_assertion: Option<bool>,

    // Project identity
    pub project_name: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    pub region: Option<String>,

    // Ore
    pub ore_concentration: Option<f64>,
    pub ore_type: Option<String>,

    // Lifecycle
    pub functional_unit: Option<String>,
    pub secondary_material_content: Option<f64>,
    pub production_process: Option<String>,
    pub end_of_life: Option<String>,

    // Data-quality scores (1-5)
    pub reliability: Option<i64>,
    pub completeness: Option<i64>,
    pub temporal: Option<i64>,
    pub geographical: Option<i64>,
    pub technological: Option<i64>,

    // Run controls
    pub num_runs: Option<usize>,
    pub seed: Option<u64>,
}

// =============================================================================
// Normalised descriptor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalScope {
    pub intended_application: String,
    pub intended_audience: String,
    pub system_boundary: SystemBoundary,
    pub limitations: String,
    pub comparative_assertion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataQuality {
    pub reliability: u8,
    pub completeness: u8,
    pub temporal: u8,
    pub geographical: u8,
    pub technological: u8,
}

/// A fully defaulted, clamped study. Exists only for the duration of one
/// simulation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyDescriptor {
    pub goal_scope: GoalScope,
    pub project_name: String,
    pub category: ProjectCategory,
    pub material: Material,
    pub region: String,
    pub ore_concentration: f64,
    pub ore_type: String,
    pub functional_unit: String,
    pub secondary_material_content: f64,
    pub production_process: ProductionProcess,
    pub end_of_life: EndOfLife,
    pub data_quality: DataQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_runs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn text_or(raw: &Option<String>, default: &str) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

fn clamp_pct(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn clamp_quality(v: Option<i64>) -> u8 {
    v.unwrap_or(3).clamp(1, 5) as u8
}

/// Normalise a raw study: trim text, clamp ranges, fall back to the first
/// option for out-of-set enums, autofill ore data from the region. Region
/// autofill applies only when the raw input carries no explicit ore
/// concentration. Never fails.
pub fn normalise(raw: &StudyInput, regions: &RegionTable) -> StudyDescriptor {
    let region = text_or(&raw.region, "");

    let (ore_concentration, ore_type) = match raw.ore_concentration {
        Some(conc) => {
            // Explicit concentration wins; the ore type still autofills when
            // the form left it blank.
            let ore_type = text_or(&raw.ore_type, regions.ore_for(&region).ore_type);
            (clamp_pct(conc), ore_type)
        }
        None => {
            let profile = regions.ore_for(&region);
            let ore_type = text_or(&raw.ore_type, profile.ore_type);
            (profile.concentration, ore_type)
        }
    };

    StudyDescriptor {
        goal_scope: GoalScope {
            intended_application: text_or(&raw.intended_application, ""),
            intended_audience: text_or(&raw.intended_audience, ""),
            system_boundary: raw
                .system_boundary
                .as_deref()
                .map(SystemBoundary::parse)
                .unwrap_or_default(),
            limitations: text_or(&raw.limitations, ""),
            comparative_assertion: raw.comparative_assertion.unwrap_or(false),
        },
        project_name: text_or(&raw.project_name, "Untitled Study"),
        category: raw
            .category
            .as_deref()
            .map(ProjectCategory::parse)
            .unwrap_or_default(),
        material: raw
            .material
            .as_deref()
            .map(Material::parse)
            .unwrap_or_default(),
        region,
        ore_concentration,
        ore_type,
        functional_unit: text_or(&raw.functional_unit, "1 ton of metal product"),
        secondary_material_content: clamp_pct(raw.secondary_material_content.unwrap_or(10.0)),
        production_process: raw
            .production_process
            .as_deref()
            .map(ProductionProcess::parse)
            .unwrap_or_default(),
        end_of_life: raw
            .end_of_life
            .as_deref()
            .map(EndOfLife::parse)
            .unwrap_or_default(),
        data_quality: DataQuality {
            reliability: clamp_quality(raw.reliability),
            completeness: clamp_quality(raw.completeness),
            temporal: clamp_quality(raw.temporal),
            geographical: clamp_quality(raw.geographical),
            technological: clamp_quality(raw.technological),
        },
        num_runs: raw.num_runs,
        seed: raw.seed,
    }
}

// =============================================================================
// Tests
// =============================================================================
