//! Shapefile → GeoJSON conversion graph.
//!
//! One independent `ogr2ogr` stage per layer. Layers whose source shapefile
//! is absent are left out of the graph and reported instead of failing.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::dem::GEOGRAPHIC_CRS;
use super::StageSpec;
use crate::toolchain::ToolInvocation;

/// One vector layer to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorLayer {
    /// Stage name.
    pub name: String,
    /// Source shapefile.
    pub source: PathBuf,
    /// Target GeoJSON file.
    pub target: PathBuf,
    /// Optional OGR SQL attribute filter.
    pub filter: Option<String>,
}

impl VectorLayer {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            filter: None,
        }
    }

    /// Keep only features matching `filter`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn invocation(&self) -> ToolInvocation {
        let mut invocation = ToolInvocation::new("ogr2ogr")
            .option("-f", "GeoJSON")
            .option("-t_srs", GEOGRAPHIC_CRS);
        if let Some(filter) = &self.filter {
            invocation = invocation.option("-where", filter);
        }
        invocation.output().input(&self.source)
    }
}

/// Conversion stages plus the layers left out for lack of a source.
#[derive(Debug, Clone, Default)]
pub struct VectorGraph {
    pub stages: Vec<StageSpec>,
    /// Names of layers whose source shapefile does not exist.
    pub missing: Vec<String>,
}

/// Shapefile path inside an extracted Natural Earth archive.
fn natural_earth_shapefile(boundaries_dir: &Path, key: &str) -> PathBuf {
    boundaries_dir.join(key).join(format!("{}.shp", key))
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(",")
}

/// Base map layers built from the Natural Earth archives.
pub fn default_vector_layers(boundaries_dir: &Path, geojson_dir: &Path) -> Vec<VectorLayer> {
    let countries = natural_earth_shapefile(boundaries_dir, "ne_10m_admin_0_countries");
    let provinces = natural_earth_shapefile(boundaries_dir, "ne_10m_admin_1_states_provinces");
    let places = natural_earth_shapefile(boundaries_dir, "ne_10m_populated_places");
    let rivers = natural_earth_shapefile(boundaries_dir, "ne_10m_rivers_lake_centerlines");

    let campaign_countries = [
        "Russia", "Poland", "Lithuania", "Belarus", "Ukraine", "Latvia", "Estonia", "Germany",
        "Austria", "France",
    ];
    let campaign_cities = [
        "Moscow",
        "Vilnius",
        "Minsk",
        "Smolensk",
        "Warsaw",
        "Kaunas",
        "Vitebsk",
        "Borodino",
        "Maloyaroslavets",
    ];

    vec![
        VectorLayer::new("countries", &countries, geojson_dir.join("countries.geojson")),
        VectorLayer::new("provinces", &provinces, geojson_dir.join("provinces.geojson")),
        VectorLayer::new("cities", &places, geojson_dir.join("cities.geojson")),
        VectorLayer::new("rivers", &rivers, geojson_dir.join("rivers.geojson")),
        VectorLayer::new(
            "countries_eastern_europe",
            &countries,
            geojson_dir.join("countries_eastern_europe.geojson"),
        )
        .with_filter(format!("NAME IN ({})", quoted_list(&campaign_countries))),
        VectorLayer::new("cities_major", &places, geojson_dir.join("cities_major.geojson"))
            .with_filter("POP_MAX > 1000000"),
        VectorLayer::new(
            "cities_1812_campaign",
            &places,
            geojson_dir.join("cities_1812_campaign.geojson"),
        )
        .with_filter(format!("NAME IN ({})", quoted_list(&campaign_cities))),
    ]
}

/// Build one optional conversion stage per layer with an existing source.
pub fn build_vector_graph(layers: &[VectorLayer]) -> VectorGraph {
    let mut graph = VectorGraph::default();

    for layer in layers {
        if !layer.source.is_file() {
            warn!(layer = %layer.name, source = %layer.source.display(), "Source shapefile not found");
            graph.missing.push(layer.name.clone());
            continue;
        }

        graph.stages.push(
            StageSpec::new(layer.name.clone(), layer.invocation(), &layer.target)
                .with_inputs([layer.source.clone()]),
        );
    }

    graph
}
