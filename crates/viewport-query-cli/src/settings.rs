use clap::Parser;
use std::path::PathBuf;
use viewport_query_lib::{AggregationSpec, Config, QueryOptions, TileSpace, utils};

/// Viewport Query - report the features visible in a camera's viewports
///
/// Reads a JSON scene of resident tiles and viewports, and writes the deduplicated visible
/// features plus any requested aggregations as JSON on stdout.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(author, version, about, long_about = None)]
pub struct Settings {
    /// Scene file with `viewports` and `tiles`
    #[clap(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Keep only these properties on reported features (comma-separated)
    #[clap(short, long, value_delimiter = ',', value_name = "KEY")]
    pub properties: Option<Vec<String>>,

    /// Aggregate a numeric property, e.g. `pop=count,avg,percentile_90` (repeatable)
    #[clap(short, long = "aggregate", value_name = "PROPERTY=OPS", value_parser = parse_aggregate)]
    pub aggregations: Vec<(String, Vec<String>)>,

    /// Property holding the stable feature identifier used for deduplication
    #[clap(short, long, default_value = viewport_query_lib::DEFAULT_UNIQUE_ID_PROPERTY)]
    pub unique_id_property: String,

    /// Width of the zoom-0 world in pixels
    #[clap(long, default_value_t = utils::WORLD_SIZE, value_parser = parse_positive)]
    pub world_size: f64,

    /// Span of tile-local coordinates (1 for normalized tiles, 4096 for raw MVT)
    #[clap(long, default_value_t = utils::NORMALIZED_TILE_EXTENT, value_parser = parse_positive)]
    pub tile_extent: f64,

    /// Only print aggregations, not features
    #[clap(long)]
    pub aggregations_only: bool,

    /// Pretty-print the JSON output
    #[clap(long)]
    pub pretty: bool,
}

impl Settings {
    pub fn from_cli() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            tile_space: TileSpace {
                world_size: self.world_size,
                tile_extent: self.tile_extent,
            },
            unique_id_property: self.unique_id_property.clone(),
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        let aggregations = (!self.aggregations.is_empty()).then(|| {
            let mut spec = AggregationSpec::new();
            for (property, ops) in &self.aggregations {
                spec.entry(property.clone())
                    .or_default()
                    .extend(ops.iter().cloned());
            }
            spec
        });

        QueryOptions {
            properties: self.properties.clone(),
            aggregations,
            unique_id_property: None,
        }
    }
}

/// Parse `PROPERTY=OP[,OP...]`; operator names are checked later by the aggregator
fn parse_aggregate(arg: &str) -> Result<(String, Vec<String>), String> {
    let (property, ops) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PROPERTY=OPS, got '{arg}'"))?;
    let property = property.trim();
    if property.is_empty() {
        return Err(format!("missing property name in '{arg}'"));
    }
    let ops: Vec<String> = ops
        .split(',')
        .map(str::trim)
        .filter(|op| !op.is_empty())
        .map(String::from)
        .collect();
    if ops.is_empty() {
        return Err(format!("no operators given for '{property}'"));
    }
    Ok((property.to_string(), ops))
}

fn parse_positive(arg: &str) -> Result<f64, String> {
    let value: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a positive number, got {value}"))
    }
}
