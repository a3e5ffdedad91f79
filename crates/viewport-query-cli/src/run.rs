use crate::error::Result;
use crate::scene::{Scene, SceneOutput};
use crate::settings::Settings;
use std::io::Write;
use viewport_query_lib::ViewportFeatureQueryEngine;

/// Load the scene, run one query and write the JSON result to `out`
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let scene = Scene::load(&settings.scene)?;
    tracing::info!(
        "Loaded scene {}: {} tiles, {} viewports",
        settings.scene.display(),
        scene.tiles.len(),
        scene.viewports.len()
    );

    let (viewports, tiles) = scene.into_collaborators()?;
    let mut engine = ViewportFeatureQueryEngine::new(settings.config());
    engine.set_camera(viewports);
    engine.set_tile_layer(tiles);

    let result = engine.get_features(&settings.query_options())?;
    tracing::info!(
        "{} visible features, {} aggregated properties",
        result.features.len(),
        result.aggregations.len()
    );

    let output = SceneOutput::from_result(result, settings.aggregations_only)?;
    if settings.pretty {
        serde_json::to_writer_pretty(&mut *out, &output)?;
    } else {
        serde_json::to_writer(&mut *out, &output)?;
    }
    writeln!(out)?;
    Ok(())
}
