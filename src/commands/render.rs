use crate::annotation::{parse_user_annotations, scale_combinations, AnnotationState, LabelMap};
use crate::cli::RenderArgs;
use crate::commands::{apply_prune_steps, load_state, load_tree};
use crate::config::Config;
use crate::export::{
    write_cluster_tree, write_node_csv, write_tree_json, ColorScaleExport, ColorScaleVariant, ScaleExport,
    StateExport,
};
use crate::features::{FeatureSource, HttpFeatureSource, JsonFileFeatureSource};
use crate::history::PruneSession;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const NODES_CSV: &str = "nodes.csv";
pub const NODES_JSON: &str = "nodes.json";
pub const CLUSTER_TREE_JSON: &str = "cluster_tree.json";
pub const LAYOUT_JSON: &str = "layout.json";
pub const STATE_JSON: &str = "state.json";

pub fn run(args: RenderArgs) -> Result<()> {
    let config = Config::load();
    let written = render(&args, &config)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Build, prune, annotate and lay out the tree, then write every export into
/// `args.out_dir`. Returns the files written.
pub fn render(args: &RenderArgs, config: &Config) -> Result<Vec<PathBuf>> {
    let base = load_tree(&args.tree)?;
    let saved = args.state.as_deref().map(load_state).transpose()?;

    let history = saved.as_ref().map(StateExport::to_history).unwrap_or_default();
    let mut session = PruneSession::with_history(base, history);
    apply_prune_steps(&mut session, &args.prune)?;

    let annotations = load_annotations(args, config, saved.as_ref())?;
    let width = args
        .width
        .or_else(|| saved.as_ref().and_then(|s| s.width))
        .unwrap_or(config.width);

    let rendered = session.render(width, &annotations);
    let metadata = session.metadata();
    info!(
        "Rendering {} of {} nodes ({} leaves) at width {}",
        metadata.node_count,
        session.base().node_count(),
        metadata.leaf_count,
        width
    );

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {}", args.out_dir.display()))?;
    let out = |name: &str| args.out_dir.join(name);

    write_with(&out(NODES_CSV), |w| Ok(write_node_csv(&rendered.tree, w)?))?;
    write_with(&out(NODES_JSON), |w| Ok(write_tree_json(&rendered.tree, w)?))?;
    write_with(&out(CLUSTER_TREE_JSON), |w| Ok(write_cluster_tree(session.visible(), session.base(), w)?))?;
    write_json(&out(LAYOUT_JSON), &rendered.layout)?;

    let scales = scales_for(saved.as_ref().map(|s| &s.scales), config, &annotations);
    let mut state = StateExport::capture(session.history(), annotations.active_features.clone(), scales, width);
    if let Some(saved) = &saved {
        state.optional_display_elements = saved.optional_display_elements.clone();
        state.font_size = saved.font_size;
    }
    write_json(&out(STATE_JSON), &state)?;

    let written: Vec<PathBuf> = [NODES_CSV, NODES_JSON, CLUSTER_TREE_JSON, LAYOUT_JSON, STATE_JSON]
        .iter()
        .map(|name| out(*name))
        .collect();
    info!("Wrote {} files to {}", written.len(), args.out_dir.display());
    Ok(written)
}

fn load_annotations(args: &RenderArgs, config: &Config, saved: Option<&StateExport>) -> Result<AnnotationState> {
    let mut annotations = AnnotationState::default();

    if let Some(path) = &args.labels {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels {}", path.display()))?;
        annotations.labels = LabelMap::parse(&text)?;
    }

    if let Some(path) = &args.node_values {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read node values {}", path.display()))?;
        annotations.user_annotations = parse_user_annotations(&text)?;
        info!("Loaded values for {} nodes", annotations.user_annotations.len());
    }

    let mut active: Vec<String> = saved.map(|s| s.features.clone()).unwrap_or_default();
    for feature in &args.active_features {
        if !active.contains(feature) {
            active.push(feature.clone());
        }
    }

    if !active.is_empty() {
        let source: Option<Box<dyn FeatureSource>> = match (&args.features, &config.feature_api_url) {
            (Some(path), _) => Some(Box::new(JsonFileFeatureSource::new(path)) as Box<dyn FeatureSource>),
            (None, Some(url)) => Some(
                Box::new(HttpFeatureSource::new(url.as_str(), config.download_timeout)?) as Box<dyn FeatureSource>,
            ),
            (None, None) => {
                warn!("No feature file or feature API configured; features will read as 0");
                None
            }
        };
        if let Some(source) = source {
            info!("Fetching {} features from {}", active.len(), source.describe());
            annotations.features.extend(source.fetch(&active)?);
        }
    }

    annotations.thresholds = saved.map(StateExport::thresholds).unwrap_or_default();
    annotations.active_features = active;
    Ok(annotations)
}

/// Saved scale settings, with unset ranges taken from config and the color
/// domain recomputed for the current labels or features.
fn scales_for(saved: Option<&ScaleExport>, config: &Config, annotations: &AnnotationState) -> ScaleExport {
    let mut scales = saved.cloned().unwrap_or_default();
    scales.branch_size_scale_range.get_or_insert(config.branch_size_scale_range);
    scales.pie_scale_range.get_or_insert(config.pie_scale_range);

    let mut color = scales.color_scale.take().unwrap_or(ColorScaleExport {
        variant: ColorScaleVariant::LabelCount,
        label_domain: Vec::new(),
        label_range: Vec::new(),
        feature_hi_lo_domain: Vec::new(),
        feature_hi_lo_range: Vec::new(),
        feature_hi_lo_thresholds: Default::default(),
        feature_gradient_color: None,
    });
    color.label_domain = annotations.labels.ordinal_domain();
    if annotations.active_features.is_empty() {
        color.variant = ColorScaleVariant::LabelCount;
    } else {
        if color.variant == ColorScaleVariant::LabelCount {
            color.variant = ColorScaleVariant::FeatureHiLos;
        }
        color.feature_hi_lo_domain = scale_combinations(&annotations.active_features);
        color.feature_hi_lo_thresholds = annotations.effective_thresholds();
    }
    scales.color_scale = Some(color);
    scales
}

fn write_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_with(path, |w| {
        serde_json::to_writer_pretty(&mut *w, value)?;
        writeln!(w)?;
        Ok(())
    })
}
