use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use winit::dpi::LogicalSize;

use crate::audio::playback::AudioPlaybackManager;
use crate::explorer::builder::TreeBuilder;
use crate::explorer::model::{FileTreeModel, ModelError, TreeIter, TreeModel};
use crate::explorer::tree::NodeTree;
use crate::io::common::loader::RawAssetLoader;
use crate::io::mpq::loader::MPQPackageGroup;
use crate::loading::LoadPipeline;
use crate::rendering::application::ExplorerApplication;
use crate::rendering::loader::texture_cache::TextureCache;
use crate::settings::{CliArgs, OperationMode};

mod audio;
mod explorer;
mod io;
mod loading;
mod rendering;
mod settings;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let package_group = Arc::new(MPQPackageGroup::new(&args.data_dir, &args.locale)?);
    let installation_name = installation_name(&args.data_dir);
    let tree = Arc::new(TreeBuilder::from_package_group(&installation_name, &package_group));
    log::info!("Indexed {} tree entries below {}", tree.len(), args.data_dir);

    match &args.operation_mode {
        OperationMode::List { filter } => list_tree(&tree, filter.as_deref()),
        OperationMode::View { file } => run_viewer(&args, package_group, tree, file.clone()),
    }
}

fn installation_name(data_dir: &str) -> String {
    Path::new(data_dir)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| data_dir.to_string())
}

/// Walks the tree through the data-provider contract, the same way a tree
/// view would, and prints it indented.
fn list_tree(tree: &Arc<NodeTree>, filter: Option<&str>) -> Result<(), anyhow::Error> {
    let model = FileTreeModel::new(tree.clone());

    let mut row = model.iter_children(None)?;
    while let Some(iter) = row {
        print_subtree(&model, &iter, 0, filter)?;
        row = model.iter_next(&iter)?;
    }
    Ok(())
}

fn print_subtree(
    model: &FileTreeModel,
    iter: &TreeIter,
    depth: usize,
    filter: Option<&str>,
) -> Result<(), ModelError> {
    let node = model.value(Some(iter))?;

    // the filter applies below the package boundary, packages always print
    if let (Some(prefix), false) = (filter, node.is_package_boundary()) {
        let path = model.tree().node_file_path(node)?;
        let prefix_lower = prefix.to_ascii_lowercase();
        let path_lower = path.to_ascii_lowercase();
        // keep ancestors of matches and everything below a match
        if !path_lower.starts_with(&prefix_lower) && !prefix_lower.starts_with(&path_lower) {
            return Ok(());
        }
    }

    println!("{}{}", "  ".repeat(depth), node.name);

    let mut child = model.iter_children(Some(iter))?;
    while let Some(child_iter) = child {
        print_subtree(model, &child_iter, depth + 1, filter)?;
        child = model.iter_next(&child_iter)?;
    }
    Ok(())
}

fn run_viewer(
    args: &CliArgs,
    package_group: Arc<MPQPackageGroup>,
    tree: Arc<NodeTree>,
    initial_file: Option<String>,
) -> Result<(), anyhow::Error> {
    let loader: Arc<dyn RawAssetLoader + Send + Sync> = package_group;
    let textures = Arc::new(TextureCache::new(loader.clone()));
    let (pipeline, outcomes) = LoadPipeline::new(textures)?;

    let audio = match AudioPlaybackManager::new(args.audio_gain) {
        Ok(audio) => Some(audio),
        Err(err) => {
            log::warn!("Audio subsystem unavailable: {}", err);
            None
        }
    };

    let app = ExplorerApplication::new(
        pipeline,
        outcomes,
        audio,
        tree,
        loader,
        args.game_version,
        initial_file,
    );

    let wnd = winit::window::WindowBuilder::new()
        .with_title("Everrust: Archive Explorer")
        .with_inner_size(LogicalSize::new(1024, 768));
    rend3_framework::start(app, wnd);

    Ok(())
}
