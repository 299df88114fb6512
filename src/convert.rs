use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use indicatif::{MultiProgress, ParallelProgressIterator, ProgressBar};
use log::{debug, info, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    builder::{OutputBundle, SnapshotBuilder},
    config::Config,
    error::Result,
    render::{plot_extent, render},
    write::{Endianess, Metadata, SnapshotMetadata, write_metadata, write_tiff},
};

pub const POSTPROCESS_DIR: &str = "postprocess";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone)]
pub struct PostprocessOptions {
    /// Directory holding one `.npz` snapshot per timestep.
    pub run_dir: PathBuf,
    pub config: Config,
    pub endianess: Endianess,
    /// Log and skip snapshots that fail instead of aborting the batch.
    pub skip_failed: bool,
}

/// Snapshot files in `run_dir`, sorted by name.
pub fn find_snapshots(run_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut snapshots = Vec::new();
    for entry in std::fs::read_dir(run_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "npz") {
            snapshots.push(path);
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

fn snapshot_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build every snapshot in the run, export the configured plots and write
/// `metadata.json` next to them.
///
/// Unless `skip_failed` is set, the first failing snapshot stops the batch:
/// no further snapshots are scheduled and no `metadata.json` is written.
pub fn postprocess(options: &PostprocessOptions, multi_progress: &MultiProgress) -> Result<Metadata> {
    let t0 = Instant::now();

    let postprocess_dir = options.run_dir.join(POSTPROCESS_DIR);
    std::fs::create_dir_all(&postprocess_dir)?;

    let snapshots = find_snapshots(&options.run_dir)?;
    info!("{} snapshots in {:?}", snapshots.len(), options.run_dir);

    let builder = SnapshotBuilder::default();
    let progress = multi_progress.add(ProgressBar::new(snapshots.len() as u64));

    let process = |path: PathBuf| {
        let id = snapshot_id(&path);
        let result = builder
            .build(&path, &options.config)
            .and_then(|bundle| export_snapshot(&bundle, &builder, &postprocess_dir.join(&id), options));
        (id, result)
    };

    let res: Result<Vec<(String, SnapshotMetadata)>> = if options.skip_failed {
        let results: Vec<_> = snapshots
            .into_par_iter()
            .progress_with(progress.clone())
            .map(process)
            .collect();
        Ok(results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(snapshot) => Some((id, snapshot)),
                Err(e) => {
                    warn!("skipping snapshot {id}: {e}");
                    None
                }
            })
            .collect())
    } else {
        snapshots
            .into_par_iter()
            .progress_with(progress.clone())
            .map(|path| {
                let (id, result) = process(path);
                result.map(|snapshot| (id, snapshot))
            })
            .collect()
    };

    progress.finish();
    multi_progress.remove(&progress);

    let metadata = Metadata {
        postprocess_dir: postprocess_dir.clone(),
        snapshots: res?.into_iter().collect(),
    };
    write_metadata(&postprocess_dir.join(METADATA_FILE), &metadata)?;

    info!(
        "post-processed {} snapshots in {:?}",
        metadata.snapshots.len(),
        t0.elapsed()
    );

    Ok(metadata)
}

fn export_snapshot(
    bundle: &OutputBundle,
    builder: &SnapshotBuilder,
    dest_dir: &Path,
    options: &PostprocessOptions,
) -> Result<SnapshotMetadata> {
    let mut snapshot = SnapshotMetadata {
        header: bundle.header().cloned(),
        ..SnapshotMetadata::default()
    };
    let unit = &bundle.config.volume_slices.unit;

    for plot in &options.config.plots {
        let Some(slices) = bundle.slices(&plot.field) else {
            debug!("{} not built, no plots", plot.field);
            continue;
        };
        std::fs::create_dir_all(dest_dir)?;

        for (key, slab) in slices {
            let extent = plot_extent(&bundle.extent, key.axis(), builder.grid_scale(), unit);
            let image = render(slab.view(), &plot.field, plot.abs, plot.scaler, extent);
            let name = format!("{}_{key}", plot.field);
            let out_path = dest_dir.join(format!("{name}.tif"));
            write_tiff(&out_path, &image, options.endianess)?;
            debug!("created {out_path:?}");
            snapshot.files.insert(name, image.metadata);
        }
    }

    Ok(snapshot)
}
