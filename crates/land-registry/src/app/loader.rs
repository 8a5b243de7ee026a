//! Async file loading.
//!
//! Files are read concurrently on the tokio runtime; GPX parsing then runs
//! on the rayon pool through `parse_track_batch`.

use land_track_lib::{
    Attachment, AttachmentField, DataError, LandRecord, TrackSequence, parse_track_batch,
};
use std::path::{Path, PathBuf};

/// Outcome of loading one GPX file
#[derive(Debug)]
pub struct LoadedTrack {
    pub path: PathBuf,
    pub result: Result<TrackSequence, DataError>,
}

async fn read_all(paths: &[PathBuf]) -> Vec<std::io::Result<Vec<u8>>> {
    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| tokio::spawn(async move { tokio::fs::read(path).await }))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(read) => read,
            Err(e) => Err(std::io::Error::other(e)),
        });
    }
    results
}

/// Read and parse GPX files, one outcome per path in input order
pub async fn load_tracks(paths: &[PathBuf]) -> Vec<LoadedTrack> {
    let reads = read_all(paths).await;

    let mut texts = Vec::new();
    let mut outcomes: Vec<Option<Result<TrackSequence, DataError>>> = Vec::new();
    for read in reads {
        match read {
            Ok(bytes) => {
                texts.push(String::from_utf8_lossy(&bytes).into_owned());
                outcomes.push(None);
            }
            Err(e) => outcomes.push(Some(Err(DataError::Io(e)))),
        }
    }

    let parsed = match tokio::task::spawn_blocking(move || parse_track_batch(&texts)).await {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Track parsing task failed: {}", e);
            Vec::new()
        }
    };
    let mut parsed = parsed.into_iter();

    paths
        .iter()
        .zip(outcomes)
        .map(|(path, outcome)| {
            let result = outcome
                .or_else(|| parsed.next())
                .unwrap_or(Err(DataError::NoTrackPointsFound));
            LoadedTrack {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Read a record from a JSON file
pub async fn read_record(path: &Path) -> Result<LandRecord, DataError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read attachments, named after their files
pub async fn read_attachments(
    specs: &[(AttachmentField, PathBuf)],
) -> Result<Vec<Attachment>, DataError> {
    let paths: Vec<PathBuf> = specs.iter().map(|(_, path)| path.clone()).collect();
    let reads = read_all(&paths).await;

    specs
        .iter()
        .zip(reads)
        .map(|((field, path), read)| Ok(Attachment::from_file(*field, path, read?)))
        .collect()
}
