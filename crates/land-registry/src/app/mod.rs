//! Command dispatch for the `land-registry` binary

pub mod cli;
pub mod commands;
pub mod loader;
pub mod logging;
pub mod settings;
pub mod storage;

use land_track_lib::{
    DataError, FilterSet, MercatorSurface, RecordId, SubmissionPayload, frame_track,
};
use settings::{Command, PayloadArgs, RecordsCommand, Settings, TrackArgs};
use std::io::Write;
use storage::{FileStorage, StorageBackend, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} GPX files could not be loaded")]
    TrackFailures { failed: usize, total: usize },
}

/// Run the selected subcommand
pub async fn run(settings: Settings) -> Result<(), AppError> {
    let storage = FileStorage::new(settings.records_path());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &settings.command {
        Command::Track(args) => run_track(args, &mut out).await,
        Command::Records { action } => run_records(action, &storage, &mut out).await,
        Command::Payload(args) => run_payload(args, &mut out).await,
    }
}

async fn run_track<W: Write>(args: &TrackArgs, out: &mut W) -> Result<(), AppError> {
    let (width, height) = args.surface_size();
    let loaded = loader::load_tracks(&args.files).await;
    let total = loaded.len();
    let mut failed = 0;

    for track in loaded {
        let sequence = match track.result {
            Ok(sequence) => sequence,
            Err(e) => {
                tracing::debug!("{}: {}", track.path.display(), e);
                writeln!(
                    out,
                    "Failed to load or parse GPX file: {}",
                    track.path.display()
                )?;
                failed += 1;
                continue;
            }
        };

        let viewport = match args.zoom {
            Some(zoom) => sequence.viewport(zoom),
            None => {
                let mut surface = MercatorSurface::new(f64::from(width), f64::from(height));
                frame_track(&mut surface, &sequence)?
            }
        };
        commands::write_track(out, &track.path, &sequence, &viewport, args.points)?;
    }

    tracing::info!("Loaded {} of {} GPX files", total - failed, total);
    if failed > 0 {
        return Err(AppError::TrackFailures { failed, total });
    }
    Ok(())
}

async fn run_records<W: Write>(
    action: &RecordsCommand,
    storage: &dyn StorageBackend,
    out: &mut W,
) -> Result<(), AppError> {
    let mut table = storage.load()?;

    match action {
        RecordsCommand::List { filters, search } => {
            let mut filter_set = FilterSet::new();
            for (column, value) in filters {
                filter_set.set(*column, value.as_str());
            }
            let rows = table.visible_rows(&filter_set, search.as_deref().unwrap_or(""));
            commands::write_rows(out, &rows)?;
            tracing::debug!("Listed {} of {} records", rows.len(), table.len());
        }
        RecordsCommand::Add { file } => {
            let record = loader::read_record(file).await?;
            let id = table.insert(record)?;
            storage.save(&table)?;
            writeln!(out, "Added record {}", id)?;
            tracing::info!("Added record {}", id);
        }
        RecordsCommand::Update { file } => {
            let record = loader::read_record(file).await?;
            let id = record.id;
            table.update(record)?;
            storage.save(&table)?;
            if let Some(id) = id {
                writeln!(out, "Updated record {}", id)?;
                tracing::info!("Updated record {}", id);
            }
        }
        RecordsCommand::Remove { id } => {
            let removed = table.remove(RecordId(*id))?;
            storage.save(&table)?;
            writeln!(
                out,
                "Removed record {} ({})",
                id, removed.community_member
            )?;
            tracing::info!("Removed record {}", id);
        }
        RecordsCommand::Summary => {
            commands::write_summary(out, &table.summary(), &table.land_by_location())?;
        }
    }
    Ok(())
}

async fn run_payload<W: Write>(args: &PayloadArgs, out: &mut W) -> Result<(), AppError> {
    let record = loader::read_record(&args.file).await?;
    let attachments = loader::read_attachments(&args.attachments).await?;
    let payload = SubmissionPayload::build(record, attachments)?;

    let boundary = match &args.boundary {
        Some(boundary) => boundary.clone(),
        None => payload.boundary(),
    };
    let body = payload.encode(&boundary);

    if let Some(path) = &args.output {
        tokio::fs::write(path, &body).await?;
        tracing::info!("Wrote {} byte payload to {}", body.len(), path.display());
    }
    commands::write_payload(
        out,
        &payload,
        &boundary,
        body.len(),
        args.output.as_deref(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use storage::MemoryStorage;

    const RECORD_JSON: &str = r#"{
        "communityMember": "Amina",
        "idNumber": "12345678",
        "phoneNumber": "0712345678",
        "landSize": 4.5,
        "communityName": "Kilimani",
        "sublocation": "Sub A",
        "location": "Loc A",
        "fieldCoordinator": "Coordinator",
        "dateSigned": "2024-03-01",
        "signedLocal": "Local",
        "signedOrg": "Org",
        "witnessLocal": "Witness",
        "source": "Other"
    }"#;

    const GPX: &str = r#"<gpx><trk><trkseg>
        <trkpt lat="-1.29" lon="36.82"/>
        <trkpt lat="-1.31" lon="36.85"/>
    </trkseg></trk></gpx>"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn track_args(files: Vec<PathBuf>, zoom: Option<i32>) -> TrackArgs {
        TrackArgs {
            files,
            zoom,
            width: Some(1280),
            height: Some(720),
            points: false,
        }
    }

    #[tokio::test]
    async fn test_track_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let gpx = write_file(dir.path(), "walk.gpx", GPX);

        let mut out = Vec::new();
        run_track(&track_args(vec![gpx], Some(12)), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("walk.gpx: 2 track points"));
        assert!(text.contains("zoom: 11"));
    }

    #[tokio::test]
    async fn test_track_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_file(dir.path(), "bad.gpx", "<gpx><trk></gpx>");
        let good = write_file(dir.path(), "good.gpx", GPX);

        let mut out = Vec::new();
        let result = run_track(&track_args(vec![bad.clone(), good], None), &mut out).await;
        assert!(matches!(
            result,
            Err(AppError::TrackFailures {
                failed: 1,
                total: 2
            })
        ));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!(
            "Failed to load or parse GPX file: {}",
            bad.display()
        )));
        assert!(text.contains("good.gpx: 2 track points"));
    }

    #[tokio::test]
    async fn test_records_add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(dir.path(), "record.json", RECORD_JSON);
        let storage = MemoryStorage::default();

        let mut out = Vec::new();
        run_records(&RecordsCommand::Add { file: record }, &storage, &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Added record 1\n");

        let mut out = Vec::new();
        let list = RecordsCommand::List {
            filters: vec![(land_track_lib::Column::Location, "loc a".to_string())],
            search: Some("amina".to_string()),
        };
        run_records(&list, &storage, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);

        let mut out = Vec::new();
        run_records(&RecordsCommand::Remove { id: 1 }, &storage, &mut out)
            .await
            .unwrap();
        assert!(storage.load().unwrap().is_empty());

        let result = run_records(&RecordsCommand::Remove { id: 1 }, &storage, &mut out).await;
        assert!(matches!(
            result,
            Err(AppError::Data(DataError::RecordNotFound(RecordId(1))))
        ));
    }

    #[tokio::test]
    async fn test_records_update_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(dir.path(), "record.json", RECORD_JSON);
        let storage = MemoryStorage::default();

        let mut out = Vec::new();
        run_records(&RecordsCommand::Add { file: record }, &storage, &mut out)
            .await
            .unwrap();

        let updated = RECORD_JSON
            .replacen('{', r#"{"id": 1,"#, 1)
            .replace(r#""landSize": 4.5"#, r#""landSize": 6"#);
        let updated = write_file(dir.path(), "updated.json", &updated);
        let mut out = Vec::new();
        run_records(&RecordsCommand::Update { file: updated }, &storage, &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Updated record 1\n");

        let table = storage.load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(RecordId(1)).unwrap().land_size_acres, Some(6.0));

        let mut out = Vec::new();
        run_records(&RecordsCommand::Summary, &storage, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Land owners:            1"));
        assert!(text.contains("Registered land:        6 acres"));
        assert!(text.contains("  Loc A\t6 acres"));
    }

    #[tokio::test]
    async fn test_update_of_unknown_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RECORD_JSON.replacen('{', r#"{"id": 9,"#, 1);
        let missing = write_file(dir.path(), "missing.json", &missing);
        let storage = MemoryStorage::default();

        let mut out = Vec::new();
        let result = run_records(&RecordsCommand::Update { file: missing }, &storage, &mut out).await;
        assert!(matches!(
            result,
            Err(AppError::Data(DataError::RecordNotFound(RecordId(9))))
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(
            dir.path(),
            "record.json",
            r#"{"communityMember":"Amina","source":"Other"}"#,
        );
        let storage = MemoryStorage::default();

        let mut out = Vec::new();
        let result = run_records(&RecordsCommand::Add { file: record }, &storage, &mut out).await;
        assert!(matches!(
            result,
            Err(AppError::Data(DataError::Validation { .. }))
        ));
        assert!(storage.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payload_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(dir.path(), "record.json", RECORD_JSON);
        let gpx = write_file(dir.path(), "boundary.gpx", GPX);
        let output = dir.path().join("body.bin");

        let args = PayloadArgs {
            file: record,
            attachments: vec![(land_track_lib::AttachmentField::GisDetails, gpx)],
            boundary: Some("test-boundary".to_string()),
            output: Some(output.clone()),
        };
        let mut out = Vec::new();
        run_payload(&args, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("POST /api/forms/add-form-dialog\n"));
        assert!(text.contains("Content-Type: multipart/form-data; boundary=test-boundary"));
        assert!(text.contains("part gisDetails (boundary.gpx"));

        let body = fs::read(&output).unwrap();
        assert!(body.ends_with(b"--test-boundary--\r\n"));
    }
}
