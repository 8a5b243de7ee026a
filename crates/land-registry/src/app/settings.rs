use crate::app::cli::get_env;
use clap::{Args, Parser, Subcommand};
use land_track_lib::{AttachmentField, Column};
use std::path::PathBuf;

/// Environment variable naming the records file
pub const RECORDS_ENV: &str = "LAND_REGISTRY_RECORDS";
/// Environment variables sizing the map surface
pub const VIEWPORT_WIDTH_ENV: &str = "LAND_REGISTRY_VIEWPORT_WIDTH";
pub const VIEWPORT_HEIGHT_ENV: &str = "LAND_REGISTRY_VIEWPORT_HEIGHT";

const DEFAULT_RECORDS_FILE: &str = "records.json";
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Land Registry - land-registration records and their GPS track attachments
pub struct Settings {
    /// JSON file holding the record table [env: LAND_REGISTRY_RECORDS]
    #[clap(long, global = true, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[clap(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract track points from GPX files and frame them on a map
    Track(TrackArgs),

    /// Manage land-registration records
    Records {
        #[clap(subcommand)]
        action: RecordsCommand,
    },

    /// Build a multipart submission for a record and its attachments
    Payload(PayloadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// GPX files to load
    #[clap(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Zoom the map settled on after fitting the bounds; computed from the surface size when omitted
    #[clap(short, long, allow_negative_numbers = true)]
    pub zoom: Option<i32>,

    /// Map surface width in pixels [env: LAND_REGISTRY_VIEWPORT_WIDTH]
    #[clap(long)]
    pub width: Option<u32>,

    /// Map surface height in pixels [env: LAND_REGISTRY_VIEWPORT_HEIGHT]
    #[clap(long)]
    pub height: Option<u32>,

    /// Print every track point
    #[clap(long, default_value = "false")]
    pub points: bool,
}

impl TrackArgs {
    pub fn surface_size(&self) -> (u32, u32) {
        (
            self.width
                .or_else(|| get_env(VIEWPORT_WIDTH_ENV))
                .unwrap_or(DEFAULT_VIEWPORT_WIDTH),
            self.height
                .or_else(|| get_env(VIEWPORT_HEIGHT_ENV))
                .unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordsCommand {
    /// List rows passing the filters and search
    List {
        /// Column filter, e.g. `location=Loc A` (repeatable)
        #[clap(short, long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
        filters: Vec<(Column, String)>,

        /// Free-text search across all columns
        #[clap(short, long)]
        search: Option<String>,
    },

    /// Add a record from a JSON file
    Add {
        #[clap(value_name = "JSON_FILE")]
        file: PathBuf,
    },

    /// Replace the record with the same id from a JSON file
    Update {
        #[clap(value_name = "JSON_FILE")]
        file: PathBuf,
    },

    /// Remove a record by id
    Remove { id: u64 },

    /// Show overview figures and registered land per location
    Summary,
}

#[derive(Args, Debug, Clone)]
pub struct PayloadArgs {
    /// Record as JSON
    #[clap(value_name = "JSON_FILE")]
    pub file: PathBuf,

    /// Attachment, e.g. `gisDetails=boundary.gpx` (repeatable)
    #[clap(short, long = "attach", value_name = "FIELD=PATH", value_parser = parse_attachment)]
    pub attachments: Vec<(AttachmentField, PathBuf)>,

    /// Multipart boundary; generated when omitted
    #[clap(long)]
    pub boundary: Option<String>,

    /// Write the encoded body here
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from the command line, exiting on invalid input
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Records file from the flag, the environment or the default
    pub fn records_path(&self) -> PathBuf {
        self.records
            .clone()
            .or_else(|| get_env::<PathBuf>(RECORDS_ENV))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDS_FILE))
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    raw.split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))
}

fn parse_filter(raw: &str) -> Result<(Column, String), String> {
    let (column, value) = split_pair(raw)?;
    let column = column.parse::<Column>().map_err(|e| e.to_string())?;
    Ok((column, value.to_string()))
}

fn parse_attachment(raw: &str) -> Result<(AttachmentField, PathBuf), String> {
    let (field, path) = split_pair(raw)?;
    let field = AttachmentField::from_form_name(field).ok_or_else(|| {
        format!(
            "unknown attachment field `{}` (expected loiDocument, mouDocument or gisDetails)",
            field
        )
    })?;
    Ok((field, PathBuf::from(path)))
}
