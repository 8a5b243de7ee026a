//! Land Track Library - Core Data Structures for the Land Registry Dashboard
//!
//! This library holds everything the dashboard does that is not view wiring:
//! extracting GPS track points from GPX attachments, framing them on a map,
//! and keeping the land-registration record table that backs the overview
//! cards and the details view.
//!
//! # Architecture
//!
//! - **[`TrackSequence`]**: Ordered, non-empty list of [`TrackPoint`]s parsed from GPX text
//! - **[`Viewport`]**: Bounding corners plus the zoom level to request from the map
//! - **[`MapSurface`]**: The rendering surface that reports its own "fit to bounds" zoom
//! - **[`LandRecord`]**: A registration row, either an individual or a representative group
//! - **[`RecordTable`]**: In-memory rows with filters, search and summary statistics
//! - **[`SubmissionPayload`]**: JSON-plus-files multipart body sent to the records backend
//!
//! # Example
//!
//! ```rust
//! use land_track_lib::parse_track_points;
//!
//! let xml = r#"<gpx><trk><trkseg>
//!     <trkpt lat="1.5" lon="2.5"/>
//!     <trkpt lat="3.5" lon="4.5"/>
//! </trkseg></trk></gpx>"#;
//!
//! let track = parse_track_points(xml).unwrap();
//! let viewport = track.viewport(5);
//! assert_eq!(viewport.zoom_level, 4);
//! assert_eq!(viewport.south_west.latitude, 1.5);
//! assert_eq!(viewport.north_east.longitude, 4.5);
//! ```

mod filter;
mod payload;
mod record;
mod surface;
mod table;
mod track;
pub mod utils;
mod viewport;

// Public API exports
pub use filter::{ColumnFilter, FilterSet, matches_search};
pub use payload::{Attachment, AttachmentField, Part, SubmissionPayload};
pub use record::{Column, DocumentStatus, LandRecord, Member, RecordId, RecordSource};
pub use surface::{MapSurface, MercatorSurface, frame_track};
pub use table::{RecordTable, TableSummary};
pub use track::{
    TrackPoint, TrackSequence, parse_track_batch, parse_track_bytes, parse_track_points,
};
pub use viewport::{
    DEFAULT_MAX_ZOOM, MIN_ZOOM, Viewport, ZoomLimits, compute_viewport, compute_viewport_within,
};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to load or parse GPX file: no track points found")]
    NoTrackPointsFound,

    #[error("Cannot compute a viewport for an empty track sequence")]
    EmptySequence,

    #[error("Please fill out the following required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("Group member {index} is invalid: {reason}")]
    InvalidMember { index: usize, reason: String },

    #[error("Invalid attachment for {field}: {reason}")]
    InvalidAttachment {
        field: &'static str,
        reason: String,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Record {0} already exists")]
    DuplicateRecord(RecordId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
