//! Report formatting for the subcommands.
//!
//! Everything writes to a `std::io::Write` so reports can be checked in tests.

use land_track_lib::{
    Column, LandRecord, SubmissionPayload, TableSummary, TrackSequence, Viewport,
};
use std::io::{self, Write};
use std::path::Path;

/// Point count and viewport of one loaded track
pub fn write_track<W: Write>(
    out: &mut W,
    path: &Path,
    track: &TrackSequence,
    viewport: &Viewport,
    with_points: bool,
) -> io::Result<()> {
    writeln!(out, "{}: {} track points", path.display(), track.len())?;
    writeln!(
        out,
        "  south-west: {:.6}, {:.6}",
        viewport.south_west.latitude, viewport.south_west.longitude
    )?;
    writeln!(
        out,
        "  north-east: {:.6}, {:.6}",
        viewport.north_east.latitude, viewport.north_east.longitude
    )?;
    writeln!(out, "  zoom: {}", viewport.zoom_level)?;
    if with_points {
        for point in track {
            writeln!(out, "  {}\t{}", point.latitude, point.longitude)?;
        }
    }
    Ok(())
}

/// Tab-separated table with the column labels as header
pub fn write_rows<W: Write>(out: &mut W, rows: &[&LandRecord]) -> io::Result<()> {
    let header: Vec<&str> = std::iter::once("ID")
        .chain(Column::ALL.iter().map(|column| column.label()))
        .collect();
    writeln!(out, "{}", header.join("\t"))?;

    for row in rows {
        let id = row.id.map(|id| id.to_string()).unwrap_or_default();
        let cells: Vec<String> = std::iter::once(id)
            .chain(Column::ALL.iter().map(|column| clean_cell(row.cell(*column))))
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

/// Tabs and newlines inside a cell would break the table
fn clean_cell(cell: String) -> String {
    if cell.contains(['\t', '\n', '\r']) {
        cell.replace(['\t', '\n', '\r'], " ")
    } else {
        cell
    }
}

pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &TableSummary,
    land_by_location: &[(String, f64)],
) -> io::Result<()> {
    writeln!(out, "Land owners:            {}", summary.land_owners)?;
    writeln!(
        out,
        "Registered land:        {} acres",
        summary.registered_land_acres
    )?;
    writeln!(out, "Sublocations:           {}", summary.sublocations)?;
    writeln!(out, "Locations:              {}", summary.locations)?;
    writeln!(out, "Representative groups:  {}", summary.representative_groups)?;
    writeln!(out, "Group members:          {}", summary.group_members)?;

    if !land_by_location.is_empty() {
        writeln!(out)?;
        writeln!(out, "Land by location:")?;
        for (location, acres) in land_by_location {
            writeln!(out, "  {}\t{} acres", location, acres)?;
        }
    }
    Ok(())
}

/// Endpoint, headers and part layout of an encoded payload
pub fn write_payload<W: Write>(
    out: &mut W,
    payload: &SubmissionPayload,
    boundary: &str,
    body_len: usize,
    output: Option<&Path>,
) -> io::Result<()> {
    writeln!(out, "POST {}", payload.endpoint())?;
    writeln!(
        out,
        "Content-Type: {}",
        SubmissionPayload::content_type(boundary)
    )?;
    writeln!(out, "Content-Length: {}", body_len)?;
    for part in payload.parts() {
        match &part.file_name {
            Some(file_name) => writeln!(
                out,
                "  part {} ({}, {}, {} bytes)",
                part.name,
                file_name,
                part.content_type,
                part.body.len()
            )?,
            None => writeln!(
                out,
                "  part {} ({}, {} bytes)",
                part.name,
                part.content_type,
                part.body.len()
            )?,
        }
    }
    if let Some(path) = output {
        writeln!(out, "Body written to {}", path.display())?;
    }
    Ok(())
}
