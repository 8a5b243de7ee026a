//! GPX track point extraction
//!
//! Only `trkpt` elements and their `lat`/`lon` attributes are read. Routes,
//! waypoints, elevations, timestamps and extensions are ignored since the map
//! only ever draws the latitude/longitude path.

use crate::{DataError, Result, Viewport, viewport};
use geo::{Coord, LineString};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Local tag name of a GPX track point, matched regardless of namespace prefix
const TRACK_POINT_TAG: &[u8] = b"trkpt";

/// A single geographic sample in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<TrackPoint> for Coord<f64> {
    fn from(point: TrackPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

/// An ordered track, in document order of the source file
///
/// A `TrackSequence` is never empty: the only ways to obtain one are a
/// successful parse or [`TrackSequence::new`] with at least one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSequence(Vec<TrackPoint>);

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackSequence {
    /// Wrap a list of points, rejecting an empty list
    pub fn new(points: Vec<TrackPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(DataError::EmptySequence);
        }
        Ok(Self(points))
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First point of the track, used as the initial map center
    #[inline]
    pub fn first(&self) -> TrackPoint {
        self.0[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackPoint> {
        self.0.iter()
    }

    /// The track as a drawable line (x = longitude, y = latitude)
    pub fn polyline(&self) -> LineString<f64> {
        self.0.iter().copied().map(Coord::from).collect()
    }

    /// Smallest axis-aligned box containing every point, as (south-west, north-east)
    pub fn bounds(&self) -> (TrackPoint, TrackPoint) {
        viewport::bounds_of(self.first(), &self.0[1..])
    }

    /// Frame the track given the zoom the surface chose for a tight fit
    pub fn viewport(&self, current_zoom: i32) -> Viewport {
        let (south_west, north_east) = self.bounds();
        Viewport::new(south_west, north_east, current_zoom, Default::default())
    }
}

impl<'a> IntoIterator for &'a TrackSequence {
    type Item = &'a TrackPoint;
    type IntoIter = std::slice::Iter<'a, TrackPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parse GPX text into its track points
///
/// Every element whose local name is `trkpt` contributes one point, in
/// document order. Unparseable or missing coordinates become `0.0`.
///
/// # Errors
/// [`DataError::NoTrackPointsFound`] if no points were found. Malformed XML
/// is reported the same way: any points read before the error are dropped.
pub fn parse_track_points(xml_text: &str) -> Result<TrackSequence> {
    #[cfg(feature = "profiling")]
    profiling::scope!("track::parse_track_points");

    let points = match collect_track_points(xml_text) {
        Ok(points) => points,
        Err(reason) => {
            tracing::warn!("Discarding malformed GPX document: {}", reason);
            Vec::new()
        }
    };

    if points.is_empty() {
        return Err(DataError::NoTrackPointsFound);
    }

    tracing::debug!("Parsed {} track points", points.len());
    Ok(TrackSequence(points))
}

/// Parse GPX file contents that have not been decoded yet
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn parse_track_bytes(bytes: &[u8]) -> Result<TrackSequence> {
    parse_track_points(&String::from_utf8_lossy(bytes))
}

/// Parse several GPX documents in parallel, keeping input order
pub fn parse_track_batch<S: AsRef<str> + Sync>(texts: &[S]) -> Vec<Result<TrackSequence>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("track::parse_track_batch");

    texts
        .par_iter()
        .map(|text| parse_track_points(text.as_ref()))
        .collect()
}

/// Walk the document and collect points, or describe why it is malformed
fn collect_track_points(xml_text: &str) -> std::result::Result<Vec<TrackPoint>, String> {
    let xml_text = xml_text.strip_prefix('\u{feff}').unwrap_or(xml_text);
    let mut reader = Reader::from_str(xml_text);
    reader.config_mut().trim_text(true);

    let mut points = Vec::new();
    let mut depth: usize = 0;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if depth == 0 {
                    enter_root(&mut seen_root)?;
                }
                depth += 1;
                if element.local_name().as_ref() == TRACK_POINT_TAG {
                    points.push(read_track_point(&element)?);
                }
            }
            Ok(Event::Empty(element)) => {
                if depth == 0 {
                    enter_root(&mut seen_root)?;
                }
                if element.local_name().as_ref() == TRACK_POINT_TAG {
                    points.push(read_track_point(&element)?);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "closing tag without a matching opening tag".to_string())?;
            }
            Ok(Event::Text(text)) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err("text outside the root element".to_string());
                }
            }
            Ok(Event::CData(_)) if depth == 0 => {
                return Err("CDATA outside the root element".to_string());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                ));
            }
        }
    }

    if depth != 0 {
        return Err(format!("{} element(s) left unclosed", depth));
    }

    Ok(points)
}

/// A document has exactly one top-level element
fn enter_root(seen_root: &mut bool) -> std::result::Result<(), String> {
    if std::mem::replace(seen_root, true) {
        return Err("more than one root element".to_string());
    }
    Ok(())
}

/// Read `lat`/`lon` from a track point element
fn read_track_point(element: &BytesStart<'_>) -> std::result::Result<TrackPoint, String> {
    let mut point = TrackPoint::default();

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        match attribute.key.local_name().as_ref() {
            b"lat" => point.latitude = parse_coordinate(&value),
            b"lon" => point.longitude = parse_coordinate(&value),
            _ => {}
        }
    }

    Ok(point)
}

/// Parse the leading decimal number of an attribute value, or `0.0`
///
/// Leading whitespace is skipped and trailing garbage ignored (`"12.5abc"`
/// reads as `12.5`). Non-finite results also collapse to `0.0`.
fn parse_coordinate(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let end = numeric_prefix_len(trimmed);
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Length in bytes of the longest `[+-]digits[.digits][(e|E)[+-]digits]` prefix
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut mantissa_digits = int_digits;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            mantissa_digits += frac_digits;
            end += 1 + frac_digits;
        }
    }

    if mantissa_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    end
}
