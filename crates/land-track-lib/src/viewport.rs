//! Map viewport framing a track
//!
//! The final zoom is one level coarser than the surface's own tight fit,
//! leaving a visual margin around the track.

use crate::{DataError, Result, TrackPoint};
use serde::{Deserialize, Serialize};

/// Lowest zoom level a tiled web map supports (whole world in one tile)
pub const MIN_ZOOM: i32 = 0;

/// Highest zoom level requested by default
pub const DEFAULT_MAX_ZOOM: i32 = 22;

/// Inclusive range of zoom levels supported by a rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: i32,
    pub max: i32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
        }
    }
}

impl ZoomLimits {
    /// Create limits, swapping the bounds if given in the wrong order
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[inline]
    pub fn clamp(&self, zoom: i32) -> i32 {
        zoom.clamp(self.min, self.max)
    }
}

/// Bounding region and zoom level used to frame a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub south_west: TrackPoint,
    pub north_east: TrackPoint,
    pub zoom_level: i32,
}

impl Viewport {
    /// Build a viewport from corners and the surface's tight-fit zoom
    pub(crate) fn new(
        south_west: TrackPoint,
        north_east: TrackPoint,
        current_zoom: i32,
        limits: ZoomLimits,
    ) -> Self {
        Self {
            south_west,
            north_east,
            zoom_level: limits.clamp(current_zoom.saturating_sub(1)),
        }
    }

    /// Center of the bounding box
    pub fn center(&self) -> TrackPoint {
        TrackPoint::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }

    /// Bounding box as a `geo::Rect` (x = longitude, y = latitude)
    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(self.south_west, self.north_east)
    }

    /// Whether a point lies inside the bounding box (edges included)
    pub fn contains(&self, point: &TrackPoint) -> bool {
        point.latitude >= self.south_west.latitude
            && point.latitude <= self.north_east.latitude
            && point.longitude >= self.south_west.longitude
            && point.longitude <= self.north_east.longitude
    }
}

/// Compute the viewport for a track, floored at [`MIN_ZOOM`]
///
/// `current_zoom` is the zoom the rendering surface reported after fitting
/// the bounds itself.
///
/// # Errors
/// [`DataError::EmptySequence`] if `points` is empty.
pub fn compute_viewport(points: &[TrackPoint], current_zoom: i32) -> Result<Viewport> {
    compute_viewport_within(points, current_zoom, ZoomLimits::default())
}

/// Compute the viewport for a track using the surface's own zoom range
pub fn compute_viewport_within(
    points: &[TrackPoint],
    current_zoom: i32,
    limits: ZoomLimits,
) -> Result<Viewport> {
    let (first, rest) = points.split_first().ok_or(DataError::EmptySequence)?;
    let (south_west, north_east) = bounds_of(*first, rest);
    Ok(Viewport::new(south_west, north_east, current_zoom, limits))
}

/// Min/max corners of a non-empty set of points
pub(crate) fn bounds_of(first: TrackPoint, rest: &[TrackPoint]) -> (TrackPoint, TrackPoint) {
    rest.iter()
        .fold((first, first), |(mut south_west, mut north_east), point| {
            south_west.latitude = south_west.latitude.min(point.latitude);
            south_west.longitude = south_west.longitude.min(point.longitude);
            north_east.latitude = north_east.latitude.max(point.latitude);
            north_east.longitude = north_east.longitude.max(point.longitude);
            (south_west, north_east)
        })
}
