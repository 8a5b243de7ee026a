//! Map rendering surface
//!
//! The viewport's zoom depends on what the surface itself picks when asked to
//! fit a bounding box, so the surface is a trait: the dashboard's embedded map
//! implements it in the view layer, and [`MercatorSurface`] reproduces a tiled
//! Web Mercator map's fit for headless use.

use crate::{Result, TrackPoint, TrackSequence, Viewport, ZoomLimits, compute_viewport_within};
use crate::utils::{self, EARTH_SIZE_METERS};

/// Default slippy-map tile edge in pixels
pub const DEFAULT_TILE_SIZE: f64 = 256.0;

/// A surface that can fit itself to a bounding box
pub trait MapSurface {
    /// Zoom levels the surface can display
    fn zoom_limits(&self) -> ZoomLimits;

    /// Fit the surface to the box and report the zoom it settled on
    fn fit_bounds(&mut self, south_west: TrackPoint, north_east: TrackPoint) -> i32;
}

/// Headless Web Mercator map of a fixed pixel size
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorSurface {
    pub width_px: f64,
    pub height_px: f64,
    pub tile_size: f64,
    pub limits: ZoomLimits,
    zoom: i32,
}

impl MercatorSurface {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
            tile_size: DEFAULT_TILE_SIZE,
            limits: ZoomLimits::default(),
            zoom: ZoomLimits::default().min,
        }
    }

    pub fn with_limits(mut self, limits: ZoomLimits) -> Self {
        self.limits = limits;
        self.zoom = limits.clamp(self.zoom);
        self
    }

    /// Zoom reported by the last fit
    #[inline]
    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    /// Largest zoom at which a span covering `fraction` of the world fits in `pixels`
    fn axis_zoom(&self, pixels: f64, fraction: f64) -> f64 {
        if fraction <= 0.0 {
            return f64::INFINITY;
        }
        (pixels / (self.tile_size * fraction)).log2()
    }

    /// Center of the viewport as the map would display it (midpoint in projected space)
    pub fn projected_center(viewport: &Viewport) -> TrackPoint {
        let south_west = utils::track_point_to_mercator(&viewport.south_west);
        let north_east = utils::track_point_to_mercator(&viewport.north_east);
        utils::mercator_to_wgs84(
            (south_west.x() + north_east.x()) / 2.0,
            (south_west.y() + north_east.y()) / 2.0,
        )
    }
}

impl MapSurface for MercatorSurface {
    fn zoom_limits(&self) -> ZoomLimits {
        self.limits
    }

    fn fit_bounds(&mut self, south_west: TrackPoint, north_east: TrackPoint) -> i32 {
        let lon_fraction = (north_east.longitude - south_west.longitude).abs() / 360.0;
        let lat_fraction = (utils::track_point_to_mercator(&north_east).y()
            - utils::track_point_to_mercator(&south_west).y())
        .abs()
            / EARTH_SIZE_METERS;

        let fit = self
            .axis_zoom(self.width_px, lon_fraction)
            .min(self.axis_zoom(self.height_px, lat_fraction));

        self.zoom = if fit.is_finite() {
            // Saturating float-to-int cast; clamped right after
            self.limits.clamp(fit.floor() as i32)
        } else if fit.is_sign_negative() {
            self.limits.min
        } else {
            self.limits.max
        };

        tracing::debug!(
            "Fitted bounds ({}, {})..({}, {}) at zoom {}",
            south_west.latitude,
            south_west.longitude,
            north_east.latitude,
            north_east.longitude,
            self.zoom
        );
        self.zoom
    }
}

/// Fit the surface to a track, then zoom out one level for margin
pub fn frame_track<S: MapSurface + ?Sized>(
    surface: &mut S,
    track: &TrackSequence,
) -> Result<Viewport> {
    let (south_west, north_east) = track.bounds();
    let current_zoom = surface.fit_bounds(south_west, north_east);
    compute_viewport_within(track.points(), current_zoom, surface.zoom_limits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MAX_LATITUDE;

    #[test]
    fn test_whole_world_fits_at_zoom_zero() {
        let mut surface = MercatorSurface::new(256.0, 256.0);
        let zoom = surface.fit_bounds(
            TrackPoint::new(-MAX_LATITUDE, -180.0),
            TrackPoint::new(MAX_LATITUDE, 180.0),
        );
        assert_eq!(zoom, 0);
        assert_eq!(surface.zoom(), 0);
    }

    #[test]
    fn test_half_longitude_span_zooms_in_once() {
        let mut surface = MercatorSurface::new(256.0, 256.0);
        let zoom = surface.fit_bounds(TrackPoint::new(0.0, -90.0), TrackPoint::new(0.0, 90.0));
        assert_eq!(zoom, 1);
    }

    #[test]
    fn test_larger_surface_zooms_further() {
        let south_west = TrackPoint::new(0.0, -90.0);
        let north_east = TrackPoint::new(0.0, 90.0);
        let small = MercatorSurface::new(256.0, 256.0).fit_bounds(south_west, north_east);
        let large = MercatorSurface::new(1024.0, 256.0).fit_bounds(south_west, north_east);
        assert_eq!(large, small + 2);
    }

    #[test]
    fn test_single_point_uses_max_zoom() {
        let limits = ZoomLimits::new(0, 18);
        let mut surface = MercatorSurface::new(800.0, 600.0).with_limits(limits);
        let zoom = surface.fit_bounds(TrackPoint::new(1.0, 1.0), TrackPoint::new(1.0, 1.0));
        assert_eq!(zoom, 18);
    }

    #[test]
    fn test_frame_track_zooms_out_from_fit() {
        let track = TrackSequence::new(vec![
            TrackPoint::new(0.0, -90.0),
            TrackPoint::new(0.0, 90.0),
        ])
        .unwrap();
        let mut surface = MercatorSurface::new(256.0, 256.0);
        let viewport = frame_track(&mut surface, &track).unwrap();
        assert_eq!(surface.zoom(), 1);
        assert_eq!(viewport.zoom_level, 0);
        assert_eq!(viewport.south_west, TrackPoint::new(0.0, -90.0));
        assert_eq!(viewport.north_east, TrackPoint::new(0.0, 90.0));
    }

    #[test]
    fn test_projected_center_on_equator() {
        let track = TrackSequence::new(vec![
            TrackPoint::new(-10.0, 30.0),
            TrackPoint::new(10.0, 40.0),
        ])
        .unwrap();
        let center = MercatorSurface::projected_center(&track.viewport(5));
        assert!(center.latitude.abs() < 1e-9);
        assert!((center.longitude - 35.0).abs() < 1e-9);
    }
}
