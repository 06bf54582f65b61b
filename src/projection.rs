//! WGS84 <-> UTM transverse Mercator projection.
//!
//! Detection needs a planar frame measured in metres so that the buffer
//! distance means the same thing everywhere in the area of interest. The
//! formulas are the ellipsoidal series from Snyder, "Map Projections: A Working
//! Manual" (USGS PP 1395), good to a few millimetres inside a zone.

use geo::{Coord, CoordsIter as _, LineString, MapCoords as _};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A UTM zone on the WGS84 ellipsoid, e.g. zone 33 north (EPSG:32633).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u8,
    pub north: bool,
}

impl UtmZone {
    pub fn new(zone: u8, north: bool) -> Self {
        Self { zone, north }
    }

    /// EPSG code of the zone (326xx north, 327xx south).
    pub fn epsg(self) -> u32 {
        let base = if self.north { 32_600 } else { 32_700 };
        base + u32::from(self.zone)
    }

    fn central_meridian(self) -> f64 {
        (f64::from(self.zone) * 6.0 - 183.0).to_radians()
    }

    fn false_northing(self) -> f64 {
        if self.north { 0.0 } else { FALSE_NORTHING_SOUTH }
    }

    /// Geographic (lon, lat degrees) to projected (easting, northing metres).
    pub fn forward(self, c: Coord<f64>) -> Coord<f64> {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = c.y.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let cc = ep2 * cos_phi * cos_phi;
        let a = (c.x.to_radians() - self.central_meridian()) * cos_phi;
        let m = meridian_arc(phi, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = K0
            * n
            * (a + (1.0 - t + cc) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * cc - 58.0 * ep2) * a5 / 120.0);
        let y = K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * cc + 4.0 * cc * cc) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * cc - 330.0 * ep2) * a6 / 720.0));

        Coord {
            x: x + FALSE_EASTING,
            y: y + self.false_northing(),
        }
    }

    /// Projected (easting, northing metres) back to geographic (lon, lat degrees).
    pub fn inverse(self, c: Coord<f64>) -> Coord<f64> {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        let m = (c.y - self.false_northing()) / K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = WGS84_A / denom.sqrt();
        let r1 = WGS84_A * (1.0 - e2) / denom.powf(1.5);
        let d = (c.x - FALSE_EASTING) / (n1 * K0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lambda = self.central_meridian()
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d5
                    / 120.0)
                / cos_phi1;

        Coord {
            x: lambda.to_degrees(),
            y: phi.to_degrees(),
        }
    }

    pub fn project_line(self, line: &LineString<f64>) -> LineString<f64> {
        line.map_coords(|c| self.forward(c))
    }

    pub fn unproject_line(self, line: &LineString<f64>) -> LineString<f64> {
        line.map_coords(|c| self.inverse(c))
    }
}

/// True distance along the meridian from the equator to latitude `phi`.
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Number of vertices across a set of lines, for log lines.
pub fn vertex_count<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>) -> usize {
    lines.into_iter().map(|l| l.coords_count()).sum()
}
