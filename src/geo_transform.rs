use std::mem::MaybeUninit;

use crate::errors::{GdalError, Result};

/// An affine transform between pixel/line `(P, L)` raster space and
/// georeferenced `(Xp, Yp)` space.
///
/// The six coefficients follow GDAL's ordering:
///
/// ```text
/// Xp = x_origin + P * pixel_width  + L * row_rotation
/// Yp = y_origin + P * column_rotation + L * pixel_height
/// ```
///
/// i.e. `[x_origin, pixel_width, row_rotation, y_origin, column_rotation, pixel_height]`.
/// `pixel_height` is negative for a north-up image.
///
/// # Example
///
/// ```rust, no_run
/// # fn main() -> gdal_facade::errors::Result<()> {
/// use gdal_facade::{Dataset, GeoTransform};
/// let ds = Dataset::open("dem.tif")?;
/// let to_pixel = ds.geo_transform()?.invert()?;
/// let (p, l) = to_pixel.apply(440_750.0, 3_751_290.0);
/// println!("pixel ({p}, {l})");
/// # Ok(())
/// # }
/// ```
///
/// See the [GDAL GeoTransform Tutorial](https://gdal.org/tutorials/geotransforms_tut.html).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoTransform {
    pub x_origin: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub y_origin: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// A north-up transform without rotation.
    pub fn north_up(x_origin: f64, y_origin: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            x_origin,
            pixel_width,
            row_rotation: 0.0,
            y_origin,
            column_rotation: 0.0,
            pixel_height,
        }
    }

    /// Coefficients in GDAL order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.x_origin,
            self.pixel_width,
            self.row_rotation,
            self.y_origin,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    /// Apply the transform to a pixel/line coordinate.
    ///
    /// Wraps [GDALApplyGeoTransform].
    ///
    /// [GDALApplyGeoTransform]: https://gdal.org/api/raster_c_api.html#_CPPv421GDALApplyGeoTransformPdddPdPd
    pub fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        let mut coefficients = self.to_array();
        let mut geo_x = MaybeUninit::<f64>::uninit();
        let mut geo_y = MaybeUninit::<f64>::uninit();
        unsafe {
            gdal_sys::GDALApplyGeoTransform(
                coefficients.as_mut_ptr(),
                pixel,
                line,
                geo_x.as_mut_ptr(),
                geo_y.as_mut_ptr(),
            );
            (geo_x.assume_init(), geo_y.assume_init())
        }
    }

    /// Compute the inverse transform, mapping `(Xp, Yp)` back to `(P, L)`.
    ///
    /// Wraps [GDALInvGeoTransform]; fails with [`GdalError::SingularTransform`]
    /// when GDAL finds the matrix non-invertible.
    ///
    /// [GDALInvGeoTransform]: https://gdal.org/api/raster_c_api.html#_CPPv419GDALInvGeoTransformPdPd
    pub fn invert(&self) -> Result<GeoTransform> {
        let mut gt_in = self.to_array();
        let mut gt_out = [0.0_f64; 6];
        let rv =
            unsafe { gdal_sys::GDALInvGeoTransform(gt_in.as_mut_ptr(), gt_out.as_mut_ptr()) };
        if rv == 0 {
            return Err(GdalError::SingularTransform);
        }
        Ok(GeoTransform::from(gt_out))
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(c: [f64; 6]) -> Self {
        Self {
            x_origin: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            y_origin: c[3],
            column_rotation: c[4],
            pixel_height: c[5],
        }
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(gt: GeoTransform) -> Self {
        gt.to_array()
    }
}

impl TryFrom<&[f64]> for GeoTransform {
    type Error = GdalError;

    fn try_from(coefficients: &[f64]) -> Result<Self> {
        let c: [f64; 6] = coefficients.try_into().map_err(|_| {
            GdalError::InvalidArgument(format!(
                "a geotransform has 6 coefficients, got {}",
                coefficients.len()
            ))
        })?;
        Ok(c.into())
    }
}

/// Invert a geotransform given as a coefficient list.
///
/// Fails with [`GdalError::InvalidArgument`] unless exactly six coefficients
/// are supplied, and with [`GdalError::SingularTransform`] when the transform
/// has no inverse.
pub fn inv_geo_transform(coefficients: &[f64]) -> Result<GeoTransform> {
    GeoTransform::try_from(coefficients)?.invert()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::test_utils::assert_transform_near;

    const UTM: [f64; 6] = [440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0];

    #[test]
    fn invert_north_up() -> Result<()> {
        let inv = GeoTransform::from(UTM).invert()?;
        assert_almost_eq(inv.x_origin, -440720.0 / 60.0, 1e-9);
        assert_almost_eq(inv.pixel_width, 1.0 / 60.0, 1e-12);
        assert_eq!(inv.row_rotation, 0.0);
        assert_almost_eq(inv.y_origin, 3751320.0 / 60.0, 1e-9);
        assert_eq!(inv.column_rotation, 0.0);
        assert_almost_eq(inv.pixel_height, -1.0 / 60.0, 1e-12);
        Ok(())
    }

    #[test]
    fn inverse_of_inverse_is_identity() -> Result<()> {
        let rotated = GeoTransform::from([100.0, 2.0, 0.5, 200.0, -0.25, -3.0]);
        for gt in [GeoTransform::from(UTM), rotated] {
            let twice = gt.invert()?.invert()?;
            assert_transform_near(&twice, &gt);
        }
        Ok(())
    }

    #[test]
    fn apply_then_invert() -> Result<()> {
        let gt = GeoTransform::from(UTM);
        let (x, y) = gt.apply(10.0, 20.0);
        assert_eq!((x, y), (440720.0 + 600.0, 3751320.0 - 1200.0));

        let (p, l) = gt.invert()?.apply(x, y);
        assert_almost_eq(p, 10.0, 1e-9);
        assert_almost_eq(l, 20.0, 1e-9);
        Ok(())
    }

    #[test]
    fn singular_transforms_fail() {
        let singular = [
            [0.0; 6],
            [10.0, 0.0, 0.0, 20.0, 0.0, -1.0],
            [10.0, 1.0, 2.0, 20.0, 2.0, 4.0],
        ];
        for c in singular {
            for _ in 0..3 {
                assert_eq!(
                    inv_geo_transform(&c),
                    Err(GdalError::SingularTransform)
                );
            }
        }
    }

    #[test]
    fn wrong_coefficient_count() {
        for len in [0, 1, 5, 7, 12] {
            let c = vec![1.0; len];
            assert!(matches!(
                inv_geo_transform(&c),
                Err(GdalError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn array_conversions_keep_order() {
        let gt = GeoTransform::try_from(&UTM[..]).unwrap();
        assert_eq!(gt.x_origin, 440720.0);
        assert_eq!(gt.pixel_height, -60.0);
        assert_eq!(<[f64; 6]>::from(gt), UTM);
        assert_eq!(
            GeoTransform::north_up(440720.0, 3751320.0, 60.0, -60.0),
            gt
        );
    }
}
