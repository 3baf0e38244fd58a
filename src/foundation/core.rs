use crate::foundation::error::{ParamError, ParamResult};

pub use kurbo::{Affine, Point};

/// Opaque black, used for palette rows that hold no colors.
pub const OPAQUE_BLACK: u32 = 0xff00_0000;

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
/// A complex number.
pub struct Cplx {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Cplx {
    /// Build a complex number from its parts.
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<[f64; 2]> for Cplx {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<Cplx> for [f64; 2] {
    fn from(c: Cplx) -> Self {
        [c.re, c.im]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
/// Affine mapping from normalized view coordinates into the complex plane.
///
/// `x' = xx * x + yx * y + cx`, `y' = xy * x + yy * y + cy`.
pub struct Scale {
    /// x contribution to x'.
    pub xx: f64,
    /// x contribution to y'.
    pub xy: f64,
    /// y contribution to x'.
    pub yx: f64,
    /// y contribution to y'.
    pub yy: f64,
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
}

impl Scale {
    /// Scale used when a program neither declares nor stores one.
    pub const DEFAULT: Scale = Scale::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);

    /// Build a scale from its six coefficients.
    pub const fn new(xx: f64, xy: f64, yx: f64, yy: f64, cx: f64, cy: f64) -> Self {
        Self {
            xx,
            xy,
            yx,
            yy,
            cx,
            cy,
        }
    }

    /// Uniform zoom around the origin.
    pub fn scaled(factor: f64) -> Self {
        Self::new(factor, 0.0, 0.0, factor, 0.0, 0.0)
    }

    /// The equivalent kurbo transform.
    pub fn to_affine(self) -> Affine {
        Affine::new([self.xx, self.xy, self.yx, self.yy, self.cx, self.cy])
    }

    /// Inverse of [`Scale::to_affine`].
    pub fn from_affine(affine: Affine) -> Self {
        let [xx, xy, yx, yy, cx, cy] = affine.as_coeffs();
        Self::new(xx, xy, yx, yy, cx, cy)
    }

    /// Map a normalized view point into the complex plane.
    pub fn map(self, p: Point) -> Cplx {
        let q = self.to_affine() * p;
        Cplx::new(q.x, q.y)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<[f64; 6]> for Scale {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl From<Scale> for [f64; 6] {
    fn from(s: Scale) -> Self {
        [s.xx, s.xy, s.yx, s.yy, s.cx, s.cy]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "PaletteRepr", into = "PaletteRepr")]
/// A fixed-size grid of ARGB colors, stored row-major.
pub struct Palette {
    width: u32,
    height: u32,
    colors: Vec<u32>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PaletteRepr {
    width: u32,
    height: u32,
    colors: Vec<u32>,
}

impl Palette {
    /// Build a palette, validating that `colors` has exactly `width * height` entries.
    pub fn new(width: u32, height: u32, colors: Vec<u32>) -> ParamResult<Self> {
        if width == 0 || height == 0 {
            return Err(ParamError::type_error("palette dimensions must be > 0"));
        }
        let expected = (width as usize) * (height as usize);
        if colors.len() != expected {
            return Err(ParamError::type_error(format!(
                "palette {width}x{height} needs {expected} colors, got {}",
                colors.len()
            )));
        }
        Ok(Self {
            width,
            height,
            colors,
        })
    }

    /// Build a palette from rows of differing length.
    ///
    /// The width is the widest row. Shorter rows repeat cyclically and empty
    /// rows are filled with [`OPAQUE_BLACK`].
    pub fn from_rows(rows: &[Vec<u32>]) -> ParamResult<Self> {
        if rows.is_empty() {
            return Err(ParamError::type_error("palette must not be empty"));
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let mut colors = Vec::with_capacity(width * rows.len());
        for row in rows {
            for x in 0..width {
                colors.push(if row.is_empty() {
                    OPAQUE_BLACK
                } else {
                    row[x % row.len()]
                });
            }
        }
        Self::new(width as u32, rows.len() as u32, colors)
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at column `x`, row `y`. Coordinates wrap around.
    pub fn argb(&self, x: u32, y: u32) -> u32 {
        let x = x % self.width;
        let y = y % self.height;
        self.colors[(y * self.width + x) as usize]
    }

    /// All colors, row-major.
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }
}

impl TryFrom<PaletteRepr> for Palette {
    type Error = ParamError;

    fn try_from(r: PaletteRepr) -> Result<Self, Self::Error> {
        Palette::new(r.width, r.height, r.colors)
    }
}

impl From<Palette> for PaletteRepr {
    fn from(p: Palette) -> Self {
        Self {
            width: p.width,
            height: p.height,
            colors: p.colors,
        }
    }
}
