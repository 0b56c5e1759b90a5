//! Color effect matrix calculation
//!
//! The magnifier applies a 5x5 affine matrix to every pixel. Rows and columns
//! are R, G, B, A and translation, in row-vector form: row `i` holds the
//! contribution of input channel `i` to each output channel, and row 4 holds
//! the constant offsets.

/// Luminance weights used for grayscale conversion (R, G, B)
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Brightness scale for each gray level (100%, 80%, 60%, 40%)
pub const BRIGHTNESS_LEVELS: [f32; 4] = [1.0, 0.8, 0.6, 0.4];

const TRANSLATION_ROW: usize = 4;

/// Brightness level index into [`BRIGHTNESS_LEVELS`]
///
/// Always in range; parsing rejects anything else and cycling wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct GrayLevel(u8);

impl GrayLevel {
    pub const COUNT: u8 = BRIGHTNESS_LEVELS.len() as u8;

    /// Returns the level for `index`, or None when it is out of range
    pub fn new(index: i64) -> Option<Self> {
        if (0..Self::COUNT as i64).contains(&index) {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Next level, wrapping from the dimmest back to full brightness
    pub fn next(self) -> Self {
        Self((self.0 + 1) % Self::COUNT)
    }

    pub fn scale(self) -> f32 {
        BRIGHTNESS_LEVELS[self.0 as usize]
    }

    /// Brightness as a whole percentage, for display
    pub fn percent(self) -> u32 {
        (self.scale() * 100.0).round() as u32
    }
}

/// Color toggles active for the filtered area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ColorSettings {
    pub inversion: bool,
    pub grayscale: bool,
    pub gray_level: GrayLevel,
}

impl ColorSettings {
    /// Settings applied to rectangles stored in the old four-field format
    pub fn legacy_default() -> Self {
        Self {
            inversion: true,
            grayscale: false,
            gray_level: GrayLevel::default(),
        }
    }

    pub fn matrix(&self) -> ColorMatrix {
        ColorMatrix::from_settings(self)
    }
}

/// 5x5 color transform in magnifier layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [[f32; 5]; 5]);

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub fn identity() -> Self {
        let mut m = [[0.0; 5]; 5];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self(m)
    }

    /// Builds the matrix for the given settings
    ///
    /// Grayscale is written first, inversion negates whatever the RGB block
    /// holds at that point, and brightness scaling is applied last. The
    /// translation row is only scaled when inversion put something there.
    pub fn from_settings(settings: &ColorSettings) -> Self {
        let mut matrix = Self::identity();
        let m = &mut matrix.0;

        if settings.grayscale {
            for (row, weight) in LUMINANCE_WEIGHTS.iter().enumerate() {
                m[row][..3].fill(*weight);
            }
        }

        if settings.inversion {
            for row in m.iter_mut().take(3) {
                for value in row.iter_mut().take(3) {
                    *value = -*value;
                }
            }
            m[TRANSLATION_ROW][..3].fill(1.0);
        }

        let scale = settings.gray_level.scale();
        if scale != 1.0 {
            for row in m.iter_mut().take(3) {
                for value in row.iter_mut().take(3) {
                    *value *= scale;
                }
            }
            if settings.inversion {
                for value in m[TRANSLATION_ROW].iter_mut().take(3) {
                    *value *= scale;
                }
            }
        }

        matrix
    }

    /// The 3x3 block mixing R, G and B
    pub fn rgb_block(&self) -> [[f32; 3]; 3] {
        let mut block = [[0.0; 3]; 3];
        for (row, out) in block.iter_mut().enumerate() {
            out.copy_from_slice(&self.0[row][..3]);
        }
        block
    }

    /// Row-major flattening, the layout of `MAGCOLOREFFECT::transform`
    pub fn to_flat(&self) -> [f32; 25] {
        let mut flat = [0.0; 25];
        for (row, values) in self.0.iter().enumerate() {
            flat[row * 5..row * 5 + 5].copy_from_slice(values);
        }
        flat
    }

    /// Applies the matrix to an RGBA color with channels in 0.0..=1.0
    pub fn apply(&self, rgba: [f32; 4]) -> [f32; 4] {
        let input = [rgba[0], rgba[1], rgba[2], rgba[3], 1.0];
        let mut out = [0.0; 4];
        for (col, value) in out.iter_mut().enumerate() {
            *value = input
                .iter()
                .enumerate()
                .map(|(row, channel)| channel * self.0[row][col])
                .sum();
        }
        out
    }
}
