use serde::{Deserialize, Serialize};

/// Color lookup table for the colored texture modes.
///
/// Entry `i` sits at the centre of cell `i` of a `w × h` grid,
/// `w = ceil(sqrt(colors))`, so an external image of the same layout can be
/// sampled with the coordinates from [`Palette::tex_coords`]. Colors sweep
/// the hue wheel from `hue_start` over `hue_span` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub colors: usize,
    pub hue_start: f64,
    pub hue_span: f64,
    pub saturation: f64,
    pub brightness: f64,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: 1530,
            hue_start: 0.0,
            hue_span: 300.0,
            saturation: 1.0,
            brightness: 1.0,
        }
    }
}

impl Palette {
    #[must_use]
    pub fn with_colors(colors: usize) -> Self {
        Self {
            colors,
            ..Self::default()
        }
    }

    /// Grid layout `(width, height)` of the lookup image.
    #[must_use]
    pub fn grid_size(&self) -> (usize, usize) {
        let colors = self.colors.max(1);
        let w = (colors as f64).sqrt().ceil() as usize;
        let h = colors.div_ceil(w);
        (w, h)
    }

    /// Texel centre of entry `i`.
    #[must_use]
    pub fn tex_coord(&self, i: usize) -> [f64; 2] {
        let (w, h) = self.grid_size();
        [
            ((i % w) as f64 + 0.5) / w as f64,
            ((i / w) as f64 + 0.5) / h as f64,
        ]
    }

    #[must_use]
    pub fn tex_coords(&self) -> Vec<[f64; 2]> {
        (0..self.colors).map(|i| self.tex_coord(i)).collect()
    }

    /// Hue in degrees of entry `i`.
    #[must_use]
    pub fn hue(&self, i: usize) -> f64 {
        if self.colors <= 1 {
            return self.hue_start.rem_euclid(360.0);
        }
        let step = self.hue_span / (self.colors - 1) as f64;
        (self.hue_start + step * i as f64).rem_euclid(360.0)
    }

    #[must_use]
    pub fn rgb(&self, i: usize) -> [u8; 3] {
        hsb_to_rgb(self.hue(i), self.saturation, self.brightness)
    }

    #[must_use]
    pub fn rgb_colors(&self) -> Vec<[u8; 3]> {
        (0..self.colors).map(|i| self.rgb(i)).collect()
    }
}

/// Converts hue (degrees), saturation and brightness in `[0, 1]` to 8-bit RGB.
#[must_use]
pub fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> [u8; 3] {
    let s = saturation.clamp(0.0, 1.0);
    let v = brightness.clamp(0.0, 1.0);
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r, g, b].map(|channel| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}
