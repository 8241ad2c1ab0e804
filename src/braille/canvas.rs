/// Braille Unicode canvas for terminal graphics.
/// Each character cell packs a 2x4 dot grid; patterns live at U+2800..U+28FF.
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    /// Dot bit patterns, row-major, one byte per character cell
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// Create a canvas with the given character dimensions.
    /// Dot resolution is cols*2 x rows*4.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0u8; cols * rows],
        }
    }

    /// Dot resolution (width, height)
    pub fn dot_size(&self) -> (usize, usize) {
        (self.cols * 2, self.rows * 4)
    }

    /// Set a dot. Dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_dot(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.cols || cy >= self.rows {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        self.cells[cy * self.cols + cx] |= bit;
    }

    /// Set a dot from signed coordinates, ignoring anything off-canvas
    #[inline]
    pub fn set_dot_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_dot(x as usize, y as usize);
        }
    }

    /// Glyph at a character cell, `None` for blank cells
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        match self.cells[row * self.cols + col] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| {
                row.iter()
                    .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_dot(0, 0);
        assert_eq!(canvas.to_string(), "⠁");
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_dot(x, y);
            }
        }
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_off_canvas_ignored() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_dot_signed(-1, 0);
        canvas.set_dot(4, 0);
        canvas.set_dot(0, 4);
        assert_eq!(canvas.glyph(0, 0), None);
        assert_eq!(canvas.glyph(1, 0), None);
        assert_eq!(canvas.glyph(2, 0), None);
    }

    #[test]
    fn test_glyph_lookup() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_dot(2, 2);
        canvas.set_dot(3, 3);
        assert_eq!(canvas.glyph(0, 0), None);
        assert_eq!(canvas.glyph(1, 0), Some('⢄'));
        assert_eq!(canvas.dot_size(), (4, 4));
    }
}
