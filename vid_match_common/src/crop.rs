/// A rectangular region of an image, stored as the distance of each edge from the
/// corresponding edge of the original image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Crop {
    pub orig_res: (u32, u32),
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Crop {
    #[must_use]
    pub fn from_edge_offsets(
        orig_res: (u32, u32),
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
    ) -> Self {
        assert!((left + right) < orig_res.0);
        assert!((top + bottom) < orig_res.1);
        Self {
            orig_res,
            left,
            right,
            top,
            bottom,
        }
    }

    #[must_use]
    pub fn from_topleft_and_dims(
        (orig_width, orig_height): (u32, u32),
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Self {
        assert!(x + width <= orig_width);
        assert!(y + height <= orig_height);
        let left = x;
        let right = orig_width - width - x;
        let top = y;
        let bottom = orig_height - height - y;
        Self {
            orig_res: (orig_width, orig_height),
            left,
            right,
            top,
            bottom,
        }
    }

    /// The whole image, uncropped.
    #[must_use]
    pub fn full(orig_res: (u32, u32)) -> Self {
        Self::from_edge_offsets(orig_res, 0, 0, 0, 0)
    }

    /// Cell `idx` of an even `cols` x `rows` division of an image, counting across then down.
    /// Any remainder pixels on the right and bottom edges are not covered by any cell.
    ///
    /// Returns None if the image is too small to give every cell at least one pixel, or if
    /// `idx` is out of range.
    #[must_use]
    pub fn grid_cell(orig_res: (u32, u32), cols: u32, rows: u32, idx: u32) -> Option<Self> {
        if cols == 0 || rows == 0 || idx >= cols * rows {
            return None;
        }

        let cell_w = orig_res.0 / cols;
        let cell_h = orig_res.1 / rows;
        if cell_w == 0 || cell_h == 0 {
            return None;
        }

        let x = (idx % cols) * cell_w;
        let y = (idx / cols) * cell_h;
        Some(Self::from_topleft_and_dims(orig_res, x, y, cell_w, cell_h))
    }

    /// (x, y, width, height), the argument order taken by `image::imageops::crop_imm`
    #[must_use]
    pub fn as_view_args(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.width(), self.height())
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.orig_res.0 - (self.left + self.right)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.orig_res.1 - (self.top + self.bottom)
    }

    #[must_use]
    pub fn area(&self) -> u32 {
        self.width() * self.height()
    }
}
