use image::{GenericImage, RgbImage};

use crate::Crop;

/// A fixed grid of equally sized cells, filled one frame at a time.
///
/// Cell `i` lives at column `i % cols` and row `i / cols`. Cells may be filled in any
/// order and refilled; unfilled cells stay black.
#[derive(Debug, Clone)]
pub struct CompositeGrid {
    cols: u32,
    rows: u32,
    cell_dims: (u32, u32),
    buf: RgbImage,
}

impl CompositeGrid {
    /// Panics if any dimension is zero.
    #[must_use]
    pub fn new(cols: u32, rows: u32, cell_dims: (u32, u32)) -> Self {
        assert!(cols > 0 && rows > 0, "grid must have at least one cell");
        assert!(
            cell_dims.0 > 0 && cell_dims.1 > 0,
            "cells must have nonzero size"
        );

        Self {
            cols,
            rows,
            cell_dims,
            buf: RgbImage::new(cols * cell_dims.0, rows * cell_dims.1),
        }
    }

    #[must_use]
    pub const fn num_cells(&self) -> u32 {
        self.cols * self.rows
    }

    #[must_use]
    pub const fn cell_dims(&self) -> (u32, u32) {
        self.cell_dims
    }

    /// The rectangle occupied by cell `idx`, relative to the whole grid.
    #[must_use]
    pub fn cell_crop(&self, idx: u32) -> Crop {
        let (cell_w, cell_h) = self.cell_dims;
        let x = (idx % self.cols) * cell_w;
        let y = (idx / self.cols) * cell_h;
        Crop::from_topleft_and_dims(self.buf.dimensions(), x, y, cell_w, cell_h)
    }

    /// Copy `frame` into cell `idx`. The frame must already be exactly cell-sized.
    ///
    /// Panics if `idx` is out of range or the frame has the wrong size.
    pub fn place(&mut self, idx: u32, frame: &RgbImage) {
        assert!(idx < self.num_cells(), "cell {idx} out of range");
        assert_eq!(
            frame.dimensions(),
            self.cell_dims,
            "frame must be resized to the cell before placing"
        );

        let (x, y, _, _) = self.cell_crop(idx).as_view_args();
        self.buf
            .copy_from(frame, x, y)
            .expect("unreachable due to above assertion about frame dimensions");
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbImage {
        &self.buf
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.buf
    }
}
