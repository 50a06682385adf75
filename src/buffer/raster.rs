use rayon::prelude::*;

use crate::foundation::core::Rectangle;

/// Working pixel block exchanged between operations during evaluation.
///
/// Pixels are linear straight-alpha RGBA f32, row-major over `rect`. Reads outside `rect` see
/// transparent black.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    rect: Rectangle,
    data: Vec<[f32; 4]>,
}

impl Raster {
    /// Transparent raster covering `rect`.
    pub fn new(rect: Rectangle) -> Self {
        Self {
            rect,
            data: vec![[0.0; 4]; rect.area() as usize],
        }
    }

    /// Wrap existing pixels. `data.len()` must equal `rect.area()`.
    pub fn from_pixels(rect: Rectangle, data: Vec<[f32; 4]>) -> Option<Self> {
        (data.len() as u64 == rect.area()).then_some(Self { rect, data })
    }

    /// Region covered.
    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    /// Row-major pixel slice.
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.data
    }

    /// Mutable row-major pixel slice.
    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.data
    }

    /// Consume into raw pixels.
    pub fn into_pixels(self) -> Vec<[f32; 4]> {
        self.data
    }

    /// Pixel at absolute coordinates; transparent outside.
    pub fn get(&self, x: i64, y: i64) -> [f32; 4] {
        if !self.rect.contains_point(x, y) {
            return [0.0; 4];
        }
        self.data[self.rect.index_of(x, y)]
    }

    /// Overwrite the pixel at absolute coordinates. Writes outside are ignored.
    pub fn put(&mut self, x: i64, y: i64, px: [f32; 4]) {
        if self.rect.contains_point(x, y) {
            let i = self.rect.index_of(x, y);
            self.data[i] = px;
        }
    }

    /// Copy of the pixels inside `rect`; areas outside `self.rect` come back transparent.
    pub fn crop(&self, rect: Rectangle) -> Raster {
        if rect == self.rect {
            return self.clone();
        }
        let mut out = Raster::new(rect);
        let overlap = rect.intersect(self.rect);
        if overlap.is_empty() {
            return out;
        }
        let w = overlap.width as usize;
        for y in overlap.y as i64..overlap.bottom() {
            let si = self.rect.index_of(i64::from(overlap.x), y);
            let di = rect.index_of(i64::from(overlap.x), y);
            out.data[di..di + w].copy_from_slice(&self.data[si..si + w]);
        }
        out
    }

    /// Run `f(y, row)` over every row, on the rayon pool when `parallel` is set.
    pub fn for_each_row(&mut self, parallel: bool, f: impl Fn(i64, &mut [[f32; 4]]) + Send + Sync) {
        if self.rect.is_empty() {
            return;
        }
        let w = self.rect.width as usize;
        let y0 = i64::from(self.rect.y);
        if parallel {
            self.data
                .par_chunks_mut(w)
                .enumerate()
                .for_each(|(i, row)| f(y0 + i as i64, row));
        } else {
            for (i, row) in self.data.chunks_mut(w).enumerate() {
                f(y0 + i as i64, row);
            }
        }
    }

    /// Build a raster over `rect` by evaluating `f(x, y)` for every pixel.
    pub fn generate(
        rect: Rectangle,
        parallel: bool,
        f: impl Fn(i64, i64) -> [f32; 4] + Send + Sync,
    ) -> Raster {
        let mut out = Raster::new(rect);
        let x0 = i64::from(rect.x);
        out.for_each_row(parallel, |y, row| {
            for (i, px) in row.iter_mut().enumerate() {
                *px = f(x0 + i as i64, y);
            }
        });
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/raster.rs"]
mod tests;
