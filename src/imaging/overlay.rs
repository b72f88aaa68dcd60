use crate::config::LabelPalette;
use crate::dataset::BoundingBox;
use image::RgbImage;

/// Tints box regions halfway toward their label's colour.
pub struct BoxOverlay<'a> {
    palette: &'a LabelPalette,
}

impl<'a> BoxOverlay<'a> {
    pub fn new(palette: &'a LabelPalette) -> Self {
        Self { palette }
    }

    /// Return a copy of `image` with every box blended in, in order.
    ///
    /// Each pixel in `[ymin, ymax) x [xmin, xmax)` becomes `(pixel + colour) / 2`.
    /// Overlapping boxes compound: later boxes blend the already-tinted pixels.
    /// Coordinates are clipped to the image; boxes whose label has no colour are
    /// skipped.
    pub fn apply(&self, image: &RgbImage, boxes: &[BoundingBox]) -> RgbImage {
        let _span = tracing::debug_span!("add_boxes", count = boxes.len()).entered();

        let mut output = image.clone();
        let (width, height) = output.dimensions();

        for bbox in boxes {
            let Some(color) = self.palette.color(&bbox.label) else {
                tracing::warn!("No colour for label '{}', skipping box", bbox.label);
                continue;
            };

            let (x0, x1) = clip_span(bbox.xmin, bbox.xmax, width);
            let (y0, y1) = clip_span(bbox.ymin, bbox.ymax, height);

            for y in y0..y1 {
                for x in x0..x1 {
                    let pixel = output.get_pixel_mut(x, y);
                    for (channel, tint) in pixel.0.iter_mut().zip(color) {
                        *channel = ((*channel as u16 + tint as u16) / 2) as u8;
                    }
                }
            }
        }

        output
    }
}

/// Clamp a half-open `[start, end)` span to `[0, limit]`. Inverted spans come back empty.
fn clip_span(start: i64, end: i64, limit: u32) -> (u32, u32) {
    let limit = limit as i64;
    let start = start.clamp(0, limit);
    let end = end.clamp(0, limit).max(start);
    (start as u32, end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bbox(xmin: i64, ymin: i64, xmax: i64, ymax: i64, label: &str) -> BoundingBox {
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
            label: label.into(),
        }
    }

    #[test]
    fn blends_half_way_toward_label_colour() {
        let palette = LabelPalette::default();
        let image = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));

        let out = BoxOverlay::new(&palette).apply(&image, &[bbox(1, 1, 3, 3, "car")]);

        assert_eq!(out.get_pixel(1, 1).0, [177, 50, 50]);
        assert_eq!(out.get_pixel(2, 2).0, [177, 50, 50]);
        // end coordinates are exclusive
        assert_eq!(out.get_pixel(3, 3).0, [100, 100, 100]);
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100]);
        // input untouched
        assert_eq!(image.get_pixel(1, 1).0, [100, 100, 100]);
    }

    #[test]
    fn overlapping_boxes_compound() {
        let palette = LabelPalette::default();
        let original = 40u8;
        let image = RgbImage::from_pixel(2, 2, Rgb([original, original, original]));
        let boxes = [bbox(0, 0, 2, 2, "truck"), bbox(0, 0, 2, 2, "truck")];

        let out = BoxOverlay::new(&palette).apply(&image, &boxes);

        let once = (original as u16 + 255) / 2;
        let twice = (once + 255) / 2;
        assert_eq!(out.get_pixel(0, 0).0, [10, 10, twice as u8]);
        assert_ne!(twice, once);
    }

    #[test]
    fn out_of_bounds_boxes_clip() {
        let palette = LabelPalette::default();
        let image = RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]));

        let out = BoxOverlay::new(&palette).apply(
            &image,
            &[bbox(-5, 2, 100, 100, "pedestrian"), bbox(5, 5, 9, 9, "car")],
        );

        for x in 0..3 {
            assert_eq!(out.get_pixel(x, 2).0, [0, 127, 0]);
            assert_eq!(out.get_pixel(x, 1).0, [0, 0, 0]);
        }
    }

    #[test]
    fn inverted_box_touches_nothing() {
        let palette = LabelPalette::default();
        let image = RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]));
        let out = BoxOverlay::new(&palette).apply(&image, &[bbox(2, 2, 1, 1, "car")]);
        assert_eq!(out, image);
    }

    #[test]
    fn unknown_label_is_skipped() {
        let palette = LabelPalette::default();
        let image = RgbImage::from_pixel(2, 2, Rgb([9, 9, 9]));
        let out = BoxOverlay::new(&palette).apply(
            &image,
            &[bbox(0, 0, 2, 2, "bus"), bbox(0, 0, 1, 1, "biker")],
        );
        assert_eq!(out.get_pixel(1, 1).0, [9, 9, 9]);
        assert_eq!(out.get_pixel(0, 0).0, [132, 4, 132]);
    }
}
