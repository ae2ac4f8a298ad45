use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::domain::{
    detection::{BoundingBox, Detection},
    palette::Palette,
};

const GLYPH_SIZE: u32 = 8;
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Burns boxes and `"<class>: <conf>"` labels into a copy of a frame.
#[derive(Debug, Clone)]
pub struct Annotator {
    palette: Palette,
    stroke: u32,
    glyph_scale: u32,
    label_padding: u32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

impl Annotator {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            stroke: 2,
            glyph_scale: 2,
            label_padding: 5,
        }
    }

    /// Draws every detection in order onto a clone of `image`. The caller's
    /// raster is never touched and the result has the same dimensions.
    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        for det in detections {
            self.draw_detection(&mut canvas, det);
        }
        canvas
    }

    /// Pixel footprint of `text` without padding.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        let cell = GLYPH_SIZE * self.glyph_scale;
        (text.chars().count() as u32 * cell, cell)
    }

    fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection) {
        let color = self.palette.color_for(&det.category);
        self.draw_box(canvas, &det.bbox, color);

        let label = det.label();
        let (text_w, text_h) = self.text_size(&label);
        let bg_w = text_w + 2 * self.label_padding;
        let bg_h = text_h + 2 * self.label_padding;

        // Sits on the box's top edge; pushed down when it would leave the image.
        let bg_x = det.bbox.x1();
        let bg_y = (det.bbox.y1() - bg_h as i32).max(0);
        draw_filled_rect_mut(canvas, Rect::at(bg_x, bg_y).of_size(bg_w, bg_h), color);

        let pad = self.label_padding as i32;
        self.draw_text(canvas, bg_x + pad, bg_y + pad, &label, TEXT_COLOR);
    }

    fn draw_box(&self, canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
        // Edges are inclusive, so the outer ring spans width + 1 pixels.
        let w = bbox.width() + 1;
        let h = bbox.height() + 1;
        for i in 0..self.stroke {
            if 2 * i >= w || 2 * i >= h {
                break;
            }
            let rect = Rect::at(bbox.x1() + i as i32, bbox.y1() + i as i32)
                .of_size(w - 2 * i, h - 2 * i);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }

    fn draw_text(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        let scale = self.glyph_scale;
        let advance = (GLYPH_SIZE * scale) as i32;
        for (i, ch) in text.chars().enumerate() {
            let glyph = BASIC_FONTS
                .get(ch)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            let origin_x = x + i as i32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let px = origin_x + (col * scale) as i32;
                    let py = y + (row as u32 * scale) as i32;
                    draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(scale, scale), color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::palette::DEFAULT_COLOR;
    use proptest::prelude::*;

    const GREY: Rgb<u8> = Rgb([40, 40, 40]);

    fn frame(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, GREY)
    }

    fn det(category: &str, bbox: [i32; 4]) -> Detection {
        Detection {
            category: category.to_string(),
            confidence: 0.91,
            bbox: BoundingBox::try_from(bbox).unwrap(),
        }
    }

    #[test]
    fn empty_detection_list_returns_identical_copy() {
        let input = frame(64, 48);
        let out = Annotator::default().annotate(&input, &[]);
        assert_eq!(out, input);
    }

    #[test]
    fn input_is_left_untouched() {
        let input = frame(200, 150);
        let before = input.clone();
        let out = Annotator::default().annotate(&input, &[det("plastic", [20, 60, 120, 140])]);
        assert_eq!(input, before);
        assert_ne!(out, input);
    }

    #[test]
    fn box_is_stroked_two_pixels_in_category_colour() {
        let input = frame(200, 150);
        let out = Annotator::default().annotate(&input, &[det("glass", [20, 60, 120, 140])]);
        let magenta = Rgb([255, 0, 255]);
        // bottom edge, outer and inner ring
        assert_eq!(*out.get_pixel(70, 140), magenta);
        assert_eq!(*out.get_pixel(70, 139), magenta);
        assert_eq!(*out.get_pixel(70, 138), GREY);
        // right edge
        assert_eq!(*out.get_pixel(120, 100), magenta);
        assert_eq!(*out.get_pixel(119, 100), magenta);
        // interior untouched
        assert_eq!(*out.get_pixel(70, 100), GREY);
    }

    #[test]
    fn label_background_sits_above_the_box() {
        let annotator = Annotator::default();
        let d = det("metal", [20, 60, 120, 140]);
        let out = annotator.annotate(&frame(400, 150), &[d.clone()]);
        let (_, text_h) = annotator.text_size(&d.label());
        let bg_top = 60 - (text_h + 10) as i32;
        // top-left corner of the background is padding, never text
        assert_eq!(*out.get_pixel(21, bg_top as u32), Rgb([192, 192, 192]));
        assert_eq!(*out.get_pixel(21, (bg_top - 1) as u32), GREY);
    }

    #[test]
    fn label_is_clamped_inside_the_image() {
        let annotator = Annotator::default();
        let out = annotator.annotate(&frame(400, 150), &[det("battery", [10, 0, 100, 100])]);
        assert_eq!(*out.get_pixel(11, 0), DEFAULT_COLOR);
        let (_, text_h) = annotator.text_size("x");
        // background now spans [0, text_h + 10) below the top edge
        assert_eq!(*out.get_pixel(11, text_h + 9), DEFAULT_COLOR);
    }

    #[test]
    fn label_text_is_black() {
        let dets = [det("paper", [20, 60, 120, 140])];
        let out = Annotator::default().annotate(&frame(400, 150), &dets);
        let has_black = out.pixels().any(|p| *p == TEXT_COLOR);
        assert!(has_black);
    }

    #[test]
    fn boxes_touching_the_border_do_not_panic() {
        let dets = [det("organic", [0, 0, 29, 19]), det("organic", [28, 18, 29, 19])];
        let out = Annotator::default().annotate(&frame(30, 20), &dets);
        assert_eq!(out.dimensions(), (30, 20));
    }

    proptest! {
        #[test]
        fn dimensions_are_preserved(
            w in 1u32..96,
            h in 1u32..96,
            boxes in proptest::collection::vec((0i32..96, 0i32..96, 1i32..40, 1i32..40), 0..6),
        ) {
            let dets: Vec<_> = boxes
                .into_iter()
                .filter_map(|(x, y, bw, bh)| {
                    let (w, h) = (w as i32, h as i32);
                    let bbox = BoundingBox::new(
                        x.min(w - 1),
                        y.min(h - 1),
                        (x + bw).min(w),
                        (y + bh).min(h),
                    )?;
                    Some(Detection { category: "plastic".into(), confidence: 0.5, bbox })
                })
                .collect();
            let input = frame(w, h);
            let out = Annotator::default().annotate(&input, &dets);
            prop_assert_eq!(out.dimensions(), (w, h));
            prop_assert_eq!(input, frame(w, h));
        }
    }
}
