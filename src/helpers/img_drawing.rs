use crate::dataset::common_structs::BoundingBox;
use image::{Rgb, RgbImage};
use imageproc::rect::Rect;

// Dark colors stay readable on bright daytime road scenes
const DARK_COLORS: [[u8; 3]; 16] = [
    [139, 0, 0],
    [0, 100, 0],
    [0, 0, 139],
    [85, 107, 47],
    [139, 69, 19],
    [0, 139, 139],
    [139, 0, 139],
    [47, 79, 79],
    [112, 128, 144],
    [75, 0, 130],
    [123, 104, 238],
    [0, 128, 128],
    [128, 0, 0],
    [34, 139, 34],
    [70, 130, 180],
    [105, 105, 105],
];

pub fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(DARK_COLORS[class_id as usize % DARK_COLORS.len()])
}

pub fn draw_bb_to_img(img: &mut RgbImage, bb: &BoundingBox) {
    draw_bb_to_img_with_color(img, bb, class_color(bb.class_id));
}

/// Draws a 2 pixel wide outline of the part of `bb` inside the image
pub fn draw_bb_to_img_with_color(img: &mut RgbImage, bb: &BoundingBox, color: Rgb<u8>) {
    let bb = match bb.clipped_to(img.width(), img.height()) {
        Some(bb) => bb,
        None => return,
    };
    let outer = Rect::at(bb.x1, bb.y1).of_size(bb.width() as u32, bb.height() as u32);
    imageproc::drawing::draw_hollow_rect_mut(img, outer, color);
    if bb.width() > 2 && bb.height() > 2 {
        let inner = Rect::at(bb.x1 + 1, bb.y1 + 1)
            .of_size(bb.width() as u32 - 2, bb.height() as u32 - 2);
        imageproc::drawing::draw_hollow_rect_mut(img, inner, color);
    }
}

pub fn draw_boxes(img: &mut RgbImage, boxes: &[BoundingBox]) {
    for bb in boxes {
        draw_bb_to_img(img, bb);
    }
}
