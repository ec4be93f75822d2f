//! Framebuffer contract tests: buffer layout, clears, lane-masked writes
//! and the strict less-than depth test.

use softraster::rendering::simd::{F32x4, I32x4};
use softraster::{Framebuffer, PixelTarget};

#[test]
fn construction_sets_buffer_sizes() {
    let fb = Framebuffer::new(800, 600).unwrap();
    assert_eq!(fb.width(), 800);
    assert_eq!(fb.height(), 600);
    assert_eq!(fb.color_buffer().len(), 800 * 600 * 3);
    assert_eq!(fb.depth_buffer().len(), 800 * 600);
}

#[test]
fn zero_dimensions_are_rejected() {
    assert!(Framebuffer::new(0, 100).is_err());
    assert!(Framebuffer::new(100, 0).is_err());
    assert!(Framebuffer::new(0, 0).is_err());
    assert!(Framebuffer::new(1, 1).is_ok());
}

#[test]
fn clear_resets_every_color_byte_and_depth_value() {
    let mut fb = Framebuffer::new(33, 7).unwrap();

    let x = I32x4::new(0, 1, 2, 3);
    let y = I32x4::splat(2);
    fb.set_pixel(x, y, I32x4::splat(0x00FFFFFFu32 as i32), 0xF);
    fb.set_depth(x, y, F32x4::splat(0.5), 0xF);

    fb.clear();
    fb.clear_depth();

    assert!(fb.color_buffer().iter().all(|&b| b == 0));
    assert!(fb.depth_buffer().iter().all(|&d| d == 1.0));
}

#[test]
fn set_pixel_writes_rgb_of_masked_lanes_only() {
    let mut fb = Framebuffer::new(8, 8).unwrap();

    let x = I32x4::new(0, 1, 2, 3);
    let y = I32x4::splat(0);
    // lane color packs R low, G mid, B high
    let color = I32x4::new(0x000000FF, 0x0000FF00, 0x00FF0000, 0x00102030);

    fb.set_pixel(x, y, color, 0b1011);

    assert_eq!(&fb.color_buffer()[0..3], &[0xFF, 0x00, 0x00]); // lane 0: red
    assert_eq!(&fb.color_buffer()[3..6], &[0x00, 0xFF, 0x00]); // lane 1: green
    assert_eq!(&fb.color_buffer()[6..9], &[0x00, 0x00, 0x00]); // lane 2 masked out
    assert_eq!(&fb.color_buffer()[9..12], &[0x30, 0x20, 0x10]); // lane 3
}

#[test]
fn set_depth_full_mask_stores_contiguous_quad() {
    let mut fb = Framebuffer::new(16, 4).unwrap();

    let x = I32x4::new(4, 5, 6, 7);
    let y = I32x4::splat(1);
    fb.set_depth(x, y, F32x4::new(0.1, 0.2, 0.3, 0.4), 0xF);

    let base = 16 + 4;
    assert_eq!(&fb.depth_buffer()[base..base + 4], &[0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn set_depth_partial_mask_leaves_other_lanes() {
    let mut fb = Framebuffer::new(16, 4).unwrap();

    let x = I32x4::new(0, 1, 2, 3);
    let y = I32x4::splat(0);
    fb.set_depth(x, y, F32x4::splat(0.25), 0b0110);

    assert_eq!(fb.depth_buffer()[0], 1.0);
    assert_eq!(fb.depth_buffer()[1], 0.25);
    assert_eq!(fb.depth_buffer()[2], 0.25);
    assert_eq!(fb.depth_buffer()[3], 1.0);
}

#[test]
fn depth_test_is_strictly_less_than() {
    let mut fb = Framebuffer::new(8, 2).unwrap();

    let x = I32x4::new(0, 1, 2, 3);
    let y = I32x4::splat(1);

    // against the 1.0 clear value
    let mask = fb.depth_test(x, y, F32x4::new(0.2, 1.0, 0.999, 1.5));
    assert_eq!(mask, 0b0101);

    fb.set_depth(x, y, F32x4::new(0.5, 0.5, 0.5, 0.5), 0xF);
    let mask = fb.depth_test(x, y, F32x4::new(0.5, 0.4999, 0.6, 0.0));
    assert_eq!(mask, 0b1010);
}

#[test]
fn depth_test_handles_row_edge_quads() {
    let fb = Framebuffer::new(6, 2).unwrap();

    // lanes 4 and 5 are in-row, 6 and 7 fall off the framebuffer
    let x = I32x4::new(4, 5, 6, 7);
    let y = I32x4::splat(0);
    let mask = fb.depth_test(x, y, F32x4::splat(0.5));
    assert_eq!(mask, 0b0011);
}
