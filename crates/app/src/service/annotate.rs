//! Skeleton overlay drawing: bones as lines, joints as filled circles,
//! using clamped hand-rolled primitives over the raw BGR buffer.

use hand_core::{HandDetection, Landmark, HAND_CONNECTIONS};

use crate::service::frame::Frame;

// BGR colors
const BONE_COLOR: [u8; 3] = [0, 255, 0];
const JOINT_COLOR: [u8; 3] = [0, 0, 255];
const JOINT_RADIUS: i32 = 3;

/// Draw every detection's skeleton onto a copy of the frame and return it.
///
/// Landmark positions are normalized; they are denormalized against the
/// frame dimensions before drawing. Output dimensions equal the input's,
/// and identical inputs produce byte-identical output.
pub(crate) fn draw_detections(frame: &Frame, detections: &[HandDetection]) -> Frame {
    let mut annotated = frame.clone();
    for detection in detections {
        for &(start, end) in HAND_CONNECTIONS.iter() {
            let from = denormalize(&detection.landmarks[start], frame.width, frame.height);
            let to = denormalize(&detection.landmarks[end], frame.width, frame.height);
            draw_line(&mut annotated, from, to, BONE_COLOR);
        }
        for landmark in detection.landmarks.iter() {
            let center = denormalize(landmark, frame.width, frame.height);
            fill_circle(&mut annotated, center, JOINT_RADIUS, JOINT_COLOR);
        }
    }
    annotated
}

fn denormalize(landmark: &Landmark, width: u32, height: u32) -> (i32, i32) {
    (
        (landmark.x * width as f32).round() as i32,
        (landmark.y * height as f32).round() as i32,
    )
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = (y as usize * frame.width as usize + x as usize) * 3;
    frame.data[idx..idx + 3].copy_from_slice(&color);
}

/// Bresenham line between two pixel positions, clipped per pixel.
fn draw_line(frame: &mut Frame, (x0, y0): (i32, i32), (x1, y1): (i32, i32), color: [u8; 3]) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        put_pixel(frame, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_circle(frame: &mut Frame, (cx, cy): (i32, i32), radius: i32, color: [u8; 3]) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}
