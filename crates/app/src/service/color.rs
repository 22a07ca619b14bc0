//! BGR ⇄ RGB channel order adapter.
//!
//! Convention is fixed: frames are BGR everywhere inside the service; the
//! detector alone receives an RGB copy. Each pipeline pass swaps exactly
//! once per direction, so there is no conditional re-swap on the encode
//! path.

use crate::service::frame::Frame;

/// Swap the first and third channel of every pixel in place. The swap is
/// its own inverse, so the same routine serves both directions.
pub(crate) fn swap_channel_order(data: &mut [u8]) {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

/// Copy of the frame's pixels reordered to RGB for the detector.
pub(crate) fn bgr_to_rgb(frame: &Frame) -> Vec<u8> {
    let mut rgb = frame.data.clone();
    swap_channel_order(&mut rgb);
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::solid_frame;

    #[test]
    fn double_swap_is_identity() {
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
        let original = data.clone();
        swap_channel_order(&mut data);
        assert_ne!(data, original);
        swap_channel_order(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn bgr_to_rgb_reverses_each_pixel() {
        let frame = solid_frame(2, 1, [10, 20, 30]);
        let rgb = bgr_to_rgb(&frame);
        assert_eq!(rgb, vec![30, 20, 10, 30, 20, 10]);
        // the source frame is untouched
        assert_eq!(frame.data, vec![10, 20, 30, 10, 20, 30]);
    }
}
