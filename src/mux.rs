//! Multiplexing of one frame set into the combined output buffer.

use crate::device::FrameSet;

/// Depth samples at or above this value encode to black.
pub const DEPTH_ENCODE_LIMIT: u16 = 2560;

/// Visual encoding of one depth sample as a packed RGB pixel.
///
/// Below the limit the sample is recoverable from the G and R channels
/// (`d = g * 10 + r`); at or beyond it the pixel is black.
#[inline]
pub fn encode_depth(depth: u16) -> [u8; 3] {
    if depth < DEPTH_ENCODE_LIMIT {
        let r = (depth % 10) as u8;
        let g = (depth / 10) as u8;
        [r, g, r]
    } else {
        [0, 0, 0]
    }
}

/// Fill `out` with the multiplexed frame set: raw color pixels in the upper
/// half, encoded depth in the lower half.
///
/// The color copy is truncated if the device delivers a frame larger than
/// the upper half. Depth samples beyond the lower half's capacity are
/// ignored; missing samples leave black pixels.
pub fn fill_buffer(out: &mut [u8], frames: &FrameSet) {
    let half = out.len() / 2;
    let (top, bottom) = out.split_at_mut(half);

    let n = top.len().min(frames.color.data.len());
    top[..n].copy_from_slice(&frames.color.data[..n]);

    for (pixel, &depth) in bottom.chunks_exact_mut(3).zip(frames.depth.data.iter()) {
        pixel.copy_from_slice(&encode_depth(depth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ColorFrame, DepthFrame};

    #[test]
    fn shallow_depth_encodes_mod_div_mod() {
        assert_eq!(encode_depth(0), [0, 0, 0]);
        assert_eq!(encode_depth(7), [7, 0, 7]);
        assert_eq!(encode_depth(1234), [4, 123, 4]);
        assert_eq!(encode_depth(2559), [9, 255, 9]);
    }

    #[test]
    fn depth_at_or_beyond_limit_is_black() {
        assert_eq!(encode_depth(2560), [0, 0, 0]);
        assert_eq!(encode_depth(u16::MAX), [0, 0, 0]);
    }

    #[test]
    fn encoding_is_invertible_below_limit() {
        for depth in [1u16, 99, 1000, 2559] {
            let [r, g, _] = encode_depth(depth);
            assert_eq!(u16::from(g) * 10 + u16::from(r), depth);
        }
    }

    fn frame_set(width: u32, height: u32) -> FrameSet {
        let pixels = (width * height) as usize;
        FrameSet {
            color: ColorFrame {
                width,
                height,
                data: (0..pixels * 3).map(|i| (i % 251) as u8).collect(),
            },
            depth: DepthFrame {
                width,
                height,
                data: (0..pixels).map(|i| (i * 13 % 4096) as u16).collect(),
            },
        }
    }

    #[test]
    fn buffer_halves_hold_color_and_encoded_depth() {
        let frames = frame_set(8, 4);
        let mut out = vec![0u8; 8 * 8 * 3];
        fill_buffer(&mut out, &frames);

        let half = out.len() / 2;
        assert_eq!(&out[..half], &frames.color.data[..]);
        for (i, &depth) in frames.depth.data.iter().enumerate() {
            assert_eq!(&out[half + i * 3..half + i * 3 + 3], &encode_depth(depth));
        }
    }

    #[test]
    fn excess_depth_samples_are_ignored() {
        let mut frames = frame_set(4, 4);
        // Simulate an unaligned depth stream larger than the color stream.
        frames.depth.data = vec![1; 4 * 4 * 10];
        let mut out = vec![0u8; 4 * 8 * 3];
        fill_buffer(&mut out, &frames);
        // Exactly the lower half was written, nothing beyond.
        assert_eq!(out.len(), 4 * 8 * 3);
        let half = out.len() / 2;
        assert!(out[half..].chunks(3).all(|p| p == [1, 0, 1]));
    }

    #[test]
    fn short_depth_frame_leaves_black_tail() {
        let mut frames = frame_set(4, 4);
        frames.depth.data.truncate(3);
        let mut out = vec![0u8; 4 * 8 * 3];
        fill_buffer(&mut out, &frames);
        let half = out.len() / 2;
        assert_eq!(&out[half + 9..], vec![0u8; half - 9].as_slice());
    }
}
