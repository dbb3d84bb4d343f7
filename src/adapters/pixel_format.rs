//! Pixel format conversion helpers for presentation adapters.

/// Unpacks ARGB words into RGBA bytes, setting alpha to 255.
///
/// # Panics
/// Panics if `dst.len()` is not `src.len() * 4`.
pub fn copy_argb_to_rgba(src: &[u32], dst: &mut [u8]) {
    assert_eq!(
        dst.len(),
        src.len() * 4,
        "dst length {} does not match expected {}",
        dst.len(),
        src.len() * 4
    );

    for (word, dst_pixel) in src.iter().zip(dst.chunks_exact_mut(4)) {
        dst_pixel[0] = (0xFF & (word >> 16)) as u8;
        dst_pixel[1] = (0xFF & (word >> 8)) as u8;
        dst_pixel[2] = (0xFF & word) as u8;
        dst_pixel[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_argb_to_rgba_known_values() {
        let src = vec![
            0x00FF_0000, // red
            0x0000_FF00, // green
            0x0000_00FF, // blue
            0x00FF_FFFF, // white
        ];
        let mut dst = vec![0; src.len() * 4];

        copy_argb_to_rgba(&src, &mut dst);

        assert_eq!(
            dst,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255
            ]
        );
    }

    #[test]
    fn test_copy_argb_to_rgba_empty_buffers() {
        let src: Vec<u32> = vec![];
        let mut dst: Vec<u8> = vec![];

        copy_argb_to_rgba(&src, &mut dst);

        assert!(dst.is_empty());
    }

    #[test]
    fn test_copy_argb_to_rgba_ignores_the_source_alpha_byte() {
        let src = vec![0xAB12_3456];
        let mut dst = vec![0; 4];

        copy_argb_to_rgba(&src, &mut dst);

        assert_eq!(dst, vec![0x12, 0x34, 0x56, 255]);
    }

    #[test]
    #[should_panic(expected = "does not match expected")]
    fn test_copy_argb_to_rgba_rejects_mismatched_buffers() {
        let src = vec![0; 2];
        let mut dst = vec![0; 4];

        copy_argb_to_rgba(&src, &mut dst);
    }
}
