//! Frame decomposition into horizontal bands and reassembly.

use log::warn;

use crate::shading::BandLayout;

/// Splits `height` rows across `workers` bands, top to bottom.
///
/// The first `height % workers` bands get one extra row.
pub fn band_layouts(width: u32, height: u32, workers: usize) -> Vec<BandLayout> {
    if workers == 0 {
        return Vec::new();
    }
    let count = workers as u32;
    let base = height / count;
    let extra = height % count;

    let mut first_row = 0;
    (0..count)
        .map(|i| {
            let rows = base + u32::from(i < extra);
            let layout = BandLayout {
                width,
                first_row,
                rows,
                frame_height: height,
            };
            first_row += rows;
            layout
        })
        .collect()
}

/// Concatenates band slices, worker 0 first.
///
/// A slice of the wrong length is cut or padded with transparent black so
/// later bands stay on their rows.
pub fn assemble_bands(layouts: &[BandLayout], slices: Vec<Vec<u8>>) -> Vec<u8> {
    let total = layouts.iter().map(BandLayout::byte_len).sum();
    let mut frame = Vec::with_capacity(total);
    for (index, (layout, mut slice)) in layouts.iter().zip(slices).enumerate() {
        let expected = layout.byte_len();
        if slice.len() != expected {
            warn!(
                "Band {} returned {} bytes, expected {}",
                index,
                slice.len(),
                expected
            );
            slice.resize(expected, 0);
        }
        frame.extend_from_slice(&slice);
    }
    frame
}
