use image::{ImageBuffer, Pixel};

/// For each destination index, the source indices it covers and the share of
/// the destination pixel each one contributes.
fn axis_weights(src: u32, dst: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;

    (0..dst)
        .map(|i| {
            let start = i as f64 * scale;
            let end = start + scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);

            (first..last)
                .filter_map(|j| {
                    let overlap = end.min(j as f64 + 1.0) - start.max(j as f64);
                    (overlap > 1e-9).then_some((j as usize, overlap / scale))
                })
                .collect()
        })
        .collect()
}

/// Resample by pixel-area averaging: every destination pixel is the
/// coverage-weighted mean of the source pixels under its footprint.
///
/// Same-size input is returned untouched.
pub fn resize_area<P>(img: &ImageBuffer<P, Vec<u8>>, width: u32, height: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (width, height) {
        return img.clone();
    }

    let mut out = ImageBuffer::<P, Vec<u8>>::new(width, height);
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return out;
    }

    let channels = P::CHANNEL_COUNT as usize;
    let x_weights = axis_weights(src_w, width);
    let y_weights = axis_weights(src_h, height);

    // Horizontal pass: src_h rows of `width` pixels.
    let src = img.as_raw();
    let src_stride = src_w as usize * channels;
    let dst_stride = width as usize * channels;
    let mut rows = vec![0f64; src_h as usize * dst_stride];

    for (src_row, row) in src.chunks_exact(src_stride).zip(rows.chunks_exact_mut(dst_stride)) {
        for (x, weights) in x_weights.iter().enumerate() {
            let px = &mut row[x * channels..(x + 1) * channels];
            for &(sx, w) in weights {
                for (c, value) in px.iter_mut().enumerate() {
                    *value += src_row[sx * channels + c] as f64 * w;
                }
            }
        }
    }

    // Vertical pass straight into the output buffer.
    let dst: &mut [u8] = &mut out;
    let mut acc = vec![0f64; dst_stride];
    for (out_row, weights) in dst.chunks_exact_mut(dst_stride).zip(&y_weights) {
        acc.iter_mut().for_each(|v| *v = 0.0);
        for &(sy, w) in weights {
            let row = &rows[sy * dst_stride..(sy + 1) * dst_stride];
            for (a, v) in acc.iter_mut().zip(row) {
                *a += v * w;
            }
        }
        for (o, a) in out_row.iter_mut().zip(&acc) {
            *o = a.round_ties_even().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
