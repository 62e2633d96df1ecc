//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `source` into `target` along its dominant axis, preserving aspect ratio.
///
/// The orientation of the *source* decides which target dimension is binding:
///
/// - portrait (`w < h`): height is pinned to the target height, width derived
/// - landscape (`w > h`): width is pinned to the target width, height derived
/// - square: treated as landscape, width pinned
///
/// The other target dimension is ignored, so the result may overflow it.
/// Derived values are rounded half away from zero and never drop below 1.
///
/// # Examples
/// ```
/// # use processimage::imaging::proportional_fit;
/// // Portrait: height pinned
/// assert_eq!(proportional_fit((100, 200), (80, 160)), (80, 160));
///
/// // Landscape: width pinned
/// assert_eq!(proportional_fit((200, 100), (160, 80)), (160, 80));
/// ```
pub fn proportional_fit(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w < src_h {
        let w = derive(src_w, src_h, tgt_h);
        (w, tgt_h)
    } else {
        let h = derive(src_h, src_w, tgt_w);
        (tgt_w, h)
    }
}

/// `round(numerator / denominator * pinned)`, at least 1.
fn derive(numerator: u32, denominator: u32, pinned: u32) -> u32 {
    if denominator == 0 {
        return pinned.max(1);
    }
    let value = (numerator as f64 / denominator as f64 * pinned as f64).round();
    (value as u32).max(1)
}
