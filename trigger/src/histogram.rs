//! Fixed width angular histograms for direction clustering.
use std::num::NonZeroU32;

/// A half open range of angles, in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngularDomain {
    pub lower: u32,
    pub upper: u32,
}

pub const ZENITH_DOMAIN: AngularDomain = AngularDomain {
    lower: 0,
    upper: 180,
};

pub const AZIMUTH_DOMAIN: AngularDomain = AngularDomain {
    lower: 0,
    upper: 360,
};

/// Bin edges covering `domain` in steps of `width`.
///
/// Each bin is `[low, high)`. The bin ending exactly on `domain.upper` is
/// widened by one degree so that the closed upper boundary (180° or 360°)
/// falls into it rather than into a bin of its own.
pub(crate) fn make_bin_edges(domain: AngularDomain, width: NonZeroU32) -> Vec<(u32, u32)> {
    let width = width.get();
    (domain.lower..domain.upper)
        .step_by(width as usize)
        .map(|low| {
            let high = low.saturating_add(width);
            if high == domain.upper {
                (low, high + 1)
            } else {
                (low, high)
            }
        })
        .collect()
}

/// Bins `values` (in degrees) over `domain` and returns the highest bin count.
/// Values outside every bin are ignored.
pub fn max_bin_occupancy(values: &[f64], domain: AngularDomain, width: NonZeroU32) -> usize {
    make_bin_edges(domain, width)
        .into_iter()
        .map(|(low, high)| {
            values
                .iter()
                .filter(|&&value| value >= low as f64 && value < high as f64)
                .count()
        })
        .max()
        .unwrap_or_default()
}
