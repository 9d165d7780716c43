//! Median of a fixed-capacity sample batch.

use heapless::Vec;

/// Median of `samples`.
///
/// Odd counts return the middle sample of a sorted copy. Even counts return
/// the mean of the two middle samples, rounded down. An empty batch yields 0.
/// The input is left untouched and nothing is allocated.
pub fn median<const N: usize>(samples: &Vec<u32, N>) -> u32 {
    if samples.is_empty() {
        return 0;
    }

    let mut sorted = samples.clone();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        // Halve before adding so two large samples cannot overflow.
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        lo / 2 + hi / 2 + (lo % 2 + hi % 2) / 2
    }
}
