//! Per-tile change detection.
//!
//! Remembers the last transmitted content of every inner tile and answers
//! whether a freshly rendered tile differs from it. The cache knows nothing
//! about geometry; callers address tiles by a dense index.

// ── ChangeCache ──────────────────────────────────────────────────

/// Baseline store keyed by tile index.
///
/// Unknown indices are always reported as changed so a legitimate new tile
/// is never suppressed.
#[derive(Debug, Clone)]
pub struct ChangeCache {
    baselines: Vec<Option<Box<[u32]>>>,
}

impl ChangeCache {
    /// Create a cache for indices `0..len`.
    pub fn new(len: usize) -> Self {
        Self {
            baselines: vec![None; len],
        }
    }

    /// Returns `true` if `pixels` differs from the baseline at `index`.
    ///
    /// The first call for an index stores a baseline and returns `true`.
    /// On a mismatch the baseline is replaced with `pixels`.
    pub fn changed(&mut self, index: usize, pixels: &[u32]) -> bool {
        let Some(slot) = self.baselines.get_mut(index) else {
            return true;
        };

        match slot {
            Some(previous) if previous.len() == pixels.len() => {
                if previous[..] == pixels[..] {
                    false
                } else {
                    previous.copy_from_slice(pixels);
                    true
                }
            }
            // No baseline yet, or a baseline of a different length.
            _ => {
                *slot = Some(pixels.into());
                true
            }
        }
    }

    /// Forget every baseline, forcing the next call for each index to
    /// report a change.
    pub fn reset(&mut self) {
        self.baselines.fill(None);
    }

    /// Number of addressable indices.
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    /// Number of indices holding a baseline.
    pub fn baseline_count(&self) -> usize {
        self.baselines.iter().filter(|b| b.is_some()).count()
    }
}

// ── Tests ────────────────────────────────────────────────────────
