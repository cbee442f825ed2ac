// SPDX-License-Identifier: Apache-2.0

use crate::error::EngineError;

/// Classic dynamic-programming DTW with absolute-difference local cost and an
/// optional Sakoe-Chiba band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dtw {
    band: Option<usize>,
}

/// Optimal warping path from `(0, 0)` to `(n - 1, m - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub distance: f64,
    pub path: Vec<(usize, usize)>,
}

/// Unconstrained DTW distance.
pub fn dtw(a: &[f64], b: &[f64]) -> Result<f64, EngineError> {
    Dtw::default().distance(a, b)
}

fn check_inputs(a: &[f64], b: &[f64]) -> Result<(), EngineError> {
    if a.is_empty() || b.is_empty() {
        return Err(EngineError::invalid("dtw inputs must be non-empty"));
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(EngineError::invalid("dtw inputs must be finite"));
    }
    Ok(())
}

impl Dtw {
    #[must_use]
    pub const fn new(band: Option<usize>) -> Self {
        Self { band }
    }

    #[must_use]
    pub const fn band(self) -> Option<usize> {
        self.band
    }

    /// Widened to `|n - m|` so the end cell stays reachable.
    fn radius(self, n: usize, m: usize) -> usize {
        match self.band {
            Some(r) => r.max(n.abs_diff(m)),
            None => usize::MAX,
        }
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, EngineError> {
        check_inputs(a, b)?;
        let (n, m) = (a.len(), b.len());
        let r = self.radius(n, m);
        let mut prev = vec![f64::INFINITY; m];
        let mut cur = vec![f64::INFINITY; m];
        for i in 0..n {
            for j in 0..m {
                if i.abs_diff(j) > r {
                    cur[j] = f64::INFINITY;
                    continue;
                }
                let cost = (a[i] - b[j]).abs();
                cur[j] = if i == 0 && j == 0 {
                    cost
                } else {
                    let mut best = f64::INFINITY;
                    if i > 0 && j > 0 {
                        best = best.min(prev[j - 1]);
                    }
                    if i > 0 {
                        best = best.min(prev[j]);
                    }
                    if j > 0 {
                        best = best.min(cur[j - 1]);
                    }
                    cost + best
                };
            }
            std::mem::swap(&mut prev, &mut cur);
        }
        Ok(prev[m - 1])
    }

    /// Full accumulated matrix plus backtracking. Predecessor ties prefer the
    /// diagonal, then advancing `a`, then advancing `b`.
    pub fn alignment(&self, a: &[f64], b: &[f64]) -> Result<Alignment, EngineError> {
        check_inputs(a, b)?;
        let (n, m) = (a.len(), b.len());
        let r = self.radius(n, m);
        let mut acc = vec![f64::INFINITY; n * m];
        let at = |i: usize, j: usize| i * m + j;
        for i in 0..n {
            for j in 0..m {
                if i.abs_diff(j) > r {
                    continue;
                }
                let cost = (a[i] - b[j]).abs();
                acc[at(i, j)] = if i == 0 && j == 0 {
                    cost
                } else {
                    let diag = if i > 0 && j > 0 { acc[at(i - 1, j - 1)] } else { f64::INFINITY };
                    let up = if i > 0 { acc[at(i - 1, j)] } else { f64::INFINITY };
                    let left = if j > 0 { acc[at(i, j - 1)] } else { f64::INFINITY };
                    cost + diag.min(up).min(left)
                };
            }
        }

        let mut path = Vec::with_capacity(n + m);
        let (mut i, mut j) = (n - 1, m - 1);
        path.push((i, j));
        while i > 0 || j > 0 {
            let diag = if i > 0 && j > 0 { acc[at(i - 1, j - 1)] } else { f64::INFINITY };
            let up = if i > 0 { acc[at(i - 1, j)] } else { f64::INFINITY };
            let left = if j > 0 { acc[at(i, j - 1)] } else { f64::INFINITY };
            if i > 0 && j > 0 && diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if i > 0 && (j == 0 || up <= left) {
                i -= 1;
            } else {
                j -= 1;
            }
            path.push((i, j));
        }
        path.reverse();
        Ok(Alignment {
            distance: acc[at(n - 1, m - 1)],
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{dtw, Dtw};
    use crate::error::EngineError;

    #[test]
    fn known_distances() {
        assert_eq!(dtw(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).expect("dtw"), 0.0);
        assert_eq!(dtw(&[0.0, 0.0, 1.0], &[0.0, 1.0]).expect("dtw"), 0.0);
        assert_eq!(dtw(&[1.0], &[4.0, 5.0]).expect("dtw"), 7.0);
        assert_eq!(dtw(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]).expect("dtw"), 2.0);
    }

    #[test]
    fn empty_and_non_finite_inputs_fail() {
        assert!(matches!(dtw(&[], &[1.0]), Err(EngineError::InvalidInput(_))));
        assert!(matches!(dtw(&[1.0], &[]), Err(EngineError::InvalidInput(_))));
        assert!(matches!(dtw(&[f64::NAN], &[1.0]), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn band_never_lowers_the_distance() {
        let a = [0.0, 5.0, 0.0, 0.0, 0.0, 0.0];
        let b = [0.0, 0.0, 0.0, 0.0, 5.0, 0.0];
        let free = dtw(&a, &b).expect("dtw");
        let banded = Dtw::new(Some(1)).distance(&a, &b).expect("dtw");
        assert_eq!(free, 0.0);
        assert!(banded > free);
        let zero = Dtw::new(Some(0)).distance(&a, &b).expect("dtw");
        assert_eq!(zero, 10.0);
    }

    #[test]
    fn band_widens_for_length_mismatch() {
        let d = Dtw::new(Some(0)).distance(&[1.0, 1.0, 1.0, 1.0], &[1.0]).expect("dtw");
        assert_eq!(d, 0.0);
    }

    #[test]
    fn alignment_prefers_diagonal_on_ties() {
        let al = Dtw::default().alignment(&[1.0, 1.0], &[1.0, 1.0]).expect("align");
        assert_eq!(al.distance, 0.0);
        assert_eq!(al.path, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn alignment_prefers_advancing_a_over_b() {
        let al = Dtw::default()
            .alignment(&[0.0, 1.0, 1.0], &[0.0, 1.0])
            .expect("align");
        assert_eq!(al.path, vec![(0, 0), (1, 1), (2, 1)]);
        let al = Dtw::default()
            .alignment(&[0.0, 1.0], &[0.0, 1.0, 1.0])
            .expect("align");
        assert_eq!(al.path, vec![(0, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn alignment_distance_matches_rolling_distance() {
        let a = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        let b = [2.0, 6.0, 5.0, 3.0];
        for band in [None, Some(0), Some(1), Some(3)] {
            let engine = Dtw::new(band);
            assert_eq!(
                engine.alignment(&a, &b).expect("align").distance,
                engine.distance(&a, &b).expect("dtw")
            );
        }
    }
}
