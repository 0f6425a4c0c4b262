//! ROC Curve and AUC Analysis
//!
//! Computes receiver operating characteristic curves for the multiclass
//! classifier in a one-vs-rest fashion, together with micro- and
//! macro-averaged curves and their areas under the curve.

use serde::{Deserialize, Serialize};

/// A single ROC curve with its area under the curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rates, monotonically non-decreasing
    pub fpr: Vec<f64>,
    /// True positive rates, aligned with `fpr`
    pub tpr: Vec<f64>,
    /// Area under the curve (trapezoidal rule)
    pub auc: f64,
}

impl RocCurve {
    /// Compute a binary ROC curve from ground-truth flags and scores
    ///
    /// Thresholds are swept over the distinct score values in descending
    /// order. Degenerate inputs (no positives or no negatives) yield an
    /// empty curve with AUC 0.
    pub fn compute(truth: &[bool], scores: &[f64]) -> Self {
        assert_eq!(truth.len(), scores.len(), "truth/scores length mismatch");

        let positives = truth.iter().filter(|&&t| t).count();
        let negatives = truth.len() - positives;

        if positives == 0 || negatives == 0 {
            return Self {
                fpr: Vec::new(),
                tpr: Vec::new(),
                auc: 0.0,
            };
        }

        let mut pairs: Vec<(f64, bool)> = scores.iter().copied().zip(truth.iter().copied()).collect();
        pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];

        let mut tp = 0usize;
        let mut fp = 0usize;

        let mut i = 0;
        while i < pairs.len() {
            let threshold = pairs[i].0;

            // Consume all samples sharing this score before emitting a point
            while i < pairs.len() && pairs[i].0 == threshold {
                if pairs[i].1 {
                    tp += 1;
                } else {
                    fp += 1;
                }
                i += 1;
            }

            fpr.push(fp as f64 / negatives as f64);
            tpr.push(tp as f64 / positives as f64);
        }

        let auc = trapezoid(&fpr, &tpr);

        Self { fpr, tpr, auc }
    }
}

/// Multiclass ROC analysis: per-class, micro-average, and macro-average
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocAnalysis {
    /// One-vs-rest curve for each class
    pub per_class: Vec<RocCurve>,
    /// Micro-average curve over all (sample, class) pairs
    pub micro: RocCurve,
    /// Macro-average curve, interpolated over the union of per-class FPRs
    pub macro_avg: RocCurve,
}

impl RocAnalysis {
    /// Compute the full analysis from per-sample class probabilities
    ///
    /// `probabilities` holds one probability vector of length `num_classes`
    /// per sample; `ground_truth` holds the matching class indices.
    pub fn from_probabilities(
        probabilities: &[Vec<f64>],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        assert_eq!(
            probabilities.len(),
            ground_truth.len(),
            "probabilities/ground truth length mismatch"
        );

        let per_class: Vec<RocCurve> = (0..num_classes)
            .map(|class_idx| {
                let truth: Vec<bool> = ground_truth.iter().map(|&t| t == class_idx).collect();
                let scores: Vec<f64> = probabilities.iter().map(|p| p[class_idx]).collect();
                RocCurve::compute(&truth, &scores)
            })
            .collect();

        // Micro-average: flatten the one-hot truth and score matrices
        let mut micro_truth = Vec::with_capacity(ground_truth.len() * num_classes);
        let mut micro_scores = Vec::with_capacity(ground_truth.len() * num_classes);
        for (probs, &truth) in probabilities.iter().zip(ground_truth.iter()) {
            for class_idx in 0..num_classes {
                micro_truth.push(truth == class_idx);
                micro_scores.push(probs[class_idx]);
            }
        }
        let micro = RocCurve::compute(&micro_truth, &micro_scores);

        let macro_avg = Self::macro_average(&per_class);

        Self {
            per_class,
            micro,
            macro_avg,
        }
    }

    /// Macro-average: interpolate every class curve at the union of all
    /// observed false positive rates, then average the true positive rates.
    fn macro_average(per_class: &[RocCurve]) -> RocCurve {
        let valid: Vec<&RocCurve> = per_class.iter().filter(|c| !c.fpr.is_empty()).collect();

        if valid.is_empty() {
            return RocCurve {
                fpr: Vec::new(),
                tpr: Vec::new(),
                auc: 0.0,
            };
        }

        let mut all_fpr: Vec<f64> = valid.iter().flat_map(|c| c.fpr.iter().copied()).collect();
        all_fpr.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        all_fpr.dedup();

        let mut mean_tpr = vec![0.0f64; all_fpr.len()];
        for curve in &valid {
            let interpolated = interp(&all_fpr, &curve.fpr, &curve.tpr);
            for (mean, value) in mean_tpr.iter_mut().zip(interpolated.iter()) {
                *mean += value;
            }
        }
        for mean in mean_tpr.iter_mut() {
            *mean /= valid.len() as f64;
        }

        let auc = trapezoid(&all_fpr, &mean_tpr);

        RocCurve {
            fpr: all_fpr,
            tpr: mean_tpr,
            auc,
        }
    }
}

/// Micro-average ROC AUC over all (sample, class) pairs
///
/// Used as the per-epoch AUC metric during training, where the full
/// per-class analysis is not needed.
pub fn micro_auc(probabilities: &[Vec<f64>], ground_truth: &[usize], num_classes: usize) -> f64 {
    let mut truth = Vec::with_capacity(ground_truth.len() * num_classes);
    let mut scores = Vec::with_capacity(ground_truth.len() * num_classes);
    for (probs, &label) in probabilities.iter().zip(ground_truth.iter()) {
        for class_idx in 0..num_classes {
            truth.push(label == class_idx);
            scores.push(probs[class_idx]);
        }
    }
    RocCurve::compute(&truth, &scores).auc
}

/// Area via the trapezoidal rule over (x, y) points
fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    let mut area = 0.0;
    for i in 1..x.len() {
        area += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
    }
    area
}

/// Piecewise-linear interpolation of (`xp`, `fp`) sampled at `x`
///
/// `xp` must be sorted ascending. Values outside the range clamp to the
/// boundary values. Ties in `xp` resolve to the rightmost duplicate, so a
/// curve that jumps at an x value evaluates to its post-jump height there.
fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| {
            if xp.is_empty() {
                return 0.0;
            }
            if xi < xp[0] {
                return fp[0];
            }
            if xi >= xp[xp.len() - 1] {
                return fp[fp.len() - 1];
            }

            let idx = xp.partition_point(|&v| v <= xi);
            let (x0, x1) = (xp[idx - 1], xp[idx]);
            let (y0, y1) = (fp[idx - 1], fp[idx]);

            if (x1 - x0).abs() < f64::EPSILON {
                y0
            } else {
                y0 + (y1 - y0) * (xi - x0) / (x1 - x0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let truth = vec![false, false, true, true];
        let scores = vec![0.1, 0.2, 0.8, 0.9];

        let curve = RocCurve::compute(&truth, &scores);
        assert!((curve.auc - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_scores() {
        let truth = vec![true, true, false, false];
        let scores = vec![0.1, 0.2, 0.8, 0.9];

        let curve = RocCurve::compute(&truth, &scores);
        assert!(curve.auc.abs() < 1e-9);
    }

    #[test]
    fn test_interleaved_scores() {
        // Positives at ranks 1 and 3 of 4 give an AUC of 0.75
        let truth = vec![true, false, true, false];
        let scores = vec![0.9, 0.8, 0.7, 0.6];

        let curve = RocCurve::compute(&truth, &scores);
        assert!((curve.auc - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_single_class() {
        let truth = vec![true, true, true];
        let scores = vec![0.1, 0.5, 0.9];

        let curve = RocCurve::compute(&truth, &scores);
        assert!(curve.fpr.is_empty());
        assert_eq!(curve.auc, 0.0);
    }

    #[test]
    fn test_curve_endpoints() {
        let truth = vec![false, true, false, true];
        let scores = vec![0.3, 0.6, 0.2, 0.8];

        let curve = RocCurve::compute(&truth, &scores);

        assert_eq!(curve.fpr[0], 0.0);
        assert_eq!(curve.tpr[0], 0.0);
        assert!((curve.fpr.last().unwrap() - 1.0).abs() < 1e-9);
        assert!((curve.tpr.last().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_interp_matches_linear() {
        let xp = vec![0.0, 1.0];
        let fp = vec![0.0, 10.0];
        let result = interp(&[0.25, 0.5, 2.0], &xp, &fp);

        assert!((result[0] - 2.5).abs() < 1e-9);
        assert!((result[1] - 5.0).abs() < 1e-9);
        assert!((result[2] - 10.0).abs() < 1e-9); // clamped
    }

    #[test]
    fn test_interp_jump_resolves_to_post_jump() {
        // A curve that jumps to 1 at x = 0 evaluates to 1 there
        let xp = vec![0.0, 0.0, 1.0];
        let fp = vec![0.0, 1.0, 1.0];
        let result = interp(&[0.0, 0.5], &xp, &fp);

        assert!((result[0] - 1.0).abs() < 1e-9);
        assert!((result[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiclass_analysis() {
        // Three samples, three classes, near-perfect probabilities
        let probabilities = vec![
            vec![0.8, 0.1, 0.1],
            vec![0.1, 0.8, 0.1],
            vec![0.1, 0.1, 0.8],
            vec![0.7, 0.2, 0.1],
            vec![0.2, 0.7, 0.1],
            vec![0.1, 0.2, 0.7],
        ];
        let ground_truth = vec![0, 1, 2, 0, 1, 2];

        let analysis = RocAnalysis::from_probabilities(&probabilities, &ground_truth, 3);

        assert_eq!(analysis.per_class.len(), 3);
        for curve in &analysis.per_class {
            assert!((curve.auc - 1.0).abs() < 1e-9);
        }
        assert!((analysis.micro.auc - 1.0).abs() < 1e-9);
        assert!((analysis.macro_avg.auc - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_micro_auc_random_guess() {
        // Uniform probabilities carry no information: AUC = 0.5
        let probabilities = vec![vec![0.5, 0.5]; 10];
        let ground_truth: Vec<usize> = (0..10).map(|i| i % 2).collect();

        let auc = micro_auc(&probabilities, &ground_truth, 2);
        assert!((auc - 0.5).abs() < 1e-9);
    }
}
