use statrs::distribution::{ContinuousCDF, StudentsT};

use super::describe::{mean, sample_variance};

/// Result of a two-sided two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

impl TTest {
    const UNDEFINED: TTest = TTest {
        statistic: f64::NAN,
        p_value: f64::NAN,
        df: f64::NAN,
    };

    pub fn rejects_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Welch's unequal-variance t-test of `a` against `b`.
///
/// Degrees of freedom follow Welch-Satterthwaite. Fewer than two observations
/// on either side, or zero variance on both, leave every field NaN.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTest {
    if a.len() < 2 || b.len() < 2 {
        return TTest::UNDEFINED;
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (sample_variance(a) / na, sample_variance(b) / nb);
    let se2 = va + vb;
    if se2 <= 0.0 || !se2.is_finite() {
        return TTest::UNDEFINED;
    }

    let statistic = (mean(a) - mean(b)) / se2.sqrt();
    let df = se2.powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(statistic.abs())).min(1.0),
        Err(_) => f64::NAN,
    };

    TTest {
        statistic,
        p_value,
        df,
    }
}

/// Pearson correlation over the pairs where both sides are present.
/// NaN with fewer than two pairs or a constant side.
pub fn pearson<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs
        .into_iter()
        .filter_map(|(x, y)| Some((x?, y?)))
        .unzip();
    if xs.len() < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(&xs), mean(&ys));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}
