//! Small descriptive statistics shared by the aggregations.

use crate::models::TrendFit;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Sample standard deviation over mean. Undefined for a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m == 0.0 {
        return None;
    }
    Some(sample_std_dev(values)? / m)
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Ordinary least-squares fit of `y = slope * x + intercept`.
///
/// Needs at least two points with distinct `x`. A perfectly flat `y`
/// series is a perfect fit (`r_squared = 1`).
pub fn linear_regression(points: &[(f64, f64)]) -> Option<TrendFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Some(TrendFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Pearson correlation coefficient. Undefined when either side is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[10.0, 12.0, 14.0]), Some(12.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[10.0, 12.0, 14.0]), Some(2.0));
        assert_eq!(sample_std_dev(&[3.0]), None);
        assert_eq!(min_max(&[3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
    }

    #[test]
    fn test_coefficient_of_variation() {
        let cv = coefficient_of_variation(&[800.0, 1000.0, 1200.0]).unwrap();
        assert!(close(cv, 0.2));
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_linear_regression() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (2000.0 + i as f64, 10.0 + 0.05 * i as f64)).collect();
        let fit = linear_regression(&points).unwrap();

        assert!(close(fit.slope, 0.05));
        assert!(close(fit.r_squared, 1.0));
        assert!(close(fit.slope_per_decade(), 0.5));
        assert!(close(fit.slope * 2000.0 + fit.intercept, 10.0));

        assert!(linear_regression(&[(2000.0, 1.0), (2000.0, 2.0)]).is_none());
        let flat = linear_regression(&[(1.0, 5.0), (2.0, 5.0)]).unwrap();
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.r_squared, 1.0);
    }

    #[test]
    fn test_pearson() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!(close(pearson(&pairs).unwrap(), 1.0));

        let inverse = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert!(close(pearson(&inverse).unwrap(), -1.0));

        assert_eq!(pearson(&[(1.0, 1.0), (2.0, 1.0)]), None);
    }
}
