//! Small numeric helpers used by the figure routines.

pub fn radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// `count` evenly spaced samples over `[start, end]`, both ends included.
pub fn linspace(start: f32, end: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f32;
            (0..count)
                .map(|idx| {
                    if idx == count - 1 {
                        end
                    } else {
                        start + step * idx as f32
                    }
                })
                .collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be increasing. Values outside the sample range clamp to the end
/// values; a NaN `x` yields NaN.
pub fn interp(x: f32, xp: &[f32], fp: &[f32]) -> f32 {
    let len = xp.len().min(fp.len());
    if len == 0 {
        return 0.0;
    }
    if x.is_nan() {
        return f32::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[len - 1] {
        return fp[len - 1];
    }
    let upper = xp[..len].partition_point(|value| *value <= x).min(len - 1);
    let lower = upper - 1;
    let span = xp[upper] - xp[lower];
    if span <= 0.0 {
        return fp[lower];
    }
    let t = (x - xp[lower]) / span;
    fp[lower] + t * (fp[upper] - fp[lower])
}

pub fn interp_all(xs: &[f32], xp: &[f32], fp: &[f32]) -> Vec<f32> {
    xs.iter().map(|x| interp(*x, xp, fp)).collect()
}

/// Points along a circular arc from `start` to `end` (radians).
pub fn arc(center: (f32, f32), radius: f32, start: f32, end: f32, count: usize) -> (Vec<f32>, Vec<f32>) {
    linspace(start, end, count)
        .into_iter()
        .map(|theta| (center.0 + radius * theta.cos(), center.1 + radius * theta.sin()))
        .unzip()
}

pub fn circle(center: (f32, f32), radius: f32, count: usize) -> (Vec<f32>, Vec<f32>) {
    arc(center, radius, 0.0, std::f32::consts::TAU, count)
}

/// Formats an integer with comma thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_ends() {
        let values = linspace(0.0, 45.0, 100);
        assert_eq!(values.len(), 100);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[99], 45.0);
        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn interp_matches_linear_segments() {
        let xp = [0.0, 5.0, 10.0, 20.0];
        let fp = [0.0, 10.0, 30.0, 60.0];
        assert_eq!(interp(2.5, &xp, &fp), 5.0);
        assert_eq!(interp(15.0, &xp, &fp), 45.0);
        assert_eq!(interp(10.0, &xp, &fp), 30.0);
    }

    #[test]
    fn interp_clamps_outside_range() {
        let xp = [0.0, 40.0];
        let fp = [0.0, 250.0];
        assert_eq!(interp(-3.0, &xp, &fp), 0.0);
        assert_eq!(interp(45.0, &xp, &fp), 250.0);
        assert_eq!(interp(1.0, &[], &[]), 0.0);
    }

    #[test]
    fn interp_nan_propagates() {
        let xp = [0.0, 5.0, 10.0];
        let fp = [0.0, 10.0, 30.0];
        assert!(interp(f32::NAN, &xp, &fp).is_nan());
        let values = interp_all(&[f32::NAN, 5.0], &xp, &fp);
        assert!(values[0].is_nan());
        assert_eq!(values[1], 10.0);
    }

    #[test]
    fn arc_runs_from_start_to_end() {
        let (xs, ys) = arc((0.0, 0.0), 2.0, 0.0, std::f32::consts::FRAC_PI_2, 30);
        assert_eq!(xs.len(), 30);
        assert!((xs[0] - 2.0).abs() < 1e-6 && ys[0].abs() < 1e-6);
        assert!(xs[29].abs() < 1e-5 && (ys[29] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(10000), "10,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
