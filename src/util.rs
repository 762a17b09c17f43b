pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

fn plural(n: u64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Human readable duration: "45 seconds", "2 minutes and 5 seconds"
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds} second{}", plural(seconds));
    }
    let minutes = seconds / 60;
    let remaining = seconds % 60;
    if remaining > 0 {
        format!(
            "{minutes} minute{} and {remaining} second{}",
            plural(minutes),
            plural(remaining)
        )
    } else {
        format!("{minutes} minute{}", plural(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[0.5]), Some(0.5));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(0), "0 second");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(45), "45 seconds");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(61), "1 minute and 1 second");
        assert_eq!(format_duration(185), "3 minutes and 5 seconds");
    }
}
