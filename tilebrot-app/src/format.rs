const UNITS: [&str; 5] = ["k", "M", "G", "T", "P"];

/// Format `n` with binary-thousands units: `1536` → `"1.5k"`.
///
/// Whole values print without a decimal; anything else keeps one digit.
pub fn human_number(n: f64) -> String {
    let mut n = n;
    let mut unit = "";
    for u in UNITS {
        if n >= 1024.0 {
            n /= 1024.0;
            unit = u;
        }
    }
    if n.floor() == n {
        format!("{}{unit}", n as i64)
    } else {
        format!("{n:.1}{unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers_have_no_unit() {
        assert_eq!(human_number(0.0), "0");
        assert_eq!(human_number(1023.0), "1023");
        assert_eq!(human_number(2.5), "2.5");
    }

    #[test]
    fn binary_thousands() {
        assert_eq!(human_number(1024.0), "1k");
        assert_eq!(human_number(1536.0), "1.5k");
        assert_eq!(human_number(1024.0 * 1024.0), "1M");
        assert_eq!(human_number(3.0 * 1024.0 * 1024.0 * 1024.0), "3G");
    }

    #[test]
    fn petas_keep_growing() {
        assert_eq!(human_number(1024f64.powi(6)), "1024P");
    }
}
