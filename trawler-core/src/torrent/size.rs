//! Human-readable byte size formatting

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count as a human-readable size string.
///
/// Uses base-1024 unit steps with two decimal places, capped at terabytes.
/// Zero or negative counts render as `"0B"`.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "0B".to_string();
    }

    let exponent = ((bytes.ilog2() / 10) as usize).min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{scaled:.2} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(-1024), "0B");
        assert_eq!(format_size(-1_048_576), "0B");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(format_size(1), "1.00 B");
        assert_eq!(format_size(512), "512.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
    }

    #[test]
    fn test_kilobytes() {
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_575), "1024.00 KB");
    }

    #[test]
    fn test_megabytes() {
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(1_073_741_823), "1024.00 MB");
    }

    #[test]
    fn test_gigabytes() {
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(1_610_612_736), "1.50 GB");
        assert_eq!(format_size(1_099_511_627_775), "1024.00 GB");
    }

    #[test]
    fn test_terabytes_and_cap() {
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
        assert_eq!(format_size(1_649_267_441_664), "1.50 TB");
        assert_eq!(format_size(1_125_899_906_842_624), "1024.00 TB");
        // Unit never climbs past terabytes, however large the input.
        assert_eq!(format_size(9_007_199_254_740_991), "8192.00 TB");
    }
}
