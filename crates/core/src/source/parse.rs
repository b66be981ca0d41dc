//! Parsing helpers shared by the scrapers.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d.]+)\s*(TB|GB|MB|KB|B)").expect("valid size pattern"));

static BTIH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)btih:([a-f0-9]{40})").expect("valid btih pattern"));

/// Parse a free-text size ("1.5 GB", "500 MB") into GiB.
///
/// Units are binary (1 GB = 1024 MB). Anything unparseable is 0.0.
pub fn parse_size_gb(text: &str) -> f64 {
    let upper = text.to_uppercase();
    let Some(caps) = SIZE_PATTERN.captures(&upper) else {
        return 0.0;
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return 0.0;
    };

    let factor = match &caps[2] {
        "TB" => 1024.0,
        "GB" => 1.0,
        "MB" => 1.0 / 1024.0,
        "KB" => 1.0 / (1024.0 * 1024.0),
        "B" => 1.0 / (1024.0 * 1024.0 * 1024.0),
        _ => 0.0,
    };

    value * factor
}

/// Extract the lowercase hex info hash from a magnet URI.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    BTIH_PATTERN
        .captures(magnet)
        .map(|caps| caps[1].to_lowercase())
}

/// Parse a seed/peer count cell ("1,234" -> 1234). Garbage is 0.
pub fn parse_count(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Resolve a scraped href against the site's base URL.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_parse_size_gb() {
        assert!(approx(parse_size_gb("1.5 GB"), 1.5));
        assert!(approx(parse_size_gb("500 MB"), 0.4883));
        assert!(approx(parse_size_gb("2048 KB"), 0.001953));
        assert!(approx(parse_size_gb("2 TB"), 2048.0));
    }

    #[test]
    fn test_parse_size_gb_case_and_spacing() {
        assert!(approx(parse_size_gb("1.2gb"), 1.2));
        assert!(approx(parse_size_gb("  700.0 mb  "), 700.0 / 1024.0));
        assert!(approx(parse_size_gb("1.4 GB50"), 1.4));
    }

    #[test]
    fn test_parse_size_gb_malformed() {
        assert_eq!(parse_size_gb("unknown"), 0.0);
        assert_eq!(parse_size_gb(""), 0.0);
        assert_eq!(parse_size_gb("1.2.3 GB"), 0.0);
    }

    #[test]
    fn test_info_hash_from_magnet() {
        let hash = "c9e15763f722f23e98a29decdfae341b98d53056";
        let magnet = format!("magnet:?xt=urn:btih:{}&dn=Test", hash.to_uppercase());
        assert_eq!(info_hash_from_magnet(&magnet), Some(hash.to_string()));
    }

    #[test]
    fn test_info_hash_from_magnet_rejects_short_or_base32() {
        assert_eq!(info_hash_from_magnet("magnet:?xt=urn:btih:abc123"), None);
        assert_eq!(
            info_hash_from_magnet("magnet:?xt=urn:btih:MFRGGZDFMZTWQ2LKNNWG23TPOBYXE43U"),
            None
        );
        assert_eq!(info_hash_from_magnet("not a magnet"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 42 "), 42);
        assert_eq!(parse_count("1,234"), 1234);
        assert_eq!(parse_count("-"), 0);
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://1337x.to/", "/torrent/1/x/"),
            "https://1337x.to/torrent/1/x/"
        );
        assert_eq!(
            absolute_url("https://1337x.to", "torrent/1"),
            "https://1337x.to/torrent/1"
        );
        assert_eq!(
            absolute_url("https://1337x.to", "https://mirror.example/t/1"),
            "https://mirror.example/t/1"
        );
    }
}
