use once_cell::sync::Lazy;
use regex::Regex;

static V2_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^t[a-z0-9]{9}$").unwrap());
static ANY_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:t[a-z0-9]{9}|[a-f0-9]{10})$").unwrap());
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{1,64}$").unwrap());
static NAME_FETCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:xn--)?[a-z0-9]{1,64}$").unwrap());
static METADATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\x20-\x7F\n]+$").unwrap());
static A_RECORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s.?#].[^\s]*$").unwrap());

/// Strict v2 shape; the only shape allowed to mine or stake.
pub fn is_v2_address(address: &str) -> bool {
    V2_ADDRESS_RE.is_match(address)
}

/// v2 or legacy 10-hex shape.
pub fn is_valid_address(address: &str) -> bool {
    ANY_ADDRESS_RE.is_match(address)
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Lookup-only shape: also accepts punycoded names.
pub fn is_valid_name_fetch(name: &str) -> bool {
    NAME_FETCH_RE.is_match(name)
}

pub fn is_valid_metadata(metadata: &str) -> bool {
    metadata.len() <= 255 && METADATA_RE.is_match(metadata)
}

pub fn is_valid_a_record(a: &str) -> bool {
    a.len() <= 255 && A_RECORD_RE.is_match(a)
}

/// Strips one trailing `.<suffix>` from a name query, if present.
pub fn strip_name_suffix<'a>(name: &'a str, suffix: &str) -> &'a str {
    name.strip_suffix(suffix)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_shapes() {
        assert!(is_v2_address("t74tq2hsh6"));
        assert!(!is_v2_address("k74tq2hsh6"));
        assert!(!is_v2_address("t74tq2hsh"));
        assert!(!is_v2_address("t74tq2hsh66"));
        assert!(is_valid_address("t74tq2hsh6"));
        assert!(is_valid_address("a5dfb396d3"));
        assert!(!is_v2_address("a5dfb396d3"));
        assert!(!is_valid_address("a5dfb396dz"));
    }

    #[test]
    fn name_shapes() {
        assert!(is_valid_name("example"));
        assert!(is_valid_name("0"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Example"));
        assert!(!is_valid_name(&"a".repeat(65)));
        assert!(is_valid_name_fetch("xn--bcher-kva"));
        assert!(!is_valid_name("xn--bcher-kva"));
    }

    #[test]
    fn metadata_shape() {
        assert!(is_valid_metadata("hello=world\nreturn=t74tq2hsh6"));
        assert!(!is_valid_metadata(""));
        assert!(!is_valid_metadata("caf\u{e9}"));
        assert!(!is_valid_metadata(&"x".repeat(256)));
    }

    #[test]
    fn a_record_shape() {
        assert!(is_valid_a_record("example.com"));
        assert!(!is_valid_a_record(".example.com"));
        assert!(!is_valid_a_record("?query"));
        assert!(!is_valid_a_record("has space"));
        assert!(!is_valid_a_record("x"));
    }

    #[test]
    fn suffix_stripping() {
        assert_eq!(strip_name_suffix("example.tst", "tst"), "example");
        assert_eq!(strip_name_suffix("example", "tst"), "example");
        assert_eq!(strip_name_suffix("exampletst", "tst"), "exampletst");
    }
}
