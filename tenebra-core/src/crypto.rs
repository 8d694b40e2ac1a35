use sha2::{Digest, Sha256};

/// Hex digest of the concatenation of all parts.
pub fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

pub fn sha256_str(s: &str) -> String {
    sha256_hex(&[s.as_bytes()])
}

fn double_sha256(s: &str) -> String {
    sha256_str(&sha256_str(s))
}

/// Maps a byte onto `[0-9a-z]` in buckets of seven, overflowing to 'e'.
/// The exact bucket boundaries are load-bearing: addresses derived with any
/// other mapping will not match existing wallets.
pub fn hex_to_base36(input: u8) -> char {
    let mut i: u16 = 6;
    while i <= 251 {
        if u16::from(input) <= i {
            if i <= 69 {
                return (b'0' + ((i - 6) / 7) as u8) as char;
            }
            return (b'a' + ((i - 76) / 7) as u8) as char;
        }
        i += 7;
    }
    'e'
}

/// Derives the 10-character v2 address for a private key.
///
/// Walks a chain of double-sha256 digests, harvesting one two-hex-digit slot
/// per round, then consumes the nine slots in an order dictated by further
/// digest bytes. Deterministic for any given key.
pub fn make_v2_address(private_key: &str, prefix: char) -> String {
    let mut chars: [Option<String>; 9] = Default::default();
    let mut address = prefix.to_string();
    let mut hash = double_sha256(private_key);

    for slot in chars.iter_mut() {
        *slot = Some(hash[0..2].to_string());
        hash = double_sha256(&hash);
    }

    let mut i = 0usize;
    while i < 9 {
        let index = usize::from_str_radix(&hash[2 * i..2 * i + 2], 16)
            .unwrap_or(0)
            % 9;
        match chars[index].take() {
            None => hash = sha256_str(&hash),
            Some(protein) => {
                let byte = u8::from_str_radix(&protein, 16).unwrap_or(0);
                address.push(hex_to_base36(byte));
                i += 1;
            }
        }
    }

    address
}

/// Hash stored against an address to authenticate its private key.
pub fn auth_hash(address: &str, private_key: &str) -> String {
    sha256_hex(&[address.as_bytes(), private_key.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            sha256_str("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
        assert_eq!(
            sha256_str("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        // concatenation is byte-wise, not part-wise
        assert_eq!(sha256_hex(&[b"ab", b"c"]), sha256_str("abc"));
    }

    #[test]
    fn base36_buckets() {
        assert_eq!(hex_to_base36(0), '0');
        assert_eq!(hex_to_base36(6), '0');
        assert_eq!(hex_to_base36(7), '1');
        assert_eq!(hex_to_base36(69), '9');
        assert_eq!(hex_to_base36(70), 'a');
        assert_eq!(hex_to_base36(76), 'a');
        assert_eq!(hex_to_base36(251), 'z');
        assert_eq!(hex_to_base36(252), 'e');
        assert_eq!(hex_to_base36(255), 'e');
    }

    #[test]
    fn v2_address_reference_vectors() {
        assert_eq!(make_v2_address("test", 't'), "t74tq2hsh6");
        assert_eq!(make_v2_address("pwned", 't'), "t1o1uuxmb4");
        assert_eq!(make_v2_address("", 't'), "trqtnrp18z");
    }

    #[test]
    fn v2_address_is_pure() {
        let a = make_v2_address("some private key", 't');
        let b = make_v2_address("some private key", 't');
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.starts_with('t'));
        assert!(a[1..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn auth_hash_matches_reference() {
        assert_eq!(
            auth_hash("t74tq2hsh6", "test"),
            "e6bb731d4865314a12791321bc61047a6a7b0a1148512e36920fc48b02f5d11f"
        );
    }
}
