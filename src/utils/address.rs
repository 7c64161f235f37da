//! Address helpers

use crate::utils::constants::CONTRACT_ADDRESS_DATA_LEN;

/// bech32 data-part alphabet
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Normalize user input: trimmed and lowercase (bech32 is case-insensitive)
#[inline]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Check that `address` looks like a contract address for `prefix`
/// (`<prefix>1` followed by a 32-byte bech32 payload).
pub fn is_contract_address(address: &str, prefix: &str) -> bool {
    let Some(data) = address
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('1'))
    else {
        return false;
    };

    data.len() == CONTRACT_ADDRESS_DATA_LEN && data.chars().all(|c| BECH32_CHARSET.contains(c))
}

/// Shorten an address for log lines
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 16 {
        return address.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}..{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "juno1qpzry9x8gf2tvdw0s3jn54khce6mua7lqpzry9x8gf2tvdw0s3jn54khce";

    #[test]
    fn test_contract_address_accepted() {
        assert_eq!(CONTRACT.len(), "juno1".len() + CONTRACT_ADDRESS_DATA_LEN);
        assert!(is_contract_address(CONTRACT, "juno"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        assert!(!is_contract_address(CONTRACT, "osmo"));
    }

    #[test]
    fn test_wallet_length_and_names_rejected() {
        assert!(!is_contract_address("juno1qpzry9x8gf2tvdw0s3jn54khce6mua7l", "juno"));
        assert!(!is_contract_address("rocket", "juno"));
        // 'b' is not in the bech32 alphabet
        assert!(!is_contract_address(&CONTRACT.replace('q', "b"), "juno"));
        assert!(!is_contract_address(&CONTRACT.to_uppercase(), "juno"));
    }

    #[test]
    fn test_normalize_and_shorten() {
        assert_eq!(normalize_address("  JUNO1ABC "), "juno1abc");
        assert_eq!(short_address("juno1abc"), "juno1abc");
        assert_eq!(short_address(CONTRACT), "juno1qpzry..54khce");
    }
}
