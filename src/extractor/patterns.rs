// file: src/extractor/patterns.rs
// description: compiled regex patterns for indicator candidate scanning
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // word groups joined by - + . or ' in the local part, dotted word groups in the domain
    pub static ref EMAIL: Regex = Regex::new(
        r"\b\w+(?:[-+.']\w+)*@\w+(?:[-.]\w+)*\.\w+(?:[-.]\w+)*\b"
    ).expect("EMAIL regex is valid");

    pub static ref IPV4_ADDRESS: Regex = Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
    ).expect("IPV4_ADDRESS regex is valid");

    pub static ref BTC_ADDRESS: Regex = Regex::new(
        r"\b(?:bc1|[13])[a-zA-HJ-NP-Z0-9]{25,39}\b"
    ).expect("BTC_ADDRESS regex is valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(re: &Regex, text: &str) -> Vec<String> {
        re.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }

    #[test]
    fn test_email_pattern() {
        assert_eq!(matches(&EMAIL, "contact a@b.com or x@y"), vec!["a@b.com"]);
        assert_eq!(
            matches(&EMAIL, "mail o'brien@mail.example.org, Jane.Doe+tag@sub-d.co.uk"),
            vec!["o'brien@mail.example.org", "Jane.Doe+tag@sub-d.co.uk"]
        );
    }

    #[test]
    fn test_ipv4_pattern() {
        assert_eq!(
            matches(&IPV4_ADDRESS, "server 192.168.1.500 and 10.0.0.1"),
            vec!["10.0.0.1"]
        );
        assert!(!IPV4_ADDRESS.is_match("999.999.999.999"));
    }

    #[test]
    fn test_btc_pattern() {
        assert!(BTC_ADDRESS.is_match("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
        assert!(BTC_ADDRESS.is_match("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"));
        assert!(BTC_ADDRESS.is_match("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"));
        assert!(!BTC_ADDRESS.is_match("1short"));
    }
}
