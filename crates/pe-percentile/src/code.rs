//! Stock code normalization.
//!
//! Two external notations are accepted, both case-insensitive:
//! `600739.SH` (exchange suffix) and `sh600739` (exchange prefix).
//! The canonical form is always the lowercase prefix notation.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Exchange marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "sh" => Some(Exchange::Shanghai),
            "sz" => Some(Exchange::Shenzhen),
            _ => None,
        }
    }
}

/// A normalized stock code. `Display` renders the canonical `xxNNNNNN` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StockCode {
    exchange: Exchange,
    digits: String,
}

impl StockCode {
    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Canonical `xxNNNNNN` string.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.exchange.as_str(), self.digits)
    }
}

impl FromStr for StockCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("Invalid stock code format: '{0}'")]
    InvalidFormat(String),
}

fn suffix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]{6})\.(sh|sz)$").expect("valid regex"))
}

fn prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(sh|sz)([0-9]{6})$").expect("valid regex"))
}

/// Normalize a raw identifier into a [`StockCode`].
///
/// Never panics; any input that matches neither notation is rejected with
/// [`CodeError::InvalidFormat`] carrying the original input.
pub fn normalize(raw: &str) -> Result<StockCode, CodeError> {
    let cleaned = raw.trim().to_ascii_lowercase();

    let (marker, digits) = if let Some(caps) = suffix_pattern().captures(&cleaned) {
        (caps[2].to_string(), caps[1].to_string())
    } else if let Some(caps) = prefix_pattern().captures(&cleaned) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        return Err(CodeError::InvalidFormat(raw.to_string()));
    };

    let exchange =
        Exchange::from_marker(&marker).ok_or_else(|| CodeError::InvalidFormat(raw.to_string()))?;

    Ok(StockCode { exchange, digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_notation() {
        assert_eq!(normalize("000603.sz").unwrap().to_string(), "sz000603");
        assert_eq!(normalize("600739.SH").unwrap().to_string(), "sh600739");
    }

    #[test]
    fn test_prefix_notation_case_insensitive() {
        assert_eq!(normalize("SH600739").unwrap().to_string(), "sh600739");
        assert_eq!(normalize("Sz301011").unwrap().to_string(), "sz301011");
    }

    #[test]
    fn test_both_notations_agree() {
        for body in ["000001", "301011", "600739", "999999"] {
            for marker in ["sh", "sz", "SH", "Sz"] {
                let suffix = normalize(&format!("{body}.{marker}")).unwrap();
                let prefix = normalize(&format!("{marker}{body}")).unwrap();
                assert_eq!(suffix, prefix);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        for raw in ["000603.SZ", "sh600739", " SZ301011 "] {
            let once = normalize(raw).unwrap();
            let twice = normalize(&once.to_string()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.canonical(), twice.canonical());
        }
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(normalize("  600739.sh\n").unwrap().to_string(), "sh600739");
    }

    #[test]
    fn test_rejections() {
        let inputs = [
            "",
            "abc123",
            "600739",
            "sh60073",
            "sh6007391",
            "bj600739",
            "600739.BJ",
            "600739sh",
            "sh.600739",
            "６００７３９.sh",
            "sh60073a",
            "600739.shh",
        ];
        for raw in inputs {
            assert_eq!(
                normalize(raw),
                Err(CodeError::InvalidFormat(raw.to_string())),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn test_from_str() {
        let code: StockCode = "000603.SZ".parse().unwrap();
        assert_eq!(code.exchange(), Exchange::Shenzhen);
        assert_eq!(code.digits(), "000603");
        assert!("nope".parse::<StockCode>().is_err());
    }
}
