//! # Vulnerability Ledger Parser
//!
//! The vuln sub-payload is independently sealed with the same envelope as the
//! telegram. Decrypted, it reads:
//!
//! ```text
//! <scored> | <total> | <label>-<points> <unit> | ... | <terminator>
//! ```
//!
//! A points field starting with `N` is a penalty (`N5` → -5). The label is
//! everything before the last `-`, so labels may themselves contain dashes.
//!
//! Anti-tamper gate: the item points must sum to the telegram's claimed
//! score. A mismatch means someone reproduced the envelope but not the
//! scoring engine.

use shared_crypto::TelegramCipher;
use shared_types::{VulnItem, VulnLedger};

use crate::domain::errors::IngestError;
use crate::domain::telegram::DELIMITER;

/// Marks a negative points value.
pub const PENALTY_PREFIX: char = 'N';

/// Decrypt, parse and sum-check a vuln sub-payload.
pub fn parse_ledger(
    cipher: &TelegramCipher,
    payload: &str,
    claimed: i64,
) -> Result<VulnLedger, IngestError> {
    let plaintext = cipher.open_hex(payload)?;
    let plaintext = String::from_utf8(plaintext)
        .map_err(|_| IngestError::MalformedVulns("plaintext is not UTF-8".into()))?;
    parse_ledger_plaintext(&plaintext, claimed)
}

/// Parse and sum-check an already decrypted sub-payload.
pub fn parse_ledger_plaintext(plaintext: &str, claimed: i64) -> Result<VulnLedger, IngestError> {
    let tokens: Vec<&str> = plaintext.split(DELIMITER).collect();
    if tokens.len() < 3 {
        return Err(IngestError::MalformedVulns(format!(
            "expected at least 3 tokens, got {}",
            tokens.len()
        )));
    }

    let vulns_scored = parse_count(tokens[0], "scored")?;
    let vulns_total = parse_count(tokens[1], "total")?;
    let items = tokens[2..tokens.len() - 1]
        .iter()
        .map(|raw| parse_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let ledger = VulnLedger {
        vulns_scored,
        vulns_total,
        items,
    };

    let computed = ledger
        .point_sum()
        .ok_or_else(|| IngestError::MalformedVulns("item points overflow".into()))?;
    if computed != claimed {
        return Err(IngestError::TamperDetected { claimed, computed });
    }
    Ok(ledger)
}

fn parse_count(token: &str, which: &str) -> Result<u32, IngestError> {
    token
        .trim()
        .parse()
        .map_err(|_| IngestError::MalformedVulns(format!("{which} count {token:?} is not an integer")))
}

/// Parse one `<label>-<points> <unit>` line.
pub fn parse_item(raw: &str) -> Result<VulnItem, IngestError> {
    let malformed = |reason: &str| IngestError::MalformedVulnItem {
        item: raw.to_string(),
        reason: reason.to_string(),
    };

    let (label, tail) = raw
        .rsplit_once('-')
        .ok_or_else(|| malformed("missing '-' separator"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(malformed("empty label"));
    }

    let fields: Vec<&str> = tail.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(malformed("expected '<points> <unit>'"));
    }

    let points = match fields[0].strip_prefix(PENALTY_PREFIX) {
        Some(magnitude) => magnitude.parse::<i64>().map(|p| -p),
        None => fields[0].parse::<i64>(),
    }
    .map_err(|_| malformed("points value is not an integer"))?;

    Ok(VulnItem {
        text: label.to_string(),
        points,
    })
}

/// Render a ledger in wire form with an empty terminator.
pub fn encode_ledger(ledger: &VulnLedger) -> String {
    let mut out = format!(
        "{}{DELIMITER}{}{DELIMITER}",
        ledger.vulns_scored, ledger.vulns_total
    );
    for item in &ledger.items {
        let points = if item.points < 0 {
            format!("{PENALTY_PREFIX}{}", -item.points)
        } else {
            item.points.to_string()
        };
        out.push_str(&format!("{} - {points} pts{DELIMITER}", item.text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wire(scored: u32, total: u32, items: &[&str]) -> String {
        let mut out = format!("{scored}{DELIMITER}{total}{DELIMITER}");
        for item in items {
            out.push_str(item);
            out.push_str(DELIMITER);
        }
        out.push_str("    ");
        out
    }

    #[test]
    fn test_parses_items_and_counts() {
        let ledger =
            parse_ledger_plaintext(&wire(2, 5, &["sqli - 60 pts", "xss - 40 pts"]), 100).unwrap();
        assert_eq!(ledger.vulns_scored, 2);
        assert_eq!(ledger.vulns_total, 5);
        assert_eq!(ledger.items[0].text, "sqli");
        assert_eq!(ledger.items[1].points, 40);
    }

    #[test]
    fn test_penalty_prefix_negates() {
        let ledger =
            parse_ledger_plaintext(&wire(1, 3, &["sqli - 10 pts", "Firewall disabled - N5 pts"]), 5)
                .unwrap();
        assert_eq!(ledger.items[1].points, -5);
        assert_eq!(ledger.penalty_count(), 1);
    }

    #[test]
    fn test_label_keeps_inner_dashes() {
        let item = parse_item("Removed user bob-the-admin - 7 pts").unwrap();
        assert_eq!(item.text, "Removed user bob-the-admin");
        assert_eq!(item.points, 7);
    }

    #[test]
    fn test_sum_mismatch_is_tamper() {
        let err = parse_ledger_plaintext(&wire(2, 5, &["sqli - 60 pts", "xss - 30 pts"]), 100)
            .unwrap_err();
        assert_eq!(
            err,
            IngestError::TamperDetected {
                claimed: 100,
                computed: 90
            }
        );
    }

    #[test]
    fn test_empty_item_list_sums_to_zero() {
        assert!(parse_ledger_plaintext(&wire(0, 4, &[]), 0).unwrap().items.is_empty());
        assert!(parse_ledger_plaintext(&wire(0, 4, &[]), 1).is_err());
    }

    #[test]
    fn test_overflowing_item_sum_is_rejected() {
        let result = parse_ledger_plaintext(
            "2|-SP-|2|-SP-|a - 9223372036854775807 pts|-SP-|b - 9223372036854775807 pts|-SP-|",
            0,
        );
        assert!(matches!(result, Err(IngestError::MalformedVulns(_))));
    }

    #[test]
    fn test_malformed_header() {
        assert!(matches!(
            parse_ledger_plaintext("x|-SP-|3|-SP-|", 0),
            Err(IngestError::MalformedVulns(_))
        ));
        assert!(matches!(
            parse_ledger_plaintext("1|-SP-|3", 0),
            Err(IngestError::MalformedVulns(_))
        ));
    }

    #[test]
    fn test_malformed_items() {
        for raw in ["no separator 5 pts", " - 5 pts", "sqli - 5", "sqli - 5 pts extra", "sqli - five pts"] {
            assert!(
                matches!(parse_item(raw), Err(IngestError::MalformedVulnItem { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_matches_parser() {
        let ledger = VulnLedger {
            vulns_scored: 1,
            vulns_total: 2,
            items: vec![
                VulnItem { text: "ssh root login".into(), points: 12 },
                VulnItem { text: "netcat backdoor".into(), points: -4 },
            ],
        };
        assert_eq!(parse_ledger_plaintext(&encode_ledger(&ledger), 8).unwrap(), ledger);
    }

    proptest! {
        #[test]
        fn prop_accepted_ledgers_always_sum_to_claim(
            points in proptest::collection::vec(-50i64..100, 0..8),
            skew in -3i64..3,
        ) {
            let ledger = VulnLedger {
                vulns_scored: 0,
                vulns_total: points.len() as u32,
                items: points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| VulnItem { text: format!("vuln{i}"), points: *p })
                    .collect(),
            };
            let sum: i64 = points.iter().sum();
            let claim = sum + skew;
            match parse_ledger_plaintext(&encode_ledger(&ledger), claim) {
                Ok(parsed) => prop_assert_eq!(parsed.point_sum(), Some(claim)),
                Err(IngestError::TamperDetected { computed, .. }) => {
                    prop_assert_ne!(skew, 0);
                    prop_assert_eq!(computed, sum);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
