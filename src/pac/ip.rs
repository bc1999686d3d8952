// src/pac/ip.rs
//! IP literal helpers behind `sortIpAddressList()` and `isInNetEx()`.

use crate::error::UtilityFailure;
use std::cmp::Ordering;
use std::net::IpAddr;

/// A parsed address that remembers how the script spelled it.
#[derive(Debug, Clone, Copy)]
struct IpLiteral<'a> {
    text: &'a str,
    number: IpAddr,
}

fn strip_blanks(input: &str) -> String {
    input.chars().filter(|c| *c != ' ' && *c != '\t').collect()
}

fn octets(ip: &IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// IPv6 sorts ahead of IPv4; same-family addresses sort by their bytes.
fn compare(a: &IpAddr, b: &IpAddr) -> Ordering {
    match (a, b) {
        (IpAddr::V6(a), IpAddr::V6(b)) => a.octets().cmp(&b.octets()),
        (IpAddr::V4(a), IpAddr::V4(b)) => a.octets().cmp(&b.octets()),
        (IpAddr::V6(_), IpAddr::V4(_)) => Ordering::Less,
        (IpAddr::V4(_), IpAddr::V6(_)) => Ordering::Greater,
    }
}

/// Parses a dotted-quad IPv4 or an IPv6 literal (no brackets, no zone id).
///
/// Stricter than URL host canonicalization in browsers: the short
/// (`1.2.3`), octal (`010.0.0.1`) and hex (`0x7f.0.0.1`) IPv4 spellings
/// are rejected.
pub fn parse_ip_literal(text: &str) -> Result<IpAddr, UtilityFailure> {
    text.parse::<IpAddr>()
        .map_err(|_| UtilityFailure::InvalidLiteral(text.to_string()))
}

/// Parses `address/bits`. The bit count is decimal and bounded by the family width.
pub fn parse_cidr_block(text: &str) -> Result<(IpAddr, u32), UtilityFailure> {
    let invalid = || UtilityFailure::InvalidPrefix(text.to_string());

    let (address, bits) = text.split_once('/').ok_or_else(invalid)?;
    if bits.is_empty() || !bits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let network = parse_ip_literal(address).map_err(|_| invalid())?;
    let bits: u32 = bits.parse().map_err(|_| invalid())?;

    let width = octets(&network).len() as u32 * 8;
    if bits > width {
        return Err(invalid());
    }
    Ok((network, bits))
}

/// True if the top `bits` bits of `address` and `prefix` agree.
/// Both slices must have the same length.
fn matches_prefix(address: &[u8], prefix: &[u8], bits: u32) -> bool {
    let whole = (bits / 8) as usize;
    let rest = bits % 8;
    if address[..whole] != prefix[..whole] {
        return false;
    }
    if rest == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - rest);
    (address[whole] & mask) == (prefix[whole] & mask)
}

/// Sorts a `;`-separated address list, IPv6 first, each family ascending.
///
/// Spaces and tabs are ignored and empty entries are skipped. The original
/// spelling of every entry is preserved in the output. A single bad entry
/// fails the whole list.
pub fn sort_ip_address_list(input: &str) -> Result<String, UtilityFailure> {
    let cleaned = strip_blanks(input);
    if cleaned.is_empty() {
        return Err(UtilityFailure::Empty);
    }

    let mut literals = cleaned
        .split(';')
        .filter(|token| !token.is_empty())
        .map(|text| parse_ip_literal(text).map(|number| IpLiteral { text, number }))
        .collect::<Result<Vec<_>, _>>()?;

    if literals.is_empty() {
        return Err(UtilityFailure::Empty);
    }

    // `sort_by` is stable, so equal addresses keep their input order.
    literals.sort_by(|a, b| compare(&a.number, &b.number));

    let sorted: Vec<&str> = literals.iter().map(|lit| lit.text).collect();
    Ok(sorted.join(";"))
}

/// `isInNetEx()` with the failure reason kept.
pub fn check_in_net_ex(address: &str, prefix: &str) -> Result<bool, UtilityFailure> {
    if strip_blanks(address).len() != address.len() {
        return Err(UtilityFailure::InvalidLiteral(address.to_string()));
    }
    let address = parse_ip_literal(address)?;
    let (network, bits) = parse_cidr_block(prefix)?;

    let address = octets(&address);
    let network = octets(&network);
    if address.len() != network.len() {
        return Err(UtilityFailure::FamilyMismatch);
    }
    Ok(matches_prefix(&address, &network, bits))
}

/// True iff `address` lies inside the CIDR block `prefix`. Malformed input
/// and mixed families are simply `false`.
pub fn is_in_net_ex(address: &str, prefix: &str) -> bool {
    check_in_net_ex(address, prefix).unwrap_or(false)
}
