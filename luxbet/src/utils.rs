use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Parse a BRL amount as typed by a player or printed by the backend.
///
/// Accepts `"50"`, `"50,00"`, `"1.234,56"`, `"12.5"` and an optional `R$`
/// prefix. With a comma present, dots are thousands separators; without one,
/// a single dot is the decimal point.
pub fn parse_brl(input: &str) -> Option<Decimal> {
    let s = input.trim();
    let s = s.strip_prefix("R$").unwrap_or(s).trim();
    if s.is_empty() {
        return None;
    }

    let normalized = match s.matches(',').count() {
        0 if s.matches('.').count() > 1 => s.replace('.', ""),
        0 => s.to_string(),
        1 => s.replace('.', "").replace(',', "."),
        _ => return None,
    };
    if !normalized
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && c == '-'))
    {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

/// First `R$ <amount>` found in free text, e.g. a notification message.
pub fn extract_brl_amount(text: &str) -> Option<Decimal> {
    text.match_indices("R$").find_map(|(idx, _)| {
        let rest = text[idx + 2..].trim_start();
        let candidate: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        let candidate = candidate.trim_end_matches(['.', ',']);
        if candidate.is_empty() {
            None
        } else {
            parse_brl(candidate)
        }
    })
}

/// `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(2)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Lower-case and strip Portuguese diacritics so `Depósito` matches `deposito`.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
