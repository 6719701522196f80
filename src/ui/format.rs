// ============================================================================
// Formatage des nombres pour l'affichage
// ============================================================================

/// Valeur affichée quand il n'y a pas de donnée
pub const NO_DATA: &str = "—";

/// Insère des séparateurs de milliers dans une partie entière
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Montant en dollars : "$1,234.56", 6 décimales sous 1$
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let decimals = if value.abs() < 1.0 && value != 0.0 { 6 } else { 2 };
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let sign = if value < 0.0 { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}${}", sign, group_thousands(int_part))
    } else {
        format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
    }
}

/// Montant compact : $1.23K, $4.56M, $7.89B, $1.02T
pub fn format_compact_usd(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    format!("{}${:.2}{}", sign, scaled, suffix)
}

/// Pourcentage signé : "+12.34%", "-0.50%"
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    format!("{:+.2}%", value)
}

/// Pourcentage optionnel (NO_DATA si absent)
pub fn format_optional_percent(value: Option<f64>) -> String {
    value.map(format_percent).unwrap_or_else(|| NO_DATA.to_string())
}

/// Montant optionnel (NO_DATA si absent)
pub fn format_optional_money(value: Option<f64>) -> String {
    value.map(format_money).unwrap_or_else(|| NO_DATA.to_string())
}

/// Quantité de tokens (séparateurs de milliers, 4 décimales max)
pub fn format_tokens(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let formatted = format!("{:.4}", value.abs());
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let sign = if value < 0.0 { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, group_thousands(int_part))
    } else {
        format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
        assert_eq!(format_money(0.00012345), "$0.000123");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(-1500.0), "-$1,500.00");
        assert_eq!(format_money(f64::NAN), "—");
    }

    #[test]
    fn test_format_compact_usd() {
        assert_eq!(format_compact_usd(1_234_000_000_000.0), "$1.23T");
        assert_eq!(format_compact_usd(45_600_000.0), "$45.60M");
        assert_eq!(format_compact_usd(999.0), "$999.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.346), "+12.35%");
        assert_eq!(format_percent(-0.5), "-0.50%");
        assert_eq!(format_optional_percent(None), "—");
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(1500.0), "1,500");
        assert_eq!(format_tokens(0.25), "0.25");
    }
}
