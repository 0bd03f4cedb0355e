use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount in euros with thousands separators: €1,234.56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!(
        "{:.2}",
        val.abs()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    );
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-€{with_commas}.{dec_part}")
    } else {
        format!("€{with_commas}.{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec("1234.56")), "€1,234.56");
        assert_eq!(money(dec("-500")), "-€500.00");
        assert_eq!(money(Decimal::ZERO), "€0.00");
        assert_eq!(money(dec("1000000.99")), "€1,000,000.99");
        assert_eq!(money(dec("42.1")), "€42.10");
        assert_eq!(money(dec("-12.50")), "-€12.50");
    }
}
