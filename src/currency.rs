//! The currencies a user can choose for displaying money and the helpers that
//! format amounts in that currency.

use std::{fmt::Display, str::FromStr, sync::OnceLock};

use numfmt::{Formatter, Precision};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The display currency chosen in a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Russian rouble, the default for new users.
    #[default]
    Rub,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Every supported currency in the order they are offered in forms.
    pub const ALL: [Currency; 3] = [Currency::Rub, Currency::Usd, Currency::Eur];

    /// The ISO 4217 code, e.g. "RUB".
    pub fn code(self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// The symbol printed next to amounts.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Rub => "₽",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }

    /// A human readable name for select inputs.
    pub fn label(self) -> &'static str {
        match self {
            Currency::Rub => "Russian rouble (₽)",
            Currency::Usd => "US dollar ($)",
            Currency::Eur => "Euro (€)",
        }
    }

    // Roubles are written "1 500 ₽" by convention, the others put the symbol first.
    fn symbol_is_prefix(self) -> bool {
        !matches!(self, Currency::Rub)
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RUB" => Ok(Currency::Rub),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(Error::InvalidCurrency(s.to_owned())),
        }
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// Format `amount` with two decimal places, thousands separators and the
/// currency symbol, e.g. "$1,234.50", "-€3.10" or "1,500.00 ₽".
pub fn format_currency(amount: f64, currency: Currency) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("")
            .expect("an empty prefix is always valid")
            .precision(Precision::Decimals(2))
    });

    let digits = if amount == 0.0 {
        // Zero is hardcoded as "0" by numfmt.
        "0".to_owned()
    } else {
        fmt.fmt_string(amount.abs())
    };

    with_symbol(&pad_decimals(digits), amount < 0.0, currency)
}

/// Format `amount` rounded to whole units, e.g. "$1,235" or "1,500 ₽".
pub fn format_currency_rounded(amount: f64, currency: Currency) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("")
            .expect("an empty prefix is always valid")
            .precision(Precision::Decimals(0))
    });

    let amount = amount.round();
    let digits = if amount == 0.0 {
        "0".to_owned()
    } else {
        fmt.fmt_string(amount.abs())
    };

    with_symbol(&digits, amount < 0.0, currency)
}

fn with_symbol(digits: &str, is_negative: bool, currency: Currency) -> String {
    let sign = if is_negative { "-" } else { "" };

    if currency.symbol_is_prefix() {
        format!("{sign}{}{digits}", currency.symbol())
    } else {
        format!("{sign}{digits} {}", currency.symbol())
    }
}

// numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3".
fn pad_decimals(mut digits: String) -> String {
    let decimals = match digits.find('.') {
        Some(position) => digits.len() - position - 1,
        None => {
            digits.push('.');
            0
        }
    };

    for _ in decimals..2 {
        digits.push('0');
    }

    digits
}
