//! Locale-aware currency formatting.
//!
//! Formatting produces typed [`Part`]s; the rendered string and the currency
//! symbol are both read from them. Always two fraction digits.
use api_types::{auth::User, currency::Currency};

const NBSP: &str = "\u{a0}";
const NNBSP: &str = "\u{202f}";

pub const INVALID_AMOUNT: &str = "Please enter a valid amount";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Minus,
    Currency,
    Integer,
    Group,
    Decimal,
    Fraction,
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub kind: PartKind,
    pub value: String,
}

impl Part {
    fn new(kind: PartKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// `$1,234.50`
    Prefix,
    /// `R$ 1.234,50`
    PrefixSpaced,
    /// `1.234,50 €`
    Suffix,
}

#[derive(Debug, Clone, Copy)]
struct LocaleStyle {
    group: &'static str,
    decimal: &'static str,
    /// Digits the integer part needs beyond the first group before grouping.
    min_grouping: usize,
    placement: Placement,
}

const EN: LocaleStyle = LocaleStyle {
    group: ",",
    decimal: ".",
    min_grouping: 1,
    placement: Placement::Prefix,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Locale {
    language: String,
    region: String,
}

impl Locale {
    /// Parses `es-CO` / `es_CO` / `es`; anything unsupported becomes `en-US`.
    fn parse(tag: &str) -> Self {
        let mut subtags = tag.trim().split(['-', '_']);
        let language = subtags.next().unwrap_or_default().to_ascii_lowercase();
        let region = subtags
            .find(|s| s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase);

        let default_region = match language.as_str() {
            "en" => "US",
            "es" => "ES",
            "pt" => "BR",
            "de" => "DE",
            "fr" => "FR",
            "ja" => "JP",
            "zh" => "CN",
            "ko" => "KR",
            _ => {
                return Self {
                    language: "en".to_string(),
                    region: "US".to_string(),
                };
            }
        };
        Self {
            region: region.unwrap_or_else(|| default_region.to_string()),
            language,
        }
    }

    fn style(&self) -> LocaleStyle {
        match (self.language.as_str(), self.region.as_str()) {
            ("es", "MX" | "US") => EN,
            ("es", "AR" | "CO" | "UY") => LocaleStyle {
                group: ".",
                decimal: ",",
                min_grouping: 1,
                placement: Placement::PrefixSpaced,
            },
            ("es", "CL") => LocaleStyle {
                group: ".",
                decimal: ",",
                min_grouping: 1,
                placement: Placement::Prefix,
            },
            ("es", _) => LocaleStyle {
                group: ".",
                decimal: ",",
                min_grouping: 2,
                placement: Placement::Suffix,
            },
            ("pt", "PT") => LocaleStyle {
                group: NBSP,
                decimal: ",",
                min_grouping: 2,
                placement: Placement::Suffix,
            },
            ("pt", _) => LocaleStyle {
                group: ".",
                decimal: ",",
                min_grouping: 1,
                placement: Placement::PrefixSpaced,
            },
            ("de", _) => LocaleStyle {
                group: ".",
                decimal: ",",
                min_grouping: 1,
                placement: Placement::Suffix,
            },
            ("fr", _) => LocaleStyle {
                group: NNBSP,
                decimal: ",",
                min_grouping: 1,
                placement: Placement::Suffix,
            },
            _ => EN,
        }
    }

    /// Dollar-like currencies show the bare sign only at home.
    fn symbol(&self, code: &str) -> String {
        let code = code.trim().to_ascii_uppercase();
        let home = |region: &str, local: &str, foreign: &str| {
            if self.region == region {
                local.to_string()
            } else {
                foreign.to_string()
            }
        };
        match code.as_str() {
            "USD" => home("US", "$", "US$"),
            "MXN" => home("MX", "$", "MX$"),
            "CAD" => home("CA", "$", "CA$"),
            "AUD" => home("AU", "$", "A$"),
            "COP" => home("CO", "$", "COP"),
            "ARS" => home("AR", "$", "ARS"),
            "CLP" => home("CL", "$", "CLP"),
            "UYU" => home("UY", "$", "UYU"),
            "JPY" if self.language == "ja" => "￥".to_string(),
            "JPY" => "¥".to_string(),
            "CNY" => home("CN", "¥", "CN¥"),
            "EUR" => "€".to_string(),
            "GBP" => "£".to_string(),
            "BRL" => "R$".to_string(),
            "INR" => "₹".to_string(),
            "KRW" => "₩".to_string(),
            "PEN" => "S/".to_string(),
            _ => code,
        }
    }
}

fn integer_parts(digits: &str, style: LocaleStyle) -> Vec<Part> {
    if digits.len() < 3 + style.min_grouping {
        return vec![Part::new(PartKind::Integer, digits)];
    }
    let head = digits.len() % 3;
    let mut chunks: Vec<&str> = Vec::new();
    if head > 0 {
        chunks.push(&digits[..head]);
    }
    let mut at = head;
    while at < digits.len() {
        chunks.push(&digits[at..at + 3]);
        at += 3;
    }

    let mut parts = Vec::with_capacity(chunks.len() * 2);
    for (i, chunk) in chunks.into_iter().enumerate() {
        if i > 0 {
            parts.push(Part::new(PartKind::Group, style.group));
        }
        parts.push(Part::new(PartKind::Integer, chunk));
    }
    parts
}

fn number_parts(amount: f64, style: LocaleStyle) -> Vec<Part> {
    if !amount.is_finite() {
        let text = if amount.is_nan() { "NaN" } else { "∞" };
        return vec![Part::new(PartKind::Integer, text)];
    }
    let fixed = format!("{:.2}", amount.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut parts = integer_parts(int, style);
    parts.push(Part::new(PartKind::Decimal, style.decimal));
    parts.push(Part::new(PartKind::Fraction, frac));
    parts
}

/// Formats `amount` in currency `code` for `locale` as typed parts.
pub fn format_parts(amount: f64, code: &str, locale: &str) -> Vec<Part> {
    let locale = Locale::parse(locale);
    let style = locale.style();
    let symbol = locale.symbol(code);

    let mut parts = Vec::new();
    if amount < 0.0 {
        parts.push(Part::new(PartKind::Minus, "-"));
    }
    let number = number_parts(amount, style);
    match style.placement {
        Placement::Prefix => {
            let alphabetic = symbol.chars().last().is_some_and(char::is_alphabetic);
            parts.push(Part::new(PartKind::Currency, symbol));
            if alphabetic {
                parts.push(Part::new(PartKind::Literal, NBSP));
            }
            parts.extend(number);
        }
        Placement::PrefixSpaced => {
            parts.push(Part::new(PartKind::Currency, symbol));
            parts.push(Part::new(PartKind::Literal, NBSP));
            parts.extend(number);
        }
        Placement::Suffix => {
            parts.extend(number);
            parts.push(Part::new(PartKind::Literal, NBSP));
            parts.push(Part::new(PartKind::Currency, symbol));
        }
    }
    parts
}

pub fn format_currency(amount: f64, code: &str, locale: &str) -> String {
    format_parts(amount, code, locale)
        .into_iter()
        .map(|part| part.value)
        .collect()
}

/// The symbol exactly as [`format_currency`] renders it for this locale.
pub fn currency_symbol(code: &str, locale: &str) -> String {
    format_parts(0.0, code, locale)
        .into_iter()
        .find(|part| part.kind == PartKind::Currency)
        .map(|part| part.value)
        .unwrap_or_default()
}

/// Formats amounts in the currency of the logged-in user.
#[derive(Debug, Clone, Default)]
pub struct UserFormatter {
    currency: Option<Currency>,
}

impl UserFormatter {
    /// Uses the currency embedded in `user`, or looks it up by id.
    pub fn new(user: Option<&User>, currencies: &[Currency]) -> Self {
        let currency = user.and_then(|user| {
            user.currency
                .clone()
                .or_else(|| currencies.iter().find(|c| c.id == user.currency_id).cloned())
        });
        Self { currency }
    }

    pub fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    /// Empty when nobody is logged in or the currency is unknown.
    pub fn format(&self, amount: f64) -> String {
        self.currency
            .as_ref()
            .map(|c| format_currency(amount, &c.currency, &c.country_id))
            .unwrap_or_default()
    }

    pub fn symbol(&self) -> String {
        self.currency
            .as_ref()
            .map(|c| currency_symbol(&c.currency, &c.country_id))
            .unwrap_or_default()
    }
}

/// Parses user input such as `12.50` or `12,50` into a positive amount.
pub fn parse_amount(input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replace(',', ".")
    };
    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(INVALID_AMOUNT.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_us_dollars() {
        assert_eq!(format_currency(1234.5, "USD", "en-US"), "$1,234.50");
        assert_eq!(format_currency(-1234.5, "USD", "en-US"), "-$1,234.50");
        assert_eq!(format_currency(1234567.891, "USD", "en-US"), "$1,234,567.89");
        assert_eq!(format_currency(0.0, "USD", "en-US"), "$0.00");
        assert_eq!(format_currency(999.0, "USD", "en-US"), "$999.00");
    }

    #[test]
    fn formats_european_styles() {
        assert_eq!(format_currency(1234.5, "EUR", "de-DE"), "1.234,50\u{a0}€");
        assert_eq!(format_currency(1234.5, "EUR", "es-ES"), "1234,50\u{a0}€");
        assert_eq!(format_currency(12345.5, "EUR", "es-ES"), "12.345,50\u{a0}€");
        assert_eq!(
            format_currency(1234.5, "EUR", "fr-FR"),
            "1\u{202f}234,50\u{a0}€"
        );
        assert_eq!(format_currency(-5.0, "EUR", "de"), "-5,00\u{a0}€");
    }

    #[test]
    fn formats_latin_american_styles() {
        assert_eq!(format_currency(1234.5, "COP", "es-CO"), "$\u{a0}1.234,50");
        assert_eq!(format_currency(1234.5, "BRL", "pt-BR"), "R$\u{a0}1.234,50");
        assert_eq!(format_currency(1234.5, "MXN", "es-MX"), "$1,234.50");
        assert_eq!(format_currency(1234.5, "USD", "es-CO"), "US$\u{a0}1.234,50");
    }

    #[test]
    fn unknown_locale_falls_back_to_en_us() {
        assert_eq!(format_currency(1234.5, "USD", "xx-YY"), "$1,234.50");
        assert_eq!(format_currency(1234.5, "USD", ""), "$1,234.50");
    }

    #[test]
    fn unknown_code_renders_as_itself() {
        assert_eq!(format_currency(1234.5, "ZZZ", "en-US"), "ZZZ\u{a0}1,234.50");
        assert_eq!(currency_symbol("ZZZ", "en-US"), "ZZZ");
    }

    #[test]
    fn symbol_comes_from_parts() {
        assert_eq!(currency_symbol("MXN", "es-MX"), "$");
        assert_eq!(currency_symbol("MXN", "en-US"), "MX$");
        assert_eq!(currency_symbol("USD", "es-CO"), "US$");
        assert_eq!(currency_symbol("EUR", "es-ES"), "€");
        assert_eq!(currency_symbol("JPY", "ja-JP"), "￥");
    }

    #[test]
    fn parts_are_typed() {
        let kinds: Vec<PartKind> = format_parts(-1234.5, "USD", "en-US")
            .into_iter()
            .map(|part| part.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                PartKind::Minus,
                PartKind::Currency,
                PartKind::Integer,
                PartKind::Group,
                PartKind::Integer,
                PartKind::Decimal,
                PartKind::Fraction,
            ]
        );
    }

    fn user(currency: Option<Currency>) -> User {
        User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            verified: true,
            currency_id: 2,
            currency,
        }
    }

    fn euro() -> Currency {
        Currency {
            id: 2,
            currency: "EUR".to_string(),
            country: "Spain".to_string(),
            country_id: "es-ES".to_string(),
        }
    }

    #[test]
    fn user_formatter_resolves_currency() {
        assert_eq!(UserFormatter::new(None, &[euro()]).format(10.0), "");

        let embedded = user(Some(euro()));
        assert_eq!(
            UserFormatter::new(Some(&embedded), &[]).format(10.0),
            "10,00\u{a0}€"
        );

        let by_id = user(None);
        let formatter = UserFormatter::new(Some(&by_id), &[euro()]);
        assert_eq!(formatter.symbol(), "€");
        assert_eq!(UserFormatter::new(Some(&by_id), &[]).format(10.0), "");
    }

    #[test]
    fn parses_amounts() {
        assert_eq!(parse_amount("12.50").unwrap(), 12.5);
        assert_eq!(parse_amount(" 12,5 ").unwrap(), 12.5);
        for bad in ["", "abc", "0", "-4", "inf", "NaN", "1.234,50"] {
            assert_eq!(parse_amount(bad).unwrap_err(), INVALID_AMOUNT, "{bad:?}");
        }
    }
}
