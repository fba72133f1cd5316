use clap::ValueEnum;

use crate::domain::{format_cents, Cents};

/// How amounts are rendered on screen. Exports always use plain decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Style {
    /// `1234.50`
    #[default]
    Plain,
    /// `Rp 1.234,50`
    Rupiah,
}

impl Style {
    pub fn format_amount(&self, cents: Cents) -> String {
        match self {
            Style::Plain => format_cents(cents),
            Style::Rupiah => format_rupiah(cents),
        }
    }
}

/// Indonesian currency layout: `.` groups thousands, `,` separates decimals.
fn format_rupiah(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}Rp {},{:02}", sign, grouped, abs % 100)
}
