//! Plain-text output of the CLI.
use api_types::{
    auth::User, category::Category, currency::Currency, report::AmountSummary,
    transaction::{Transaction, TransactionType},
};
use pocketbook::{
    Toast,
    money::{UserFormatter, format_currency},
    reports::{self, CategoryTotal, ChartPoint, Totals},
};

use crate::cli::ChartKind;

const BAR_WIDTH: usize = 24;

/// Horizontal bar like `████████░░░░` for `value` out of `max`.
pub fn ascii_bar(value: f64, max: f64, width: usize) -> String {
    if !(max > 0.0) {
        return "░".repeat(width);
    }
    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

fn date(tx: &Transaction) -> String {
    tx.created_at
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn signed(tx: &Transaction, fmt: &UserFormatter) -> String {
    match tx.kind {
        TransactionType::Income => format!("+{}", fmt.format(tx.amount)),
        TransactionType::Expense => format!("-{}", fmt.format(tx.amount)),
    }
}

pub fn toasts(toasts: &[Toast]) {
    for toast in toasts {
        eprintln!("[{}] {}", toast.kind.label(), toast.message);
    }
}

pub fn verification_banner(user: &User) {
    if !user.verified {
        println!(
            "! Your email {} is not verified. Run `pocketbook verify <code>`.",
            user.email
        );
    }
}

pub fn user(user: &User, fmt: &UserFormatter) {
    println!("{} <{}>", user.name, user.email);
    match fmt.currency() {
        Some(currency) => println!(
            "currency: {} ({}) {}",
            currency.currency,
            currency.country,
            fmt.symbol()
        ),
        None => println!("currency: #{}", user.currency_id),
    }
    verification_banner(user);
}

pub fn currencies(currencies: &[Currency]) {
    for currency in currencies {
        println!(
            "{:>3}  {:<4} {:<20} {:<6} {}",
            currency.id,
            currency.currency,
            currency.country,
            currency.country_id,
            format_currency(1234.5, &currency.currency, &currency.country_id)
        );
    }
}

pub fn categories(categories: &[&Category]) {
    if categories.is_empty() {
        println!("No categories.");
        return;
    }
    for category in categories {
        let lock = if category.editable { "" } else { " (default)" };
        println!("{}  {} {}{}", category.id, category.icon, category.name, lock);
    }
}

pub fn transactions(rows: &[&Transaction], categories: &[Category], fmt: &UserFormatter) {
    if rows.is_empty() {
        println!("No transactions.");
        return;
    }
    for tx in rows {
        let (icon, name) = reports::category_label(tx, categories);
        println!(
            "{}  {:<10} {:>14}  {} {:<14} {}",
            tx.id,
            date(tx),
            signed(tx, fmt),
            icon,
            name,
            tx.desc.as_deref().unwrap_or("")
        );
    }
}

pub fn summary(summary: &AmountSummary, fmt: &UserFormatter) {
    println!("Balance   {}", fmt.format(summary.total));
    println!("Income    {}", fmt.format(summary.total_income));
    println!("Expenses  {}", fmt.format(summary.total_expense));
}

pub fn totals(totals: &Totals, fmt: &UserFormatter) {
    println!("Income    {}", fmt.format(totals.income));
    println!("Expenses  {}", fmt.format(totals.expense));
    println!("Net       {}", fmt.format(totals.net));
}

/// Ranked categories with their share of `total` spending.
pub fn breakdown(ranked: &[CategoryTotal], total: f64, fmt: &UserFormatter) {
    if ranked.is_empty() {
        println!("No expenses in this period.");
        return;
    }
    for group in ranked {
        let share = reports::share_of_total(group.amount, total);
        println!(
            "{:<20} {} {:>5.1}%  {}",
            group.label(),
            ascii_bar(share, 100.0, BAR_WIDTH),
            share,
            fmt.format(group.amount)
        );
    }
}

pub fn chart(series: &[ChartPoint], kind: ChartKind, fmt: &UserFormatter) {
    let max = series.iter().map(|p| p.value).fold(0.0, f64::max);
    let total: f64 = series.iter().map(|p| p.value).sum();
    for point in series {
        match kind {
            ChartKind::Bar => println!(
                "{:<20} {} {}  {}",
                point.label,
                ascii_bar(point.value, max, BAR_WIDTH),
                fmt.format(point.value),
                point.color
            ),
            ChartKind::Pie => println!(
                "{} {:<20} {:>5.1}%  {}",
                point.color,
                point.label,
                reports::share_of_total(point.value, total),
                fmt.format(point.value)
            ),
        }
    }
}
