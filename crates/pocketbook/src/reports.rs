//! Pure aggregations over the transaction and category caches.
//!
//! Nothing here is cached: callers recompute on every read, passing `now`
//! explicitly so results are reproducible.
use std::{collections::HashMap, fmt, str::FromStr};

use api_types::{
    category::Category,
    transaction::{Transaction, TransactionType},
};
use chrono::{DateTime, Months, TimeDelta, Utc};

pub const DASHBOARD_TOP_N: usize = 5;
pub const RECENT_COUNT: usize = 5;

pub const UNKNOWN_CATEGORY_NAME: &str = "Unknown";
pub const UNKNOWN_CATEGORY_ICON: &str = "💸";

pub const PALETTE: [&str; 8] = [
    "#34d399", "#60a5fa", "#f472b6", "#facc15", "#fb923c", "#a855f7", "#14b8a6", "#ea580c",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Week => "Last 7 days",
            Self::Month => "Last month",
            Self::Year => "Last 12 months",
            Self::All => "All time",
        }
    }

    /// Inclusive lower bound of the window ending at `now`; `None` for `all`.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Week => now.checked_sub_signed(TimeDelta::days(7)),
            Self::Month => now.checked_sub_months(Months::new(1)),
            Self::Year => now.checked_sub_months(Months::new(12)),
            Self::All => None,
        }
    }

    fn contains(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            _ => self.start(now).is_some_and(|start| start <= at) && at <= now,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

/// Transactions dated inside `period`. Undated entries are always dropped.
pub fn filter_by_period<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    period: Period,
    now: DateTime<Utc>,
) -> Vec<&'a Transaction> {
    transactions
        .into_iter()
        .filter(|tx| tx.created_at.is_some_and(|at| period.contains(at, now)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

pub fn totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let (income, expense) =
        transactions
            .into_iter()
            .fold((0.0, 0.0), |(income, expense), tx| match tx.kind {
                TransactionType::Income => (income + tx.amount, expense),
                TransactionType::Expense => (income, expense + tx.amount),
            });
    Totals {
        income,
        expense,
        net: income - expense,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: String,
    pub name: String,
    pub icon: String,
    pub amount: f64,
}

impl CategoryTotal {
    pub fn label(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }
}

/// Expense sums per category, in the order categories are first seen.
pub fn expenses_by_category<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    categories: &[Category],
) -> Vec<CategoryTotal> {
    let mut groups: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in transactions
        .into_iter()
        .filter(|tx| tx.kind == TransactionType::Expense)
    {
        let slot = *index.entry(tx.category_id.as_str()).or_insert_with(|| {
            let known = categories.iter().find(|c| c.id == tx.category_id);
            groups.push(CategoryTotal {
                category_id: tx.category_id.clone(),
                name: known.map_or(UNKNOWN_CATEGORY_NAME, |c| c.name.as_str()).to_string(),
                icon: known.map_or(UNKNOWN_CATEGORY_ICON, |c| c.icon.as_str()).to_string(),
                amount: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].amount += tx.amount;
    }
    groups
}

/// Largest first. The sort is stable, so ties keep first-seen order.
pub fn rank(mut groups: Vec<CategoryTotal>) -> Vec<CategoryTotal> {
    groups.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    groups
}

pub fn top_expense_categories<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    categories: &[Category],
    limit: Option<usize>,
) -> Vec<CategoryTotal> {
    let mut ranked = rank(expenses_by_category(transactions, categories));
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

/// Percentage of `total` taken by `amount`, 0 when there is nothing spent.
pub fn share_of_total(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

pub fn chart_series(ranked: &[CategoryTotal]) -> Vec<ChartPoint> {
    ranked
        .iter()
        .zip(PALETTE.iter().cycle())
        .map(|(group, color)| ChartPoint {
            label: group.label(),
            value: group.amount,
            color: *color,
        })
        .collect()
}

/// Newest first; an undated entry counts as happening `now`.
pub fn recent<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    now: DateTime<Utc>,
    count: usize,
) -> Vec<&'a Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.into_iter().collect();
    sorted.sort_by(|a, b| b.created_at.unwrap_or(now).cmp(&a.created_at.unwrap_or(now)));
    sorted.truncate(count);
    sorted
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    fn matches(self, kind: TransactionType) -> bool {
        match self {
            Self::All => true,
            Self::Income => kind == TransactionType::Income,
            Self::Expense => kind == TransactionType::Expense,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Category,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "category" => Ok(Self::Category),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Filter, search and sort state of the transaction ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    pub filter: TypeFilter,
    pub search: String,
    pub sort: SortField,
    pub order: SortOrder,
}

impl LedgerQuery {
    /// Same field flips the order; a new field starts descending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort == field {
            self.order = self.order.flipped();
        } else {
            self.sort = field;
            self.order = SortOrder::Desc;
        }
    }

    pub fn apply<'a>(
        &self,
        transactions: &'a [Transaction],
        categories: &[Category],
    ) -> Vec<&'a Transaction> {
        let needle = self.search.trim().to_lowercase();
        let category_name = |tx: &Transaction| {
            categories
                .iter()
                .find(|c| c.id == tx.category_id)
                .map(|c| c.name.to_lowercase())
        };

        let mut rows: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| self.filter.matches(tx.kind))
            .filter(|tx| {
                needle.is_empty()
                    || tx
                        .desc
                        .as_deref()
                        .is_some_and(|desc| desc.to_lowercase().contains(&needle))
                    || category_name(tx).is_some_and(|name| name.contains(&needle))
            })
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match self.sort {
                SortField::Date => a.created_at.cmp(&b.created_at),
                SortField::Amount => a.amount.total_cmp(&b.amount),
                SortField::Category => category_name(a)
                    .unwrap_or_default()
                    .cmp(&category_name(b).unwrap_or_default()),
            };
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        rows
    }
}

/// Icon and name of a transaction's category, "Unknown" when missing.
pub fn category_label(tx: &Transaction, categories: &[Category]) -> (String, String) {
    categories
        .iter()
        .find(|c| c.id == tx.category_id)
        .map(|c| (c.icon.clone(), c.name.clone()))
        .or_else(|| {
            tx.category
                .as_ref()
                .map(|c| (c.icon.clone(), c.name.clone()))
        })
        .unwrap_or_else(|| {
            (
                UNKNOWN_CATEGORY_ICON.to_string(),
                UNKNOWN_CATEGORY_NAME.to_string(),
            )
        })
}
