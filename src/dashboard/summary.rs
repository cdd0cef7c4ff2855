//! Summarising a period's transactions and turning the summary into spending advice.

use std::{cmp::Ordering, collections::HashMap};

use time::{Date, Duration};

use crate::{
    category::{Category, CategoryId},
    currency::{Currency, format_currency_rounded},
    transaction::{Totals, Transaction, TransactionType},
};

/// The colour used for expenses without a category.
pub const UNCATEGORISED_COLOR: &str = "#cccccc";

/// Average expenses above this amount are considered high.
const HIGH_AVERAGE_EXPENSE: f64 = 3000.0;

/// How many days before today count as "the last week" when looking for a
/// recent burst of spending.
const RECENT_DAYS: i64 = 7;

/// The total spent in one category, `None` being uncategorised expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryExpense {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub color: String,
    pub total: f64,
}

/// The figures the dashboard shows for a period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub totals: Totals,
    /// Largest total first.
    pub expenses_by_category: Vec<CategoryExpense>,
    /// Expenses dated within [RECENT_DAYS] days before today, today included.
    pub recent_expense: f64,
    pub expense_count: usize,
}

impl PeriodSummary {
    /// Summarise `transactions`, using `categories` for names and colours.
    pub fn new(
        transactions: &[Transaction],
        categories: &HashMap<CategoryId, Category>,
        today: Date,
    ) -> Self {
        let recent_start = today - Duration::days(RECENT_DAYS);
        let mut totals = Totals::default();
        let mut recent_expense = 0.0;
        let mut expense_count = 0;
        let mut by_category: HashMap<Option<CategoryId>, f64> = HashMap::new();

        for transaction in transactions {
            match transaction.type_ {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => {
                    totals.expense += transaction.amount;
                    expense_count += 1;
                    *by_category.entry(transaction.category_id).or_default() +=
                        transaction.amount;

                    if transaction.date >= recent_start {
                        recent_expense += transaction.amount;
                    }
                }
            }
        }

        let mut expenses_by_category = by_category
            .into_iter()
            .map(|(category_id, total)| {
                let category = category_id.and_then(|id| categories.get(&id));

                CategoryExpense {
                    category_id,
                    name: category.map_or_else(
                        || "Uncategorised".to_owned(),
                        |category| category.name.to_string(),
                    ),
                    color: category.map_or_else(
                        || UNCATEGORISED_COLOR.to_owned(),
                        |category| category.color.to_string(),
                    ),
                    total,
                }
            })
            .collect::<Vec<_>>();
        expenses_by_category.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            totals,
            expenses_by_category,
            recent_expense,
            expense_count,
        }
    }

    /// The mean amount of the period's expenses, if there were any.
    pub fn average_expense(&self) -> Option<f64> {
        (self.expense_count > 0).then(|| self.totals.expense / self.expense_count as f64)
    }
}

/// Spending advice for a period, in the order the checks are made.
///
/// Always returns at least one message.
pub fn recommendations(summary: &PeriodSummary, currency: Currency) -> Vec<String> {
    let mut messages = Vec::new();
    let totals = summary.totals;

    if totals.expense > totals.income {
        messages.push(format!(
            "Your expenses exceed your income by {}. Try reviewing your spending.",
            format_currency_rounded(totals.expense - totals.income, currency)
        ));
    }

    if let Some(top) = summary.expenses_by_category.first() {
        messages.push(format!(
            "You spend the most on \"{}\": {}.",
            top.name,
            format_currency_rounded(top.total, currency)
        ));
    }

    if summary.recent_expense > 0.0 && summary.recent_expense > totals.expense * 0.5 {
        messages.push(
            "More than half of this period's expenses were in the last 7 days. \
            Your spending is growing too fast."
                .to_owned(),
        );
    }

    if let Some(average) = summary
        .average_expense()
        .filter(|average| *average > HIGH_AVERAGE_EXPENSE)
    {
        messages.push(format!(
            "Your average spend is {}, which is quite high. Try making fewer large purchases.",
            format_currency_rounded(average, currency)
        ));
    }

    if summary.expenses_by_category.len() == 1 {
        messages.push(
            "All of your expenses are in one category, which leaves your budget unbalanced."
                .to_owned(),
        );
    }

    if messages.is_empty() {
        messages.push("Great! Your spending looks balanced.".to_owned());
    }

    messages
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        category::{Category, CategoryColor, CategoryIcon, CategoryId, CategoryName},
        currency::{Currency, format_currency_rounded},
        transaction::{Totals, Transaction, TransactionType},
        user::UserID,
    };

    use super::{CategoryExpense, PeriodSummary, UNCATEGORISED_COLOR, recommendations};

    const TODAY: Date = date!(2025 - 03 - 20);

    fn transaction(
        type_: TransactionType,
        amount: f64,
        category_id: Option<CategoryId>,
        date: Date,
    ) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserID::new(1),
            type_,
            amount,
            category_id,
            card_id: None,
            date,
            description: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn categories() -> HashMap<CategoryId, Category> {
        [(1, "Food", "#ff0000"), (2, "Transport", "#00ff00")]
            .into_iter()
            .map(|(id, name, color)| {
                (
                    id,
                    Category {
                        id,
                        user_id: UserID::new(1),
                        name: CategoryName::new_unchecked(name),
                        type_: TransactionType::Expense,
                        icon: CategoryIcon::default(),
                        color: CategoryColor::new_unchecked(color),
                        description: String::new(),
                        is_active: true,
                    },
                )
            })
            .collect()
    }

    fn summary(
        totals: Totals,
        categories: &[(&str, f64)],
        recent: f64,
        count: usize,
    ) -> PeriodSummary {
        PeriodSummary {
            totals,
            expenses_by_category: categories
                .iter()
                .map(|(name, total)| CategoryExpense {
                    category_id: None,
                    name: (*name).to_owned(),
                    color: UNCATEGORISED_COLOR.to_owned(),
                    total: *total,
                })
                .collect(),
            recent_expense: recent,
            expense_count: count,
        }
    }

    #[test]
    fn summarises_by_category_largest_first() {
        let transactions = [
            transaction(TransactionType::Income, 5000.0, None, date!(2025 - 03 - 01)),
            transaction(TransactionType::Expense, 100.0, Some(1), date!(2025 - 03 - 02)),
            transaction(TransactionType::Expense, 300.0, Some(2), date!(2025 - 03 - 03)),
            transaction(TransactionType::Expense, 50.0, None, date!(2025 - 03 - 13)),
            transaction(TransactionType::Expense, 25.0, Some(1), TODAY),
        ];

        let got = PeriodSummary::new(&transactions, &categories(), TODAY);

        assert_eq!(
            got.totals,
            Totals {
                income: 5000.0,
                expense: 475.0
            }
        );
        assert_eq!(got.expense_count, 4);
        // 2025-03-13 is exactly seven days before today.
        assert_eq!(got.recent_expense, 75.0);
        let names = got
            .expenses_by_category
            .iter()
            .map(|expense| (expense.name.as_str(), expense.total, expense.color.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                ("Transport", 300.0, "#00ff00"),
                ("Food", 125.0, "#ff0000"),
                ("Uncategorised", 50.0, UNCATEGORISED_COLOR),
            ]
        );
    }

    #[test]
    fn no_transactions_is_balanced() {
        let got = recommendations(&summary(Totals::default(), &[], 0.0, 0), Currency::Rub);

        assert_eq!(got, vec!["Great! Your spending looks balanced.".to_owned()]);
    }

    #[test]
    fn spread_out_modest_spending_only_reports_top_category() {
        let got = recommendations(
            &summary(
                Totals {
                    income: 10_000.0,
                    expense: 2000.0,
                },
                &[("Food", 1200.0), ("Transport", 800.0)],
                500.0,
                10,
            ),
            Currency::Rub,
        );

        assert_eq!(
            got,
            vec![format!(
                "You spend the most on \"Food\": {}.",
                format_currency_rounded(1200.0, Currency::Rub)
            )]
        );
    }

    #[test]
    fn every_warning_in_order() {
        let got = recommendations(
            &summary(
                Totals {
                    income: 1000.0,
                    expense: 9000.5,
                },
                &[("Rent", 9000.5)],
                9000.5,
                2,
            ),
            Currency::Usd,
        );

        assert_eq!(got.len(), 5, "got {got:?}");
        assert!(got[0].starts_with("Your expenses exceed your income by $8,001"));
        assert!(got[1].starts_with("You spend the most on \"Rent\""));
        assert!(got[2].starts_with("More than half"));
        assert!(got[3].starts_with("Your average spend is $4,500"));
        assert!(got[4].starts_with("All of your expenses are in one category"));
    }

    #[test]
    fn recent_spending_must_exceed_half() {
        let got = recommendations(
            &summary(
                Totals {
                    income: 10_000.0,
                    expense: 1000.0,
                },
                &[("Food", 600.0), ("Transport", 400.0)],
                500.0,
                10,
            ),
            Currency::Rub,
        );

        assert!(!got.iter().any(|message| message.starts_with("More than half")));
    }
}
