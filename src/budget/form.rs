//! The form shared by the new and edit budget pages.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    budget::core::{Budget, NewBudget, format_budget_month, parse_budget_month},
    category::{Category, CategoryId},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
    },
};

/// The form data for creating or editing a budget.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetFormData {
    pub category_id: Option<CategoryId>,
    pub amount: Option<f64>,
    /// A month of the form "YYYY-MM".
    #[serde(default)]
    pub month: String,
}

impl BudgetFormData {
    /// Check the form and convert it to a [NewBudget].
    ///
    /// The category itself is checked when the budget is saved.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::InvalidCategory] if no category was chosen,
    /// - [Error::NonPositiveAmount] if the amount is missing or not greater than zero,
    /// - [Error::InvalidBudgetMonth] if the month is not of the form "YYYY-MM".
    pub fn validated(&self) -> Result<NewBudget, Error> {
        let category_id = self.category_id.ok_or(Error::InvalidCategory)?;
        let month = parse_budget_month(&self.month)?;

        NewBudget {
            category_id,
            amount: self.amount.unwrap_or(0.0),
            month,
        }
        .validated()
    }
}

impl From<&Budget> for BudgetFormData {
    fn from(budget: &Budget) -> Self {
        Self {
            category_id: Some(budget.category_id),
            amount: Some(budget.amount),
            month: format_budget_month(budget.month),
        }
    }
}

/// Where and how the form is submitted.
pub(super) enum FormTarget<'a> {
    Create,
    Update(&'a str),
}

/// Render the budget form offering `categories`, which should be expense categories.
pub(super) fn budget_form_view(
    target: FormTarget<'_>,
    values: &BudgetFormData,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        FormTarget::Create => (Some(endpoints::BUDGETS_API), None, "Create Budget"),
        FormTarget::Update(endpoint) => (None, Some(endpoint), "Update Budget"),
    };
    let amount = values.amount.map(|amount| format!("{amount:.2}"));

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                @if categories.is_empty() {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "You need an active expense category first. "
                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create a category" }
                    }
                }

                select name="category_id" id="category_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) selected[values.category_id == Some(category.id)]
                        {
                            (category.icon.emoji()) " " (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        value=[amount.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                input
                    name="month"
                    id="month"
                    type="month"
                    value=(values.month)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
