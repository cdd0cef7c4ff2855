//! The form shared by the new and edit transaction pages.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    card::{Card, CardId},
    category::{Category, CategoryId},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    transaction::core::{NewTransaction, Transaction, TransactionType},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFormData {
    #[serde(rename = "type")]
    pub type_: TransactionType,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: Option<String>,
    /// Empty for an uncategorised transaction.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Empty for a cash transaction.
    #[serde(default)]
    pub card_id: Option<CardId>,
}

impl From<TransactionFormData> for NewTransaction {
    fn from(form: TransactionFormData) -> Self {
        Self {
            type_: form.type_,
            amount: form.amount,
            category_id: form.category_id,
            card_id: form.card_id,
            date: form.date,
            description: form.description.unwrap_or_default(),
        }
    }
}

/// The values the form fields start with.
pub(super) struct TransactionFormValues<'a> {
    pub type_: TransactionType,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: &'a str,
    pub category_id: Option<CategoryId>,
    pub card_id: Option<CardId>,
    /// The latest date that can be picked, i.e. today.
    pub max_date: Date,
}

impl<'a> TransactionFormValues<'a> {
    pub(super) fn from_transaction(transaction: &'a Transaction, max_date: Date) -> Self {
        Self {
            type_: transaction.type_,
            amount: Some(transaction.amount),
            date: transaction.date,
            description: &transaction.description,
            category_id: transaction.category_id,
            card_id: transaction.card_id,
            max_date,
        }
    }
}

/// Where and how the form is submitted.
pub(super) enum FormTarget<'a> {
    Create,
    Update(&'a str),
}

/// Render the transaction form.
///
/// `categories` and `cards` are the options offered in the selects. The
/// categories are grouped by type, the server rejects a category whose type
/// does not match the transaction's.
pub(super) fn transaction_form_view(
    target: FormTarget<'_>,
    values: &TransactionFormValues<'_>,
    categories: &[Category],
    cards: &[Card],
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        FormTarget::Create => (
            Some(endpoints::TRANSACTIONS_API),
            None,
            "Create Transaction",
        ),
        FormTarget::Update(endpoint) => (None, Some(endpoint), "Update Transaction"),
    };
    let amount = values.amount.map(|amount| format!("{amount:.2}"));

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for type_ in TransactionType::ALL {
                        div class="flex items-center gap-3"
                        {
                            input
                                name="type"
                                id={ "transaction-type-" (type_) }
                                type="radio"
                                value=(type_)
                                checked[values.type_ == type_]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            label
                                for={ "transaction-type-" (type_) }
                                class=(FORM_RADIO_LABEL_STYLE)
                            {
                                (type_.label())
                            }
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
                        autofocus
                        value=[amount.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    max=(values.max_date)
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[values.category_id.is_none()] { "Uncategorised" }

                    @for type_ in TransactionType::ALL {
                        @let group = categories.iter().filter(|category| category.type_ == type_);

                        optgroup label=(type_.label())
                        {
                            @for category in group {
                                option
                                    value=(category.id)
                                    selected[values.category_id == Some(category.id)]
                                {
                                    (category.icon.emoji()) " " (category.name)
                                }
                            }
                        }
                    }
                }
            }

            div
            {
                label for="card_id" class=(FORM_LABEL_STYLE) { "Card" }

                select name="card_id" id="card_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[values.card_id.is_none()] { "Cash / no card" }

                    @for card in cards {
                        option value=(card.id) selected[values.card_id == Some(card.id)]
                        {
                            (card.short_name())
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Description"
                    value=(values.description)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
