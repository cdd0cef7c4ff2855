//! The form shared by the add and edit card pages.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    card::{Card, CardSystem, CardType, NewCard, parse_card_number},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
};

/// Form data for adding and editing cards.
///
/// Blank fields are parsed as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFormData {
    pub card_holder: String,
    /// Required when adding a card. When editing, a blank number keeps the stored digits.
    pub card_number: Option<String>,
    pub card_system: CardSystem,
    pub card_type: CardType,
    pub balance: Option<f64>,
    pub is_active: Option<String>,
}

impl Default for CardFormData {
    fn default() -> Self {
        Self {
            card_holder: String::new(),
            card_number: None,
            card_system: CardSystem::default(),
            card_type: CardType::default(),
            balance: None,
            is_active: Some("on".to_owned()),
        }
    }
}

impl From<&Card> for CardFormData {
    fn from(card: &Card) -> Self {
        Self {
            card_holder: card.card_holder.clone(),
            card_number: None,
            card_system: card.card_system,
            card_type: card.card_type,
            balance: Some(card.balance),
            is_active: card.is_active.then(|| "on".to_owned()),
        }
    }
}

impl CardFormData {
    /// Validate the form, falling back to `current_last_four` when no number was entered.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyCardHolder], [Error::InvalidCardNumber] or
    /// [Error::InvalidCardBalance] for invalid input.
    pub fn validated(&self, current_last_four: Option<&str>) -> Result<NewCard, Error> {
        let card_holder = self.card_holder.trim();
        if card_holder.is_empty() {
            return Err(Error::EmptyCardHolder);
        }

        let last_four = match (self.card_number.as_deref(), current_last_four) {
            (Some(number), _) if !number.trim().is_empty() => parse_card_number(number)?,
            (_, Some(current)) => current.to_owned(),
            _ => return Err(Error::InvalidCardNumber),
        };

        let balance = self.balance.unwrap_or(0.0);
        if !balance.is_finite() {
            return Err(Error::InvalidCardBalance(balance));
        }

        Ok(NewCard {
            card_holder: card_holder.to_owned(),
            last_four,
            card_system: self.card_system,
            card_type: self.card_type,
            balance,
            is_active: self.is_active.is_some(),
        })
    }
}

/// Where the form is submitted.
pub(super) enum FormTarget<'a> {
    Create,
    /// The update endpoint and the last four digits of the card being edited.
    Update(&'a str, &'a str),
}

pub(super) fn card_form_view(
    target: FormTarget<'_>,
    values: &CardFormData,
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, number_hint, submit_label) = match target {
        FormTarget::Create => (Some(endpoints::CARDS_API), None, None, "Add Card"),
        FormTarget::Update(endpoint, last_four) => (
            None,
            Some(endpoint),
            Some(format!("Leave blank to keep the card ending in {last_four}.")),
            "Update Card",
        ),
    };
    let balance = values.balance.map(|balance| balance.to_string());

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="card_holder" class=(FORM_LABEL_STYLE) { "Card holder" }

                input
                    id="card_holder"
                    type="text"
                    name="card_holder"
                    placeholder="IVAN PETROV"
                    value=(values.card_holder)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="card_number" class=(FORM_LABEL_STYLE) { "Card number" }

                input
                    id="card_number"
                    type="text"
                    name="card_number"
                    inputmode="numeric"
                    autocomplete="off"
                    pattern="[0-9 ]{12,23}"
                    placeholder="0000 0000 0000 0000"
                    required[number_hint.is_none()]
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(hint) = &number_hint {
                    span class="mt-1 block text-xs text-gray-500 dark:text-gray-400" { (hint) }
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="card_system" class=(FORM_LABEL_STYLE) { "Payment system" }

                    select id="card_system" name="card_system" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for system in CardSystem::ALL {
                            option value=(system) selected[values.card_system == system]
                            {
                                (system.label())
                            }
                        }
                    }
                }

                div
                {
                    label for="card_type" class=(FORM_LABEL_STYLE) { "Card type" }

                    select id="card_type" name="card_type" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for card_type in CardType::ALL {
                            option value=(card_type) selected[values.card_type == card_type]
                            {
                                (card_type.label())
                            }
                        }
                    }
                }
            }

            div
            {
                label for="balance" class=(FORM_LABEL_STYLE) { "Balance" }

                input
                    id="balance"
                    type="number"
                    name="balance"
                    step="0.01"
                    placeholder="0.00"
                    value=[balance]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-2"
            {
                input
                    id="is_active"
                    type="checkbox"
                    name="is_active"
                    checked[values.is_active.is_some()]
                    class=(FORM_CHECKBOX_STYLE);

                label for="is_active" class="text-sm" { "Active" }
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
