//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::{CategoryIcon, domain::CategoryFormData},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::TransactionType,
};

/// Where and how the form is submitted.
pub(super) enum FormTarget<'a> {
    Create,
    Update(&'a str),
}

pub(super) fn category_form_view(
    target: FormTarget<'_>,
    values: &CategoryFormData,
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        FormTarget::Create => (
            Some(crate::endpoints::CATEGORIES_API),
            None,
            "Create Category",
        ),
        FormTarget::Update(endpoint) => (None, Some(endpoint), "Update Category"),
    };

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
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Groceries"
                    value=(values.name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for type_ in TransactionType::ALL {
                        div class="flex items-center gap-2"
                        {
                            input
                                id={ "type-" (type_) }
                                type="radio"
                                name="type"
                                value=(type_)
                                checked[values.type_ == type_]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for={ "type-" (type_) } class=(FORM_RADIO_LABEL_STYLE)
                            {
                                (type_.label())
                            }
                        }
                    }
                }
            }

            div
            {
                label for="icon" class=(FORM_LABEL_STYLE) { "Icon" }

                select id="icon" name="icon" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for icon in CategoryIcon::ALL {
                        option value=(icon.as_str()) selected[values.icon == icon]
                        {
                            (icon.emoji()) " " (icon.label())
                        }
                    }
                }
            }

            div
            {
                label for="color" class=(FORM_LABEL_STYLE) { "Colour" }

                input
                    id="color"
                    type="color"
                    name="color"
                    value=(values.color)
                    required
                    class="h-10 w-20 cursor-pointer rounded";
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    id="description"
                    name="description"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (values.description.as_deref().unwrap_or_default())
                }
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
