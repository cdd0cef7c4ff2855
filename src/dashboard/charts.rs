//! The expense by category pie chart shown on the dashboard.
//!
//! Charts are built as ECharts options with charming and initialised on page
//! load by an inline script.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{Color, JsFunction, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};

use crate::{currency::Currency, dashboard::summary::CategoryExpense, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// The HTML containers the charts are drawn into.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section id="charts" class="w-full mx-auto mb-4"
        {
            @for chart in charts {
                div
                    id=(chart.id)
                    class="min-h-[380px] rounded dark:bg-gray-100"
                {}
            }
        }
    )
}

/// The script that initialises each chart once the page has loaded, following
/// the browser's light or dark colour scheme.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A pie chart of the period's expenses with one slice per category, each in
/// the category's colour.
pub(super) fn expenses_by_category_chart(
    expenses: &[CategoryExpense],
    currency: Currency,
) -> Chart {
    let colors = expenses
        .iter()
        .map(|expense| Color::from(expense.color.as_str()))
        .collect::<Vec<_>>();
    let data = expenses
        .iter()
        .map(|expense| (expense.total, expense.name.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Expenses by category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(currency)),
        )
        .legend(Legend::new().bottom(0))
        .color(colors)
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn currency_formatter(currency: Currency) -> JsFunction {
    JsFunction::new_with_args(
        "number",
        &format!(
            "const currencyFormatter = new Intl.NumberFormat('en-US', {{
              style: 'currency',
              currency: '{}'
            }});
            return (number) ? currencyFormatter.format(number) : \"-\";",
            currency.code()
        ),
    )
}

#[cfg(test)]
mod tests {
    use crate::{
        currency::Currency,
        dashboard::summary::{CategoryExpense, UNCATEGORISED_COLOR},
    };

    use super::expenses_by_category_chart;

    #[test]
    fn chart_uses_category_names_and_colours() {
        let expenses = [
            CategoryExpense {
                category_id: Some(1),
                name: "Food".to_owned(),
                color: "#ff0000".to_owned(),
                total: 120.0,
            },
            CategoryExpense {
                category_id: None,
                name: "Uncategorised".to_owned(),
                color: UNCATEGORISED_COLOR.to_owned(),
                total: 30.0,
            },
        ];

        let options = expenses_by_category_chart(&expenses, Currency::Eur).to_string();

        assert!(options.contains("Food"), "got {options}");
        assert!(options.contains("Uncategorised"), "got {options}");
        assert!(options.contains("#ff0000"), "got {options}");
        assert!(options.contains(UNCATEGORISED_COLOR), "got {options}");
        assert!(options.contains("EUR"), "got {options}");
    }
}
