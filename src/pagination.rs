//! Splitting long lists into pages and the links for moving between them.

use maud::{Markup, html};

use crate::html::LINK_STYLE;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum number of rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// One entry in the row of page links.
#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Work out which page links to show for `curr_page` out of `page_count` pages,
/// showing at most `max_pages` numbered links besides the first and last page.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// The number of pages needed to show `row_count` rows, `per_page` at a time.
pub fn page_count(row_count: u64, per_page: u64) -> u64 {
    row_count.div_ceil(per_page.max(1))
}

/// Render the page links, using `page_url` to build the link for a page number.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    const ITEM_STYLE: &str = "px-3 py-1";

    html! {
        nav class="pagination flex justify-center" aria-label="Pagination"
        {
            ul class="pagination flex flex-wrap items-center gap-1"
            {
                @for indicator in indicators {
                    @match indicator {
                        PaginationIndicator::Page(page) => li class=(ITEM_STYLE)
                        {
                            a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                        },
                        PaginationIndicator::CurrPage(page) => li
                            class="px-3 py-1 rounded bg-blue-600 text-white"
                            aria-current="page"
                        {
                            (page)
                        },
                        PaginationIndicator::Ellipsis => li class=(ITEM_STYLE) { "..." },
                        PaginationIndicator::BackButton(page) => li class=(ITEM_STYLE)
                        {
                            a href=(page_url(*page)) role="button" class=(LINK_STYLE) { "Back" }
                        },
                        PaginationIndicator::NextButton(page) => li class=(ITEM_STYLE)
                        {
                            a href=(page_url(*page)) role="button" class=(LINK_STYLE) { "Next" }
                        },
                    }
                }
            }
        }
    }
}
