//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{Error, transaction::TransactionType, user::UserID};

/// The colour given to new categories.
pub const DEFAULT_CATEGORY_COLOR: &str = "#4f46e5";

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty
    /// or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hex colour of the form `#rrggbb`, stored in lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryColor(String);

impl CategoryColor {
    /// # Errors
    ///
    /// Returns an [Error::InvalidColor] if `color` is not `#` followed by six hex digits.
    pub fn new(color: &str) -> Result<Self, Error> {
        let color = color.trim();

        match color.strip_prefix('#') {
            Some(digits) if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self(color.to_ascii_lowercase()))
            }
            _ => Err(Error::InvalidColor(color.to_owned())),
        }
    }

    pub fn new_unchecked(color: &str) -> Self {
        Self(color.to_string())
    }
}

impl Default for CategoryColor {
    fn default() -> Self {
        Self(DEFAULT_CATEGORY_COLOR.to_owned())
    }
}

impl AsRef<str> for CategoryColor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of icons a category can be shown with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryIcon {
    Food,
    Transport,
    Home,
    Shopping,
    Health,
    Entertainment,
    Education,
    Salary,
    Gift,
    Investment,
    #[default]
    Other,
}

impl CategoryIcon {
    pub const ALL: [CategoryIcon; 11] = [
        CategoryIcon::Food,
        CategoryIcon::Transport,
        CategoryIcon::Home,
        CategoryIcon::Shopping,
        CategoryIcon::Health,
        CategoryIcon::Entertainment,
        CategoryIcon::Education,
        CategoryIcon::Salary,
        CategoryIcon::Gift,
        CategoryIcon::Investment,
        CategoryIcon::Other,
    ];

    /// The value stored in the database and sent in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryIcon::Food => "food",
            CategoryIcon::Transport => "transport",
            CategoryIcon::Home => "home",
            CategoryIcon::Shopping => "shopping",
            CategoryIcon::Health => "health",
            CategoryIcon::Entertainment => "entertainment",
            CategoryIcon::Education => "education",
            CategoryIcon::Salary => "salary",
            CategoryIcon::Gift => "gift",
            CategoryIcon::Investment => "investment",
            CategoryIcon::Other => "other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            CategoryIcon::Food => "🍔",
            CategoryIcon::Transport => "🚗",
            CategoryIcon::Home => "🏠",
            CategoryIcon::Shopping => "🛍️",
            CategoryIcon::Health => "💊",
            CategoryIcon::Entertainment => "🎬",
            CategoryIcon::Education => "📚",
            CategoryIcon::Salary => "💼",
            CategoryIcon::Gift => "🎁",
            CategoryIcon::Investment => "📈",
            CategoryIcon::Other => "📦",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryIcon::Food => "Food",
            CategoryIcon::Transport => "Transport",
            CategoryIcon::Home => "Home",
            CategoryIcon::Shopping => "Shopping",
            CategoryIcon::Health => "Health",
            CategoryIcon::Entertainment => "Entertainment",
            CategoryIcon::Education => "Education",
            CategoryIcon::Salary => "Salary",
            CategoryIcon::Gift => "Gift",
            CategoryIcon::Investment => "Investment",
            CategoryIcon::Other => "Other",
        }
    }
}

impl FromStr for CategoryIcon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryIcon::ALL
            .into_iter()
            .find(|icon| icon.as_str() == s)
            .ok_or(Error::NotFound)
    }
}

impl ToSql for CategoryIcon {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryIcon {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A user-defined group of income or expense transactions, e.g. "Groceries" or "Salary".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    /// Only transactions of this type can use the category.
    pub type_: TransactionType,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
    pub description: String,
    /// Inactive categories are hidden from forms but kept on existing transactions.
    pub is_active: bool,
}

/// The validated fields of a category the user can set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub type_: TransactionType,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
    pub description: String,
    pub is_active: bool,
}

#[cfg(test)]
impl NewCategory {
    /// An active category with the default icon and colour.
    pub fn for_test(name: &str, type_: TransactionType) -> Self {
        Self {
            name: CategoryName::new_unchecked(name),
            type_,
            icon: CategoryIcon::default(),
            color: CategoryColor::default(),
            description: String::new(),
            is_active: true,
        }
    }
}

/// Form data for category creation and editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: TransactionType,
    pub icon: CategoryIcon,
    pub color: String,
    pub description: Option<String>,
    /// Checkboxes are only sent when ticked.
    pub is_active: Option<String>,
}

impl Default for CategoryFormData {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_: TransactionType::default(),
            icon: CategoryIcon::default(),
            color: DEFAULT_CATEGORY_COLOR.to_owned(),
            description: None,
            is_active: Some("on".to_owned()),
        }
    }
}

impl From<&Category> for CategoryFormData {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.to_string(),
            type_: category.type_,
            icon: category.icon,
            color: category.color.to_string(),
            description: Some(category.description.clone()),
            is_active: category.is_active.then(|| "on".to_owned()),
        }
    }
}

impl CategoryFormData {
    /// # Errors
    ///
    /// Returns an [Error::EmptyCategoryName] or [Error::InvalidColor] for invalid input.
    pub fn validated(&self) -> Result<NewCategory, Error> {
        Ok(NewCategory {
            name: CategoryName::new(&self.name)?,
            type_: self.type_,
            icon: self.icon,
            color: CategoryColor::new(&self.color)?,
            description: self
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_owned(),
            is_active: self.is_active.is_some(),
        })
    }
}
