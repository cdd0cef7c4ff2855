//! Registered users, their preferences and the profile page.

mod core;
mod profile;
mod profile_page;

pub use core::{
    User, UserDetails, UserID, create_user, create_user_table, get_user_by_id, get_user_by_login,
    update_user_details,
};
pub use profile::{UserProfile, create_user_profile_table, get_user_profile, update_user_profile};
pub use profile_page::{
    get_profile_page, update_profile_details_endpoint, update_profile_preferences_endpoint,
};

#[cfg(test)]
pub use core::count_users;
