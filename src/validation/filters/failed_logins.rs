//! Failed-login filters

use super::InputFilter;

/// Filter for failed-login delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("failed_logins")
}
