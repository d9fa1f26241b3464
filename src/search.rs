//! Contact search

use crate::directory::Contact;

/// Contacts whose display name contains `query`, ignoring case
///
/// An empty query matches everything. Directory order is preserved.
pub fn filter<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    if query.is_empty() {
        return contacts.iter().collect();
    }
    let needle = query.to_lowercase();
    contacts
        .iter()
        .filter(|c| c.display_name.to_lowercase().contains(&needle))
        .collect()
}
