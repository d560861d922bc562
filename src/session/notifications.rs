//! NotificationLog - append-only outcome messages.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NotificationLog {
    entries: Vec<String>,
}

impl NotificationLog {
    pub fn new() -> Self { Self::default() }

    pub fn append(&mut self, message: impl Into<String>) { self.entries.push(message.into()); }

    /// Every entry, oldest first.
    pub fn list_all(&self) -> &[String] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn last(&self) -> Option<&str> { self.entries.last().map(String::as_str) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let mut log = NotificationLog::new();
        log.append("Deposit successful!");
        log.append("Withdrawal failed. Please try again.");
        log.append("Deposit successful!");
        assert_eq!(log.len(), 3);
        assert_eq!(log.list_all(), ["Deposit successful!", "Withdrawal failed. Please try again.", "Deposit successful!"]);
        assert_eq!(log.last(), Some("Deposit successful!"));
    }
}
