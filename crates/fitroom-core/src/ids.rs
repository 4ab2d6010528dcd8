//! Unique id generation for assets and catalog items.

use uuid::Uuid;

/// Supplies collision-resistant identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random 128-bit UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_ids_are_distinct() {
        let ids: HashSet<String> = (0..256).map(|_| UuidGenerator.next_id()).collect();
        assert_eq!(ids.len(), 256);
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
    }
}
