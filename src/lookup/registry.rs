//! Row id to record mapping for rendered lookup results

use crate::lookup::models::AddressInfo;
use std::collections::HashMap;
use uuid::Uuid;

/// Keeps the structured record behind every rendered success row
#[derive(Debug, Default)]
pub struct RowRegistry {
    rows: HashMap<Uuid, AddressInfo>,
}

impl RowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return the id its row should carry
    pub fn register(&mut self, info: AddressInfo) -> Uuid {
        let id = Uuid::new_v4();
        self.rows.insert(id, info);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&AddressInfo> {
        self.rows.get(id)
    }

    /// Forget everything; called when a new batch starts
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = RowRegistry::new();
        let info = AddressInfo {
            address: "1.1.1.1".to_string(),
            asn_number: Some("13335".to_string()),
            ..Default::default()
        };
        let id = registry.register(info.clone());
        let other = registry.register(AddressInfo::default());

        assert_ne!(id, other);
        assert_eq!(registry.get(&id), Some(&info));
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(&id).is_none());
    }
}
