use crate::promotion::PromotionRecord;

/// Promotions confirmed during the current session.
///
/// Additive within a session: records are appended on confirm and replaced
/// in place when an edit is saved. A new session starts empty.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    records: Vec<PromotionRecord>,
}

impl SessionHistory {
    pub fn push(&mut self, record: PromotionRecord) {
        self.records.push(record);
    }

    /// Replaces the record with the same `id`. Returns `false` when no record
    /// matches, in which case the history is unchanged.
    pub fn replace(&mut self, updated: PromotionRecord) -> bool {
        let Some(id) = updated.id.as_deref() else {
            return false;
        };
        match self
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
        {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PromotionRecord> {
        self.records.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// Records in confirmation order.
    #[must_use]
    pub fn records(&self) -> &[PromotionRecord] {
        &self.records
    }

    /// Most recent first, as shown in the history list.
    pub fn recent_first(&self) -> impl Iterator<Item = &PromotionRecord> {
        self.records.iter().rev()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
