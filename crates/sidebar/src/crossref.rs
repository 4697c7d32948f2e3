//! Matching installed skills against marketplace listings.

use std::collections::HashMap;

use {skilldeck_marketplace::MarketplaceRecord, skilldeck_skills::SkillRecord};

/// Lookup over the currently loaded marketplace records.
#[derive(Debug, Default)]
pub struct MatchIndex<'a> {
    by_id: HashMap<&'a str, &'a MarketplaceRecord>,
    /// Distinct ids per display name.
    by_name: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> MatchIndex<'a> {
    pub fn new(records: impl IntoIterator<Item = &'a MarketplaceRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            if index.by_id.insert(record.id.as_str(), record).is_some() {
                continue;
            }
            index
                .by_name
                .entry(record.name.as_str())
                .or_default()
                .push(record.id.as_str());
        }
        index
    }

    /// The listing `skill` can be reinstalled from.
    ///
    /// A recorded marketplace id is authoritative: it matches that listing or
    /// nothing. Without one, the name must identify exactly one listing;
    /// ambiguous names produce no match.
    pub fn resolve(&self, skill: &SkillRecord) -> Option<&'a MarketplaceRecord> {
        if let Some(id) = skill.marketplace_id.as_deref() {
            return self.by_id.get(id).copied();
        }
        match self.by_name.get(skill.name.as_str())?.as_slice() {
            [id] => self.by_id.get(id).copied(),
            _ => None,
        }
    }
}
