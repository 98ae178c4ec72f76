//! Editor session
//!
//! Holds a filter tree and the query it encodes to, keeping the two in step
//! whichever side changes.

use crate::decode::decode;
use crate::encode::encode;
use crate::error::Result;
use crate::field::FieldMap;
use crate::filter::FilterTree;
use crate::query::Query;

#[derive(Debug, Clone, Default)]
pub struct BuilderSession {
    fields: FieldMap,
    filters: FilterTree,
    query: Vec<Query>,
}

impl BuilderSession {
    pub fn new(fields: FieldMap) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Session seeded from an existing query
    pub fn from_query(fields: FieldMap, query: Vec<Query>) -> Result<Self> {
        let mut session = Self::new(fields);
        session.replace_query(query)?;
        Ok(session)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn filters(&self) -> &FilterTree {
        &self.filters
    }

    pub fn query(&self) -> &[Query] {
        &self.query
    }

    /// The query changed outside the editor; rebuild the tree from it
    pub fn replace_query(&mut self, query: Vec<Query>) -> Result<&FilterTree> {
        let filters = decode(&query, &self.fields)?;
        tracing::debug!(nodes = filters.len(), "Replaced filters from query");
        self.filters = FilterTree::from(filters);
        self.query = query;
        Ok(&self.filters)
    }

    /// Apply an editor change to the tree and re-encode
    ///
    /// The change is applied to a copy; on error neither tree nor query move.
    pub fn edit<F>(&mut self, change: F) -> Result<&[Query]>
    where
        F: FnOnce(&mut FilterTree),
    {
        let mut filters = self.filters.clone();
        change(&mut filters);
        let query = encode(filters.nodes(), &self.fields)?;
        tracing::trace!(clauses = query.len(), "Re-encoded after edit");
        self.filters = filters;
        self.query = query;
        Ok(&self.query)
    }
}
