//! Shapes of the addressed sub-value.

use std::sync::Arc;

use crate::error::MutationError;
use crate::pagination::PageInfo;
use crate::value::{CacheValue, ObjectMap};

pub const FIELD_CONTENT: &str = "content";
pub const FIELD_PAGE: &str = "page";

/// The addressed sub-value, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheData {
    /// `{ content: [..], page: {..} }`, plus any other envelope fields.
    Paginated(PaginatedEnvelope),
    /// A plain ordered collection.
    Collection(Vec<CacheValue>),
    /// One value, or `None` for null/absent.
    Single(Option<CacheValue>),
}

impl CacheData {
    /// Classify a sub-value.
    ///
    /// With `paginated` set, anything but an object carrying a `content`
    /// array is malformed and yields `None`. Otherwise arrays are
    /// collections and everything else is singular.
    pub fn classify(value: Option<&CacheValue>, paginated: bool) -> Option<Self> {
        if paginated {
            return value
                .and_then(PaginatedEnvelope::from_value)
                .map(CacheData::Paginated);
        }
        Some(match value {
            Some(CacheValue::Array(items)) => CacheData::Collection(items.to_vec()),
            Some(CacheValue::Null) | None => CacheData::Single(None),
            Some(other) => CacheData::Single(Some(other.clone())),
        })
    }

    pub fn into_value(self) -> CacheValue {
        match self {
            CacheData::Paginated(envelope) => envelope.into_value(),
            CacheData::Collection(items) => CacheValue::array(items),
            CacheData::Single(value) => value.unwrap_or_default(),
        }
    }
}

/// A paginated envelope being rewritten.
///
/// Holds the original envelope so untouched fields (and the original `page`
/// object) are carried over by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedEnvelope {
    envelope: Arc<ObjectMap>,
    pub content: Vec<CacheValue>,
    page: Option<CacheValue>,
}

impl PaginatedEnvelope {
    /// `None` unless `value` is an object with a `content` array.
    pub fn from_value(value: &CacheValue) -> Option<Self> {
        let CacheValue::Object(envelope) = value else {
            return None;
        };
        let content = envelope.get(FIELD_CONTENT)?.as_array()?.to_vec();
        Some(Self {
            envelope: Arc::clone(envelope),
            content,
            page: envelope.get(FIELD_PAGE).cloned(),
        })
    }

    /// Parsed page metadata. Fails when `page` is missing or malformed.
    pub fn page_info(&self) -> Result<PageInfo, MutationError> {
        let page = self.page.as_ref().ok_or(MutationError::MissingPage)?;
        PageInfo::from_value(page)
    }

    /// Replace the counts on the page object.
    pub fn set_page_info(&mut self, info: PageInfo) {
        let base = self.page.clone().unwrap_or_default();
        self.page = Some(info.write_over(&base));
    }

    pub fn into_value(self) -> CacheValue {
        let mut map = ObjectMap::clone(&self.envelope);
        map.insert(FIELD_CONTENT.to_string(), CacheValue::array(self.content));
        if let Some(page) = self.page {
            map.insert(FIELD_PAGE.to_string(), page);
        }
        CacheValue::object(map)
    }
}
