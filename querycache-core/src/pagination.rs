//! Page metadata of paginated envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::MutationError;
use crate::value::{CacheValue, ObjectMap};

pub const FIELD_SIZE: &str = "size";
pub const FIELD_NUMBER: &str = "number";
pub const FIELD_TOTAL_ELEMENTS: &str = "totalElements";
pub const FIELD_TOTAL_PAGES: &str = "totalPages";

/// `ceil(total_elements / size)`.
///
/// A negative total counts as zero. A non-positive size is rejected.
pub fn total_pages(total_elements: i64, size: i64) -> Result<i64, MutationError> {
    if size <= 0 {
        return Err(MutationError::InvalidPageSize { size });
    }
    let total = total_elements.max(0);
    Ok(total / size + i64::from(total % size != 0))
}

/// The `page` object of a paginated envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub size: i64,
    pub number: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl PageInfo {
    /// Read page metadata from a cached `page` value.
    pub fn from_value(page: &CacheValue) -> Result<Self, MutationError> {
        let map = page.as_object().ok_or_else(|| MutationError::InvalidPageField {
            field: "page".to_string(),
            reason: format!("expected object, got {}", page.kind()),
        })?;
        Ok(Self {
            size: read_count(map, FIELD_SIZE)?,
            number: read_count(map, FIELD_NUMBER)?,
            total_elements: read_count(map, FIELD_TOTAL_ELEMENTS)?,
            total_pages: read_count(map, FIELD_TOTAL_PAGES)?,
        })
    }

    /// Set a new element count and recompute the page count. `size` is kept.
    pub fn with_total_elements(self, total_elements: i64) -> Result<Self, MutationError> {
        Ok(Self {
            total_elements,
            total_pages: total_pages(total_elements, self.size)?,
            ..self
        })
    }

    /// Write the counts back over the original `page` value, keeping any
    /// other fields it carries.
    pub fn write_over(&self, page: &CacheValue) -> CacheValue {
        let mut map = page.as_object().cloned().unwrap_or_default();
        map.insert(
            FIELD_TOTAL_ELEMENTS.to_string(),
            CacheValue::Number(Number::from(self.total_elements)),
        );
        map.insert(
            FIELD_TOTAL_PAGES.to_string(),
            CacheValue::Number(Number::from(self.total_pages)),
        );
        CacheValue::object(map)
    }
}

fn read_count(map: &ObjectMap, field: &str) -> Result<i64, MutationError> {
    let invalid = |reason: String| MutationError::InvalidPageField {
        field: field.to_string(),
        reason,
    };
    let value = map
        .get(field)
        .ok_or_else(|| invalid("missing".to_string()))?;
    let number = value
        .as_number()
        .ok_or_else(|| invalid(format!("expected number, got {}", value.kind())))?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    // Integral floats such as 10.0 are accepted.
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(invalid(format!("expected integer, got {}", number))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), Ok(0));
        assert_eq!(total_pages(1, 10), Ok(1));
        assert_eq!(total_pages(10, 10), Ok(1));
        assert_eq!(total_pages(11, 10), Ok(2));
        assert_eq!(total_pages(3, 1), Ok(3));
    }

    #[test]
    fn test_total_pages_negative_total_is_zero() {
        assert_eq!(total_pages(-4, 10), Ok(0));
    }

    #[test]
    fn test_total_pages_rejects_zero_size() {
        assert_eq!(
            total_pages(5, 0),
            Err(MutationError::InvalidPageSize { size: 0 })
        );
    }

    #[test]
    fn test_page_info_from_value() {
        let page = CacheValue::from(json!({
            "size": 10, "number": 0, "totalElements": 2, "totalPages": 1
        }));
        let info = PageInfo::from_value(&page).unwrap();
        assert_eq!(
            info,
            PageInfo {
                size: 10,
                number: 0,
                total_elements: 2,
                total_pages: 1
            }
        );
    }

    #[test]
    fn test_page_info_accepts_integral_floats() {
        let page = CacheValue::from(json!({
            "size": 10.0, "number": 0, "totalElements": 2.0, "totalPages": 1
        }));
        let info = PageInfo::from_value(&page).unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.total_elements, 2);
    }

    #[test]
    fn test_page_info_missing_field() {
        let page = CacheValue::from(json!({"size": 10, "number": 0, "totalPages": 1}));
        let err = PageInfo::from_value(&page).unwrap_err();
        assert!(matches!(
            err,
            MutationError::InvalidPageField { ref field, .. } if field == "totalElements"
        ));
    }

    #[test]
    fn test_page_info_not_an_object() {
        let err = PageInfo::from_value(&CacheValue::from(json!([1]))).unwrap_err();
        assert!(matches!(err, MutationError::InvalidPageField { ref field, .. } if field == "page"));
    }

    #[test]
    fn test_write_over_keeps_extra_fields() {
        let page = CacheValue::from(json!({
            "size": 10, "number": 3, "totalElements": 2, "totalPages": 1, "sort": "asc"
        }));
        let info = PageInfo::from_value(&page)
            .unwrap()
            .with_total_elements(25)
            .unwrap();
        let written = info.write_over(&page);
        assert_eq!(
            written.to_json(),
            json!({"size": 10, "number": 3, "totalElements": 25, "totalPages": 3, "sort": "asc"})
        );
    }
}
