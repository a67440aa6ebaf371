use serde::Serialize;

use crate::errors::ApiError;

/// Hard ceiling on `page` so `(page - 1) * page_size` can never get anywhere
/// near overflow or a pathological OFFSET.
const MAX_PAGE: i64 = 10_000_000;
const MAX_PAGE_SIZE: i64 = 100;

/// Validated pagination and sort parameters for a list endpoint.
///
/// The sort value is checked verbatim against the resource's safe-list, which
/// is the only defense between client input and the ORDER BY clause. Anything
/// outside the safe-list is a validation error, never silently dropped.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    sort: String,
}

impl Filters {
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        sort: Option<&str>,
        sort_safe_list: &'static [&'static str],
    ) -> Result<Filters, ApiError> {
        let page = parse_positive_int("page", page, 1, MAX_PAGE)?;
        let page_size = parse_positive_int("page_size", page_size, 20, MAX_PAGE_SIZE)?;

        let sort = sort.unwrap_or("id").to_string();
        if !sort_safe_list.contains(&sort.as_str()) {
            return Err(ApiError::validation(
                "sort",
                format!(
                    "invalid sort value '{}', must be one of: {}",
                    sort,
                    sort_safe_list.join(", ")
                ),
            ));
        }

        Ok(Filters {
            page,
            page_size,
            sort,
        })
    }

    /// The column to sort by, leading `-` stripped. `parse` is the only
    /// constructor, so the value is always a safe-list member.
    pub fn sort_column(&self) -> &str {
        self.sort.trim_start_matches('-')
    }

    pub fn sort_direction(&self) -> &'static str {
        if self.sort.starts_with('-') {
            "DESC"
        } else {
            "ASC"
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn parse_positive_int(
    field: &str,
    raw: Option<&str>,
    default: i64,
    max: i64,
) -> Result<i64, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ApiError::validation(field, "must be an integer"))?;
    if value < 1 {
        return Err(ApiError::validation(field, "must be greater than zero"));
    }
    if value > max {
        return Err(ApiError::validation(
            field,
            format!("must be at most {max}"),
        ));
    }
    Ok(value)
}

/// Pagination summary returned alongside every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(rename = "page")]
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    /// Pure computation; an out-of-range page is echoed back unchanged, the
    /// caller simply gets an empty record list.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Metadata {
        let last_page = if total_records == 0 {
            1
        } else {
            (total_records + page_size - 1) / page_size
        };
        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page,
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE_LIST: &[&str] = &["id", "name", "-id", "-name"];

    #[test]
    fn defaults_apply_when_params_absent() {
        let filters = Filters::parse(None, None, None, SAFE_LIST).expect("defaults valid");
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, 20);
        assert_eq!(filters.sort_column(), "id");
        assert_eq!(filters.sort_direction(), "ASC");
    }

    #[test]
    fn descending_sort_resolves_column_and_direction() {
        let filters = Filters::parse(None, None, Some("-name"), SAFE_LIST).expect("valid sort");
        assert_eq!(filters.sort_column(), "name");
        assert_eq!(filters.sort_direction(), "DESC");
    }

    #[test]
    fn sort_outside_safe_list_is_rejected_with_allowed_values() {
        let err = Filters::parse(None, None, Some("droptable"), SAFE_LIST).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let msg = errors.get("sort").expect("sort error present");
                assert!(msg.contains("droptable"));
                assert!(msg.contains("id, name, -id, -name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn injection_shaped_sort_is_rejected() {
        let err = Filters::parse(None, None, Some("id; DROP TABLE users--"), SAFE_LIST);
        assert!(err.is_err());
    }

    #[test]
    fn page_bounds_are_enforced() {
        assert!(Filters::parse(Some("0"), None, None, SAFE_LIST).is_err());
        assert!(Filters::parse(Some("-3"), None, None, SAFE_LIST).is_err());
        assert!(Filters::parse(Some("10000001"), None, None, SAFE_LIST).is_err());
        assert!(Filters::parse(Some("banana"), None, None, SAFE_LIST).is_err());
        assert!(Filters::parse(Some("10000000"), None, None, SAFE_LIST).is_ok());
    }

    #[test]
    fn page_size_is_capped_at_one_hundred() {
        assert!(Filters::parse(None, Some("101"), None, SAFE_LIST).is_err());
        let filters = Filters::parse(None, Some("100"), None, SAFE_LIST).expect("100 allowed");
        assert_eq!(filters.limit(), 100);
    }

    #[test]
    fn limit_and_offset_derive_from_page() {
        let filters =
            Filters::parse(Some("3"), Some("25"), Some("name"), SAFE_LIST).expect("valid");
        assert_eq!(filters.limit(), 25);
        assert_eq!(filters.offset(), 50);
    }

    #[test]
    fn metadata_rounds_last_page_up() {
        let metadata = Metadata::calculate(45, 2, 20);
        assert_eq!(
            metadata,
            Metadata {
                current_page: 2,
                page_size: 20,
                first_page: 1,
                last_page: 3,
                total_records: 45,
            }
        );
    }

    #[test]
    fn metadata_for_empty_result_set() {
        let metadata = Metadata::calculate(0, 1, 20);
        assert_eq!(metadata.last_page, 1);
        assert_eq!(metadata.total_records, 0);
        assert_eq!(metadata.current_page, 1);
    }

    #[test]
    fn metadata_echoes_out_of_range_page() {
        let metadata = Metadata::calculate(10, 9, 20);
        assert_eq!(metadata.current_page, 9);
        assert_eq!(metadata.last_page, 1);
    }

    #[test]
    fn metadata_serializes_with_wire_field_names() {
        let metadata = Metadata::calculate(45, 2, 20);
        let json = serde_json::to_value(&metadata).expect("serializable");
        assert_eq!(json["page"], 2);
        assert_eq!(json["page_size"], 20);
        assert_eq!(json["first_page"], 1);
        assert_eq!(json["last_page"], 3);
        assert_eq!(json["total_records"], 45);
    }
}
