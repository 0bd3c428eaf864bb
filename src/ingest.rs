//! Converts review-service payloads into the canonical domain types.
//!
//! The service has shipped several shapes over time: dates in snake_case or
//! camelCase, and page counts under half a dozen field names. All of that is
//! resolved here so the rest of the crate only sees [`Book`] and [`Review`].

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde_json::{Map, Value};

use crate::dates::{DateRange, parse_date};
use crate::domain::{Book, DEFAULT_PRIORITY, MAX_PRIORITY, MAX_RATING, MIN_PRIORITY, MIN_RATING, Review, WishlistItem};
use crate::error::IngestError;

/// Date fields that may arrive in either casing.
const DATE_FIELD_PAIRS: [(&str, &str); 2] = [("start_date", "startDate"), ("end_date", "endDate")];

/// Copies each date into both casings, preferring whichever is present
/// and non-null, snake_case first.
pub fn normalize_review_dates(review: &mut Map<String, Value>) {
    for (snake, camel) in DATE_FIELD_PAIRS {
        let value = [snake, camel]
            .iter()
            .filter_map(|key| review.get(*key))
            .find(|value| !value.is_null())
            .cloned();
        if let Some(value) = value {
            review.insert(snake.to_string(), value.clone());
            review.insert(camel.to_string(), value);
        }
    }
}

/// First numeric page count found, in the order the service's shapes were
/// introduced. Zero or negative counts are treated as absent.
pub fn resolve_pages(book: &Value) -> Option<u32> {
    let direct = ["numberOfPagesMedian", "number_of_pages_median", "number_of_pages", "numberOfPages"];
    direct
        .iter()
        .filter_map(|key| book.get(*key))
        .chain(book.get("medium").and_then(|medium| medium.get("pages")))
        .chain(book.get("pages"))
        .find_map(page_count)
}

/// A JSON number, or a string holding one.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn page_count(value: &Value) -> Option<u32> {
    let pages = numeric(value)?;
    if pages >= 1.0 {
        Some(pages.round().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}

pub fn book_from_api(value: &Value) -> Book {
    let title = string_field(value, &["title", "name"]).unwrap_or_else(|| "Untitled".to_string());
    let author = string_field(value, &["author", "authorName"])
        .or_else(|| first_of_array(value, "author_name"))
        .or_else(|| {
            value
                .get("authors")
                .and_then(Value::as_array)
                .and_then(|authors| authors.first())
                .and_then(|author| match author {
                    Value::String(name) => Some(name.clone()),
                    other => other.get("name").and_then(Value::as_str).map(str::to_string),
                })
        });
    let isbn = string_field(value, &["isbn"]).or_else(|| first_of_array(value, "isbn"));
    let cover_id = ["cover_i", "cover_id", "coverId"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(Value::as_i64);

    Book {
        key: string_field(value, &["key", "ol_key", "olKey"]),
        title,
        author,
        pages: resolve_pages(value),
        cover_id,
        isbn,
    }
}

pub fn review_from_api(value: &Value) -> Result<Review, IngestError> {
    let mut object = value.as_object().cloned().ok_or(IngestError::NotAnObject)?;
    normalize_review_dates(&mut object);
    let id = id_field(&object, "id").ok_or(IngestError::MissingField("id"))?;
    let book = object
        .get("book")
        .map(book_from_api)
        .ok_or(IngestError::MissingField("book"))?;

    let rating = object
        .get("rating")
        .and_then(numeric)
        .ok_or(IngestError::MissingField("rating"))?
        .round() as i64;
    let clamped = rating.clamp(MIN_RATING as i64, MAX_RATING as i64);
    if clamped != rating {
        warn!("review {id}: rating {rating} clamped to {clamped}");
    }

    let mut start_date = review_date(&object, &id, "start_date");
    let mut end_date = review_date(&object, &id, "end_date");
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if let Err(err) = DateRange::new(start, end) {
            warn!("review {id}: {err}; dates ignored");
            start_date = None;
            end_date = None;
        }
    }

    Ok(Review {
        user_id: id_field(&object, "user_id").or_else(|| id_field(&object, "userId")),
        book,
        text: string_field(value, &["text", "content"]).unwrap_or_default(),
        rating: clamped as u8,
        start_date,
        end_date,
        created_at: timestamp_field(&object, &["created_at", "createdAt"]),
        id,
    })
}

/// Converts a review list, dropping malformed entries with a warning.
pub fn reviews_from_api(values: &[Value]) -> Vec<Review> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match review_from_api(value) {
            Ok(review) => Some(review),
            Err(err) => {
                warn!("skipping review #{index}: {err}");
                None
            }
        })
        .collect()
}

pub fn wishlist_item_from_api(value: &Value) -> Result<WishlistItem, IngestError> {
    let object = value.as_object().ok_or(IngestError::NotAnObject)?;
    let id = id_field(object, "id").ok_or(IngestError::MissingField("id"))?;
    let book = object
        .get("book")
        .map(book_from_api)
        .ok_or(IngestError::MissingField("book"))?;
    let priority = object
        .get("priority")
        .and_then(Value::as_i64)
        .map(|priority| priority.clamp(MIN_PRIORITY as i64, MAX_PRIORITY as i64) as u8)
        .unwrap_or(DEFAULT_PRIORITY);
    let is_public = ["isPublic", "is_public"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(Value::as_bool)
        .unwrap_or(false);
    let created_at = timestamp_field(object, &["createdAt", "created_at"]).unwrap_or_else(Utc::now);
    let updated_at = timestamp_field(object, &["updatedAt", "updated_at"]).unwrap_or(created_at);

    Ok(WishlistItem {
        id,
        book,
        description: string_field(value, &["description"]).filter(|text| !text.trim().is_empty()),
        priority,
        is_public,
        created_at,
        updated_at,
    })
}

pub fn wishlist_from_api(values: &[Value]) -> Vec<WishlistItem> {
    values
        .iter()
        .filter_map(|value| match wishlist_item_from_api(value) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping wishlist item: {err}");
                None
            }
        })
        .collect()
}

fn review_date(object: &Map<String, Value>, id: &str, field: &str) -> Option<NaiveDate> {
    let raw = object.get(field)?.as_str()?;
    match parse_date(raw) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("review {id}: {field} treated as absent: {err}");
            None
        }
    }
}

fn id_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(Value::as_str)
        .map(str::to_string)
}

fn first_of_array(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_array()?
        .iter()
        .find_map(Value::as_str)
        .map(str::to_string)
}

fn timestamp_field(object: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
}
