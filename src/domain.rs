use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::{DateError, LibraryError, ValidationError};

const ID_LEN: usize = 8;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;

/// Canonical book record. Page counts are resolved once when the book enters
/// the system, whatever shape the source used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

impl Book {
    pub fn new(title: impl Into<String>, author: Option<String>, pages: Option<u32>) -> Self {
        Self {
            title: title.into(),
            author,
            pages,
            ..Default::default()
        }
    }

    pub fn pages_or(&self, fallback: u32) -> u32 {
        self.pages.unwrap_or(fallback)
    }

    pub fn author_label(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown author")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub book: Book,
    #[serde(default)]
    pub text: String,
    pub rating: u8,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn date_range(&self) -> Option<DateRange> {
        let (start, end) = (self.start_date?, self.end_date?);
        DateRange::new(start, end).ok()
    }

    pub fn reading_interval(&self) -> Result<ReadingInterval, DateError> {
        let start = self
            .start_date
            .ok_or_else(|| DateError::Invalid("missing start date".to_string()))?;
        let end = self
            .end_date
            .ok_or_else(|| DateError::Invalid("missing end date".to_string()))?;
        Ok(ReadingInterval::from_review(self, DateRange::new(start, end)?))
    }
}

/// One finished read placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingInterval {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub title: String,
    pub author: Option<String>,
    pub rating: u8,
    pub pages: Option<u32>,
}

impl ReadingInterval {
    fn from_review(review: &Review, range: DateRange) -> Self {
        Self {
            id: review.id.clone(),
            start_date: range.start,
            end_date: range.end,
            title: review.book.title.clone(),
            author: review.book.author.clone(),
            rating: review.rating,
            pages: review.book.pages,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn overlaps(&self, other: &ReadingInterval) -> bool {
        self.range().overlaps(&other.range())
    }

    pub fn span_days(&self) -> i64 {
        self.range().span_days()
    }
}

/// Builds timeline intervals, skipping reviews without a usable date pair.
pub fn reading_intervals(reviews: &[Review]) -> Vec<ReadingInterval> {
    reviews
        .iter()
        .filter_map(|review| match review.reading_interval() {
            Ok(interval) => Some(interval),
            Err(err) => {
                warn!("review {} left off the timeline: {err}", review.id);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: String,
    pub book: Book,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: u8,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new review, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    pub title: String,
    pub author: Option<String>,
    pub pages: Option<u32>,
    pub rating: i64,
    pub start_date: String,
    pub end_date: String,
    pub text: String,
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<(Book, u8, DateRange), ValidationError> {
        let title = required_text(&self.title, "title")?;
        let rating = check_rating(self.rating)?;
        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        let pages = self.pages.filter(|pages| *pages > 0);
        let book = Book::new(title, optional_text(self.author.as_deref()), pages);
        Ok((book, rating, range))
    }

    pub fn into_review(self, now: DateTime<Utc>) -> Result<Review, ValidationError> {
        let (book, rating, range) = self.validate()?;
        Ok(Review {
            id: generate_id(),
            user_id: None,
            book,
            text: self.text.trim().to_string(),
            rating,
            start_date: Some(range.start),
            end_date: Some(range.end),
            created_at: Some(now),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct WishlistDraft {
    pub book: Book,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub is_public: bool,
}

impl WishlistDraft {
    pub fn into_item(self, now: DateTime<Utc>) -> Result<WishlistItem, ValidationError> {
        let title = required_text(&self.book.title, "book")?;
        let priority = match self.priority {
            Some(value) => check_priority(value)?,
            None => DEFAULT_PRIORITY,
        };
        Ok(WishlistItem {
            id: generate_id(),
            book: Book { title, ..self.book },
            description: optional_text(self.description.as_deref()),
            priority,
            is_public: self.is_public,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a wishlist entry; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct WishlistPatch {
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub is_public: Option<bool>,
}

impl WishlistPatch {
    pub fn apply(&self, item: &mut WishlistItem, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let priority = self.priority.map(check_priority).transpose()?;
        if let Some(description) = &self.description {
            item.description = optional_text(Some(description));
        }
        if let Some(priority) = priority {
            item.priority = priority;
        }
        if let Some(is_public) = self.is_public {
            item.is_public = is_public;
        }
        item.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryHeader {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
}

impl LibraryHeader {
    pub fn new() -> Self {
        Self {
            schema_version: 1,
            created_at: Utc::now(),
            owner: None,
            wishlist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Library {
    pub header: LibraryHeader,
    pub reviews: Vec<Review>,
}

impl Library {
    pub fn new() -> Self {
        Self {
            header: LibraryHeader::new(),
            reviews: Vec::new(),
        }
    }

    pub fn review(&self, id: &str) -> Option<&Review> {
        self.reviews.iter().find(|review| review.id == id)
    }

    pub fn wishlist_item(&self, id: &str) -> Option<&WishlistItem> {
        self.header.wishlist.iter().find(|item| item.id == id)
    }

    pub fn intervals(&self) -> Vec<ReadingInterval> {
        reading_intervals(&self.reviews)
    }

    pub fn add_review(&mut self, draft: ReviewDraft, now: DateTime<Utc>) -> Result<String, LibraryError> {
        let review = draft.into_review(now)?;
        let id = review.id.clone();
        self.reviews.push(review);
        Ok(id)
    }

    pub fn remove_review(&mut self, id: &str) -> Result<Review, LibraryError> {
        let index = self
            .reviews
            .iter()
            .position(|review| review.id == id)
            .ok_or_else(|| LibraryError::ReviewNotFound(id.to_string()))?;
        Ok(self.reviews.remove(index))
    }

    /// Inserts or replaces reviews by id. Returns `(added, updated)`.
    pub fn merge_reviews(&mut self, incoming: Vec<Review>) -> (usize, usize) {
        let mut added = 0;
        let mut updated = 0;
        for review in incoming {
            match self.reviews.iter_mut().find(|existing| existing.id == review.id) {
                Some(existing) => {
                    *existing = review;
                    updated += 1;
                }
                None => {
                    self.reviews.push(review);
                    added += 1;
                }
            }
        }
        (added, updated)
    }

    pub fn add_wishlist_item(&mut self, draft: WishlistDraft, now: DateTime<Utc>) -> Result<String, LibraryError> {
        let item = draft.into_item(now)?;
        let id = item.id.clone();
        self.header.wishlist.push(item);
        Ok(id)
    }

    pub fn upsert_wishlist_item(&mut self, item: WishlistItem) {
        match self.header.wishlist.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.header.wishlist.push(item),
        }
    }

    pub fn update_wishlist_item(
        &mut self,
        id: &str,
        patch: &WishlistPatch,
        now: DateTime<Utc>,
    ) -> Result<&WishlistItem, LibraryError> {
        let item = self
            .header
            .wishlist
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| LibraryError::WishlistItemNotFound(id.to_string()))?;
        patch.apply(item, now)?;
        Ok(&*item)
    }

    pub fn remove_wishlist_item(&mut self, id: &str) -> Result<WishlistItem, LibraryError> {
        let index = self
            .header
            .wishlist
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| LibraryError::WishlistItemNotFound(id.to_string()))?;
        Ok(self.header.wishlist.remove(index))
    }

    /// Highest priority first, then oldest first.
    pub fn wishlist_by_priority(&self, public_only: bool) -> Vec<&WishlistItem> {
        let mut items = self
            .header
            .wishlist
            .iter()
            .filter(|item| !public_only || item.is_public)
            .collect::<Vec<_>>();
        items.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.created_at.cmp(&right.created_at))
        });
        items
    }
}

/// Rating bounds shared by review drafts and the dashboard prompts.
pub fn check_rating(rating: i64) -> Result<u8, ValidationError> {
    if (MIN_RATING as i64..=MAX_RATING as i64).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(ValidationError::Rating(rating))
    }
}

fn check_priority(priority: i64) -> Result<u8, ValidationError> {
    if (MIN_PRIORITY as i64..=MAX_PRIORITY as i64).contains(&priority) {
        Ok(priority as u8)
    } else {
        Err(ValidationError::Priority(priority))
    }
}

pub fn required_text(input: &str, field_name: &'static str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field_name));
    }
    Ok(value.to_string())
}

pub fn optional_text(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
