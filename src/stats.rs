use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::domain::{ReadingInterval, Review};

/// Page count used by wraps when a book has none.
pub const WRAP_DEFAULT_PAGES: u32 = 0;
/// Page estimate used by the home summary when a book has none.
// NOTE: differs from WRAP_DEFAULT_PAGES; kept until product decides which one is right.
pub const ESTIMATE_DEFAULT_PAGES: u32 = 300;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateStats {
    pub books_read: usize,
    pub pages_read: u64,
    pub total_reading_days: usize,
    pub avg_days_per_book: f64,
    pub avg_rating: f64,
    pub avg_pages_per_day: f64,
}

pub fn wrap_pages(interval: &ReadingInterval) -> u32 {
    interval.pages.unwrap_or(WRAP_DEFAULT_PAGES)
}

/// Reduces a set of intervals to the numbers shown on the wrap cards.
///
/// Reading days are the union of covered calendar days, so overlapping reads
/// count each day once. The per-book average does not dedupe, so the two
/// figures disagree whenever reads overlap.
pub fn aggregate<F>(intervals: &[ReadingInterval], pages_of: F) -> AggregateStats
where
    F: Fn(&ReadingInterval) -> u32,
{
    let books_read = intervals.len();
    let pages_read = intervals.iter().map(|interval| pages_of(interval) as u64).sum::<u64>();
    let reading_days = intervals
        .iter()
        .flat_map(|interval| interval.range().days())
        .collect::<BTreeSet<NaiveDate>>();
    let total_reading_days = reading_days.len();
    let total_span_days = intervals.iter().map(|interval| interval.span_days()).sum::<i64>();
    let total_rating = intervals.iter().map(|interval| interval.rating as u64).sum::<u64>();

    AggregateStats {
        books_read,
        pages_read,
        total_reading_days,
        avg_days_per_book: ratio(total_span_days as f64, books_read as f64),
        avg_rating: ratio(total_rating as f64, books_read as f64),
        avg_pages_per_day: ratio(pages_read as f64, total_reading_days as f64),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HomeStats {
    pub books_read: usize,
    pub estimated_pages: u64,
    pub books_this_year: usize,
    pub avg_rating: f64,
}

/// Summary for the landing view. Counts every review, dated or not.
pub fn home_stats(reviews: &[Review], today: NaiveDate, default_pages: u32) -> HomeStats {
    let books_read = reviews.len();
    let estimated_pages = reviews
        .iter()
        .map(|review| review.book.pages_or(default_pages) as u64)
        .sum();
    let books_this_year = reviews
        .iter()
        .filter(|review| {
            review
                .end_date
                .or_else(|| review.created_at.map(|created| created.date_naive()))
                .is_some_and(|finished| finished.year() == today.year())
        })
        .count();
    let total_rating = reviews.iter().map(|review| review.rating as u64).sum::<u64>();

    HomeStats {
        books_read,
        estimated_pages,
        books_this_year,
        avg_rating: ratio(total_rating as f64, books_read as f64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMetrics {
    pub total_days: i64,
    pub reflection_days: i64,
    pub review_length: usize,
    pub words_in_review: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    pub pages_per_day: f64,
    pub time_per_page: f64,
    pub review_density: f64,
    pub value_per_page: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewMetrics {
    Basic(BasicMetrics),
    Full(BasicMetrics, PageMetrics),
}

impl ReviewMetrics {
    pub fn basic(&self) -> &BasicMetrics {
        match self {
            ReviewMetrics::Basic(basic) | ReviewMetrics::Full(basic, _) => basic,
        }
    }

    pub fn pages(&self) -> Option<&PageMetrics> {
        match self {
            ReviewMetrics::Basic(_) => None,
            ReviewMetrics::Full(_, pages) => Some(pages),
        }
    }
}

/// Per-review reading metrics. Dates count from midnight UTC. Without a
/// usable date pair the day fields are zero and page metrics are skipped.
pub fn compute_metrics(review: &Review, pages: u32, now: DateTime<Utc>) -> ReviewMetrics {
    let review_length = review.text.chars().count();
    let words_in_review = review.text.split_whitespace().count();

    let (Some(start), Some(end)) = (review.start_date, review.end_date) else {
        return ReviewMetrics::Basic(BasicMetrics {
            total_days: 0,
            reflection_days: 0,
            review_length,
            words_in_review,
        });
    };

    let total_days = ceil_days((end - start).num_milliseconds()).max(1);
    let end_instant = end.and_hms_opt(0, 0, 0).expect("midnight must be valid").and_utc();
    let reflection_days = ceil_days((now - end_instant).num_milliseconds());
    let basic = BasicMetrics {
        total_days,
        reflection_days,
        review_length,
        words_in_review,
    };

    if pages == 0 {
        return ReviewMetrics::Basic(basic);
    }

    let pages = pages as f64;
    ReviewMetrics::Full(
        basic,
        PageMetrics {
            pages_per_day: one_decimal(pages / total_days as f64),
            time_per_page: one_decimal(total_days as f64 / pages),
            review_density: one_decimal(review_length as f64 / pages),
            value_per_page: one_decimal(review.rating as f64 / pages * 100.0),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordWeight {
    pub word: String,
    pub count: usize,
    /// 1 (rare) to 5 (most frequent).
    pub weight: u8,
}

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "because", "been", "before", "being", "but",
    "can", "could", "did", "does", "doing", "down", "each", "even", "few", "for", "from", "had", "has", "have",
    "her", "here", "hers", "him", "his", "how", "into", "its", "just", "like", "more", "most", "much", "not", "now",
    "off", "once", "only", "other", "our", "out", "over", "own", "same", "she", "should", "some", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "until", "very", "was", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "would", "you", "your",
];

/// Most frequent meaningful words across review texts.
pub fn word_cloud<'a, I>(texts: I, limit: usize) -> Vec<WordWeight>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for token in text.split(|ch: char| !ch.is_alphabetic() && ch != '\'') {
            let word = token.trim_matches('\'').to_lowercase();
            if word.chars().count() < 3 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut words = counts.into_iter().collect::<Vec<_>>();
    words.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    words.truncate(limit);

    let max_count = words.first().map(|(_, count)| *count).unwrap_or(1);
    words
        .into_iter()
        .map(|(word, count)| WordWeight {
            weight: (count * 5 / max_count.max(1)).clamp(1, 5) as u8,
            word,
            count,
        })
        .collect()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

fn ceil_days(millis: i64) -> i64 {
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{
        AggregateStats, ESTIMATE_DEFAULT_PAGES, ReviewMetrics, aggregate, compute_metrics, home_stats, word_cloud,
        wrap_pages,
    };
    use crate::domain::{Book, ReadingInterval, Review, reading_intervals};
    use crate::ingest::review_from_api;
    use crate::timeline::pack_intervals;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn review(id: &str, start: NaiveDate, end: NaiveDate, rating: u8, pages: Option<u32>) -> Review {
        Review {
            id: id.to_string(),
            user_id: None,
            book: Book::new(format!("Book {id}"), None, pages),
            text: String::new(),
            rating,
            start_date: Some(start),
            end_date: Some(end),
            created_at: None,
        }
    }

    fn intervals(reviews: &[Review]) -> Vec<ReadingInterval> {
        reading_intervals(reviews)
    }

    #[test]
    fn empty_set_is_all_zero() {
        assert_eq!(aggregate(&[], wrap_pages), AggregateStats::default());
    }

    #[test]
    fn union_of_days_differs_from_average_span() {
        let reviews = [
            review("a", day(2024, 1, 1), day(2024, 1, 10), 4, Some(200)),
            review("b", day(2024, 1, 5), day(2024, 1, 15), 2, None),
        ];
        let stats = aggregate(&intervals(&reviews), wrap_pages);

        assert_eq!(stats.books_read, 2);
        assert_eq!(stats.pages_read, 200);
        assert_eq!(stats.total_reading_days, 15);
        assert_eq!(stats.avg_days_per_book, 10.5);
        assert_eq!(stats.avg_rating, 3.0);
        assert!((stats.avg_pages_per_day - 200.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn fully_overlapping_reads_share_their_days() {
        let reviews = [
            review("a", day(2024, 3, 1), day(2024, 3, 10), 5, None),
            review("b", day(2024, 3, 1), day(2024, 3, 10), 5, None),
        ];
        let stats = aggregate(&intervals(&reviews), wrap_pages);
        assert_eq!(stats.total_reading_days, 10);
        assert_eq!(stats.avg_days_per_book, 10.0);
        assert_eq!(stats.avg_pages_per_day, 0.0);
    }

    #[test]
    fn two_overlapping_reads_scenario() {
        let reviews = [
            review("a", day(2024, 1, 1), day(2024, 1, 5), 5, None),
            review("b", day(2024, 1, 3), day(2024, 1, 8), 3, None),
        ];
        let intervals = intervals(&reviews);
        assert_eq!(pack_intervals(&intervals).len(), 2);

        let stats = aggregate(&intervals, wrap_pages);
        assert_eq!(stats.total_reading_days, 8);
        assert_eq!(stats.avg_rating, 4.0);
    }

    #[test]
    fn missing_page_counts_default_differently_per_view() {
        let with_median = review_from_api(&serde_json::json!({
            "id": "a", "rating": 4, "start_date": "2024-01-01", "end_date": "2024-01-02",
            "book": {"title": "Median", "number_of_pages_median": 250}
        }))
        .unwrap();
        let without_pages = review_from_api(&serde_json::json!({
            "id": "b", "rating": 4, "start_date": "2024-01-01", "end_date": "2024-01-02",
            "book": {"title": "Unknown"}
        }))
        .unwrap();

        let wrap = aggregate(&intervals(&[with_median.clone()]), wrap_pages);
        assert_eq!(wrap.pages_read, 250);
        let wrap = aggregate(&intervals(&[without_pages.clone()]), wrap_pages);
        assert_eq!(wrap.pages_read, 0);

        let today = day(2024, 6, 1);
        let home = home_stats(&[without_pages.clone()], today, ESTIMATE_DEFAULT_PAGES);
        assert_eq!(home.estimated_pages, 300);
        let home = home_stats(&[with_median, without_pages], today, ESTIMATE_DEFAULT_PAGES);
        assert_eq!(home.estimated_pages, 550);
        assert_eq!(home.books_this_year, 2);
        assert_eq!(home.avg_rating, 4.0);
    }

    #[test]
    fn home_stats_count_undated_reviews() {
        let mut undated = review("u", day(2023, 1, 1), day(2023, 1, 2), 2, Some(100));
        undated.start_date = None;
        undated.end_date = None;
        undated.created_at = Some(Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap());
        let stats = home_stats(&[undated], day(2024, 6, 1), ESTIMATE_DEFAULT_PAGES);
        assert_eq!(stats.books_read, 1);
        assert_eq!(stats.estimated_pages, 100);
        assert_eq!(stats.books_this_year, 1);
        assert_eq!(home_stats(&[], day(2024, 6, 1), ESTIMATE_DEFAULT_PAGES).avg_rating, 0.0);
    }

    #[test]
    fn full_metrics_with_page_count() {
        let mut read = review("a", day(2024, 1, 1), day(2024, 1, 11), 4, Some(300));
        read.text = "A quiet, devastating novel".to_string();
        let now = Utc.with_ymd_and_hms(2024, 1, 13, 6, 0, 0).unwrap();

        let metrics = compute_metrics(&read, 300, now);
        let basic = metrics.basic();
        assert_eq!(basic.total_days, 10);
        assert_eq!(basic.reflection_days, 3);
        assert_eq!(basic.review_length, 26);
        assert_eq!(basic.words_in_review, 4);

        let pages = metrics.pages().expect("page metrics");
        assert_eq!(pages.pages_per_day, 30.0);
        assert_eq!(pages.time_per_page, 0.0);
        assert_eq!(pages.review_density, 0.1);
        assert_eq!(pages.value_per_page, 1.3);
    }

    #[test]
    fn same_day_read_counts_one_day_and_future_end_is_negative() {
        let read = review("a", day(2024, 5, 20), day(2024, 5, 20), 5, None);
        let now = Utc.with_ymd_and_hms(2024, 5, 18, 12, 0, 0).unwrap();
        let metrics = compute_metrics(&read, 0, now);
        assert!(matches!(metrics, ReviewMetrics::Basic(_)));
        assert_eq!(metrics.basic().total_days, 1);
        assert_eq!(metrics.basic().reflection_days, -1);
    }

    #[test]
    fn undated_review_gets_basic_metrics() {
        let mut read = review("a", day(2024, 1, 1), day(2024, 1, 2), 5, Some(100));
        read.start_date = None;
        read.text = "short".to_string();
        let metrics = compute_metrics(&read, 100, Utc::now());
        assert_eq!(
            metrics,
            ReviewMetrics::Basic(super::BasicMetrics {
                total_days: 0,
                reflection_days: 0,
                review_length: 5,
                words_in_review: 1,
            })
        );
    }

    #[test]
    fn word_cloud_counts_meaningful_words() {
        let texts = [
            "The dragon was magnificent. Dragons, dragons everywhere!",
            "A dragon story that was slow but magnificent",
            "it is ok",
        ];
        let cloud = word_cloud(texts.iter().copied(), 3);
        let words = cloud.iter().map(|entry| (entry.word.as_str(), entry.count)).collect::<Vec<_>>();
        assert_eq!(words, vec![("dragon", 2), ("dragons", 2), ("magnificent", 2)]);
        assert!(cloud.iter().all(|entry| entry.weight == 5));

        let cloud = word_cloud(["alpha alpha alpha alpha beta"].iter().copied(), 10);
        assert_eq!(cloud[0].weight, 5);
        assert_eq!(cloud[1].weight, 1);
        assert!(word_cloud(std::iter::empty(), 10).is_empty());
    }
}
