//! Blog posts and the reading-time heuristic shown alongside them.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Words per minute assumed by listing cards.
pub const LISTING_WORDS_PER_MINUTE: u32 = 200;

/// Words per minute assumed on the post detail page.
pub const DETAIL_WORDS_PER_MINUTE: u32 = 40;

/// Chinese characters per minute assumed by the home page estimate.
pub const HOME_HAN_CHARS_PER_MINUTE: u64 = 500;

/// Seconds added per embedded markdown image by the home page estimate.
pub const HOME_SECONDS_PER_IMAGE: u64 = 10;

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[.*?\]\(.*?\)").expect("markdown image pattern is valid")
});

/// A stored post. `category` holds the category name, not its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub published: bool,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReadingTime(u32);

impl ReadingTime {
    fn from_minutes(minutes: u64) -> Self {
        Self(u32::try_from(minutes.max(1)).unwrap_or(u32::MAX))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min read", self.0)
    }
}

/// Estimate reading time as whitespace-separated tokens over `words_per_minute`,
/// rounded up, never below one minute.
pub fn reading_time(markdown: &str, words_per_minute: u32) -> ReadingTime {
    let words = markdown.split_whitespace().count() as u64;
    let per_minute = u64::from(words_per_minute.max(1));
    ReadingTime::from_minutes(words.div_ceil(per_minute))
}

/// Home page estimate for mixed Chinese and English bodies: CJK ideographs
/// (`U+4E00..=U+9FA5`) at 500 per minute, the remaining words at 200 per
/// minute and 10 seconds per markdown image, rounded up, never below one.
pub fn home_reading_time(markdown: &str) -> ReadingTime {
    let han = markdown.chars().filter(|c| is_counted_han(*c)).count() as u64;
    let words = markdown
        .split(|c: char| c.is_whitespace() || is_counted_han(c))
        .filter(|word| !word.is_empty())
        .count() as u64;
    let images = MARKDOWN_IMAGE.find_iter(markdown).count() as u64;

    // Sum in 1/3000 minute units, the common denominator of all three rates.
    const UNITS_PER_MINUTE: u64 = 3_000;
    let units = han * (UNITS_PER_MINUTE / HOME_HAN_CHARS_PER_MINUTE)
        + words * (UNITS_PER_MINUTE / u64::from(LISTING_WORDS_PER_MINUTE))
        + images * HOME_SECONDS_PER_IMAGE * UNITS_PER_MINUTE / 60;
    ReadingTime::from_minutes(units.div_ceil(UNITS_PER_MINUTE))
}

fn is_counted_han(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_reads_in_one_minute() {
        assert_eq!(reading_time("just a few words", 200).minutes(), 1);
    }

    #[test]
    fn rounds_up_partial_minutes() {
        let text = "word ".repeat(201);
        assert_eq!(reading_time(&text, 200).minutes(), 2);
        assert_eq!(reading_time(&text, 40).minutes(), 6);
    }

    #[test]
    fn empty_text_still_reads_in_one_minute() {
        assert_eq!(reading_time("  \n\t ", 200).to_string(), "1 min read");
        assert_eq!(home_reading_time("").minutes(), 1);
    }

    #[test]
    fn home_estimate_reads_chinese_faster_than_words() {
        assert_eq!(home_reading_time(&"台".repeat(2500)).to_string(), "5 min read");
        assert_eq!(home_reading_time(&"台".repeat(501)).minutes(), 2);
    }

    #[test]
    fn home_estimate_mixes_words_and_ideographs() {
        // 1000 ideographs (2 min) plus 200 words (1 min).
        let body = format!("{}{}", "大學".repeat(500), " word".repeat(200));
        assert_eq!(home_reading_time(&body).minutes(), 3);

        // Ideographs split adjacent latin text into separate words.
        assert_eq!(home_reading_time("a台b").minutes(), 1);
    }

    #[test]
    fn home_estimate_adds_ten_seconds_per_image() {
        let images = "![Image](https://x.test/a.png)\n".repeat(12);
        // 12 images are 2 minutes; each image line is also one word.
        assert_eq!(home_reading_time(&images).minutes(), 3);
        assert_eq!(home_reading_time(&images[..images.len() / 2]).minutes(), 2);
    }

    #[test]
    fn displays_as_min_read() {
        assert_eq!(reading_time("one two", 200).to_string(), "1 min read");
    }
}
