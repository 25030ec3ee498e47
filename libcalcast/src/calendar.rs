//! Calendar arithmetic for the month view
//!
//! Days are compared on the naive wall-clock date stored in
//! `Post::scheduled_date`, which is the user's local calendar.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};

use crate::types::Post;
use crate::{CalcastError, Result};

/// Posts scheduled on `day`, in collection order
pub fn posts_on_day(posts: &[Post], day: NaiveDate) -> Vec<Post> {
    posts
        .iter()
        .filter(|p| p.scheduled_date.date() == day)
        .cloned()
        .collect()
}

/// One month of the calendar grid, weeks starting on Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthView {
    year: i32,
    month: u32,
}

impl MonthView {
    /// Months whose successor chrono cannot represent are rejected, so
    /// `next()` on a constructed view always lands on a valid month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let next_first = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.checked_add_months(Months::new(1)));
        if next_first.is_none() {
            return Err(CalcastError::InvalidInput(format!(
                "Invalid month {}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse "YYYY-MM"
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || {
            CalcastError::InvalidInput(format!("Invalid month '{}'. Use YYYY-MM", input))
        };
        let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in the constructors
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        (28..=31)
            .rev()
            .find(|&day| NaiveDate::from_ymd_opt(self.year, self.month, day).is_some())
            .unwrap_or(28)
    }

    /// Empty cells before the 1st when weeks start on Sunday
    pub fn leading_padding(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Grid rows: `None` for padding cells, `Some(day)` for days of the month
    pub fn weeks(&self) -> Vec<Vec<Option<u32>>> {
        let mut cells: Vec<Option<u32>> = (0..self.leading_padding()).map(|_| None).collect();
        cells.extend((1..=self.days_in_month()).map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|week| week.to_vec()).collect()
    }

    /// This month's posts grouped by day of month
    pub fn posts_by_day(&self, posts: &[Post]) -> BTreeMap<u32, Vec<Post>> {
        let mut by_day: BTreeMap<u32, Vec<Post>> = BTreeMap::new();
        for post in posts {
            let date = post.scheduled_date.date();
            if self.contains(date) {
                by_day.entry(date.day()).or_default().push(post.clone());
            }
        }
        by_day
    }
}

impl std::fmt::Display for MonthView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first_day().format("%B %Y"))
    }
}
