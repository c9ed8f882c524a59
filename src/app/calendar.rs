use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

use crate::domain::post::{Post, PostStatus};

/// Cells shown per day before the "+N more" overflow indicator.
const MAX_ENTRIES_PER_CELL: usize = 3;

/// One slot in the month grid. `date` is None for the leading blanks that
/// pad the first week (Sunday-first, as rendered).
#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    pub is_today: bool,
    pub posts: Vec<CalendarEntry>,
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    pub id: uuid::Uuid,
    pub scheduled_time: String,
    pub status: PostStatus,
    pub content: String,
}

impl CalendarEntry {
    fn from_post(post: &Post) -> Self {
        let time = post.scheduled_at.time();
        Self {
            id: post.id,
            scheduled_time: format!("{:02}:{:02}", time.hour(), time.minute()),
            status: post.status,
            content: snippet(&post.content),
        }
    }
}

fn snippet(content: &str) -> String {
    const SNIPPET_CHARS: usize = 80;
    if content.chars().count() <= SNIPPET_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut)
    }
}

/// Projects a post list onto a displayed month. Pure function of its
/// arguments; `today` must be computed once per render pass by the caller
/// so repeated projection within one pass cannot highlight different days.
pub fn month_grid(posts: &[Post], year: i32, month: Month, today: Date) -> Vec<DayCell> {
    let first = match Date::from_calendar_date(year, month, 1) {
        Ok(date) => date,
        // Out-of-range year; nothing to display.
        Err(_) => return Vec::new(),
    };

    let leading = first.weekday().number_days_from_sunday() as usize;
    let days = month.length(year);

    let mut cells = Vec::with_capacity(leading + days as usize);
    for _ in 0..leading {
        cells.push(DayCell {
            date: None,
            is_today: false,
            posts: Vec::new(),
            overflow: 0,
        });
    }

    for day in 1..=days {
        // Within month length by construction.
        let Ok(date) = Date::from_calendar_date(year, month, day) else {
            continue;
        };
        let mut on_day: Vec<CalendarEntry> = posts
            .iter()
            .filter(|post| post.scheduled_at.date() == date)
            .map(CalendarEntry::from_post)
            .collect();
        let overflow = on_day.len().saturating_sub(MAX_ENTRIES_PER_CELL);
        on_day.truncate(MAX_ENTRIES_PER_CELL);

        cells.push(DayCell {
            date: Some(date),
            is_today: date == today,
            posts: on_day,
            overflow,
        });
    }

    cells
}

/// Advances the displayed month by exactly one.
pub fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        _ => (year, month.next()),
    }
}

/// Retreats the displayed month by exactly one.
pub fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        _ => (year, month.previous()),
    }
}

/// The month the "today" action resets to.
pub fn current_month(now: OffsetDateTime) -> (i32, Month) {
    (now.date().year(), now.date().month())
}
