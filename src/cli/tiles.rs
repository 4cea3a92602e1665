use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

use crate::cli::stats::{BOLD, DIM, RESET};
use crate::model::{QuizResult, StudyState};

const TILE: &str = "■ ";

// Palette from empty to busiest day.
const SHADES: [(u8, u8, u8); 5] = [
    (22, 27, 34),
    (14, 68, 41),
    (0, 109, 50),
    (38, 166, 65),
    (57, 211, 83),
];

// Upper bound on the calendar range (ten years).
const MAX_WEEKS: usize = 520;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn rgb((r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{r};{g};{b}m")
}

/// Shade index 0..=4 for a day with `count` completions.
fn shade(count: usize, busiest: usize) -> usize {
    match (count, busiest) {
        (0, _) | (_, 0) => 0,
        (c, b) if b <= 4 => c.min(4),
        (c, b) => (c * 4).div_ceil(b).clamp(1, 4),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Day {
    date: NaiveDate,
    quizzes: usize,
}

/// One entry per calendar day from `weeks` weeks ago through `today`,
/// counting quiz completions by local date.
fn daily_counts(results: &[QuizResult], today: NaiveDate, weeks: usize) -> Vec<Day> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for result in results {
        *per_day
            .entry(result.date.with_timezone(&Local).date_naive())
            .or_default() += 1;
    }

    let weeks = weeks.min(MAX_WEEKS) as i64;
    let start = today
        .checked_sub_signed(Duration::weeks(weeks))
        .unwrap_or(NaiveDate::MIN);
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| Day {
            date,
            quizzes: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Columns of days, each starting on a Sunday.
fn week_columns(days: &[Day]) -> Vec<&[Day]> {
    let mut columns = Vec::new();
    let mut begin = 0;
    for (i, day) in days.iter().enumerate() {
        if day.date.weekday() == Weekday::Sun && i > begin {
            columns.push(&days[begin..i]);
            begin = i;
        }
    }
    if begin < days.len() {
        columns.push(&days[begin..]);
    }
    columns
}

/// Longest run of active days, and the run ending today.
fn activity_runs(days: &[Day]) -> (usize, usize) {
    let mut longest = 0;
    let mut run = 0;
    for day in days {
        run = if day.quizzes > 0 { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    (longest, run)
}

fn print_summary(days: &[Day], state: &StudyState) {
    let total: usize = days.iter().map(|d| d.quizzes).sum();
    let active = days.iter().filter(|d| d.quizzes > 0).count();
    let (longest, current) = activity_runs(days);

    println!(
        "{BOLD}{total}{RESET} quizzes in the last {} days   \
         {DIM}Active days:{RESET} {active}   \
         {DIM}Quiz run:{RESET} {current} {DIM}(longest {longest}){RESET}   \
         {DIM}Study streak:{RESET} {}",
        days.len(),
        state.study_stats.study_streak
    );
}

fn print_month_header(columns: &[&[Day]]) {
    let mut line = String::new();
    let mut last_month = 0;
    for (col, week) in columns.iter().enumerate() {
        let month = week[0].date.month();
        if month != last_month {
            let at = col * 2;
            if line.len() < at {
                line.push_str(&" ".repeat(at - line.len()));
            }
            line.push_str(MONTHS[month as usize - 1]);
            last_month = month;
        }
    }
    println!("    {line}");
}

fn print_grid(columns: &[&[Day]], busiest: usize) {
    let labels = ["", "Mon", "", "Wed", "", "Fri", ""];
    for (weekday, label) in labels.iter().enumerate() {
        print!("{DIM}{label:<4}{RESET}");
        for week in columns {
            match week
                .iter()
                .find(|d| d.date.weekday().num_days_from_sunday() as usize == weekday)
            {
                Some(day) => print!("{}{TILE}{RESET}", rgb(SHADES[shade(day.quizzes, busiest)])),
                None => print!("  "),
            }
        }
        println!();
    }
}

fn print_legend() {
    print!("    {DIM}Less{RESET} ");
    for color in SHADES {
        print!("{}{TILE}{RESET}", rgb(color));
    }
    println!("{DIM}More{RESET}");
}

pub fn run(state: &StudyState, today: NaiveDate, weeks: usize) {
    let days = daily_counts(&state.study_stats.quiz_scores, today, weeks);
    let busiest = days.iter().map(|d| d.quizzes).max().unwrap_or(0);

    println!();
    print_summary(&days, state);
    println!();

    let columns = week_columns(&days);
    print_month_header(&columns);
    print_grid(&columns, busiest);
    print_legend();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days(counts: &[usize]) -> Vec<Day> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &quizzes)| Day {
                date: date(2024, 5, 5) + Duration::days(i as i64),
                quizzes,
            })
            .collect()
    }

    #[test]
    fn counts_cover_every_day_through_today() {
        let noon = Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let result = QuizResult {
            id: "r".into(),
            date: noon.with_timezone(&Utc),
            quiz_id: "q".into(),
            score: 1,
            total: 1,
            accuracy: 100,
            time_spent: 10,
            answers: Vec::new(),
        };
        let entries = daily_counts(&[result.clone(), result], date(2024, 5, 12), 1);

        assert_eq!(entries.len(), 8);
        assert_eq!(entries.first().unwrap().date, date(2024, 5, 5));
        assert_eq!(entries.last().unwrap().date, date(2024, 5, 12));
        let busy: Vec<_> = entries.iter().filter(|d| d.quizzes > 0).collect();
        assert_eq!(busy.len(), 1);
        assert_eq!((busy[0].date, busy[0].quizzes), (date(2024, 5, 10), 2));
    }

    #[test]
    fn huge_week_counts_are_capped() {
        let entries = daily_counts(&[], date(2024, 5, 12), usize::MAX);
        assert_eq!(entries.len(), MAX_WEEKS * 7 + 1);
        assert_eq!(entries.last().unwrap().date, date(2024, 5, 12));
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-05-05 was a Sunday.
        let entries = days(&[0; 10]);
        let columns = week_columns(&entries);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].len(), 7);
        assert_eq!(columns[1][0].date.weekday(), Weekday::Sun);
    }

    #[test]
    fn runs_track_longest_and_current() {
        assert_eq!(activity_runs(&days(&[1, 2, 3, 0, 1, 1])), (3, 2));
        assert_eq!(activity_runs(&days(&[1, 1, 0])), (2, 0));
        assert_eq!(activity_runs(&[]), (0, 0));
    }

    #[test]
    fn shades_scale_with_the_busiest_day() {
        assert_eq!(shade(0, 10), 0);
        assert_eq!(shade(3, 3), 3);
        assert_eq!(shade(1, 20), 1);
        assert_eq!(shade(20, 20), 4);
        assert_eq!(shade(11, 20), 3);
    }
}
