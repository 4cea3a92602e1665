use chrono::Local;

use crate::VocabMaster;
use crate::engine::quiz::PerformanceBand;
use crate::engine::stats::{Achievement, Dashboard};
use crate::engine::timer::format_clock;
use crate::model::{QuizListing, QuizResult, StudyState};

// ── ANSI colors ──────────────────────────────────────────────────────────

pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

const BLOCK: char = '█';
const PARTIAL_BLOCKS: [char; 7] = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];

const RECENT_QUIZZES: usize = 10;

/// Horizontal bar `value / max` of `width` cells, in eighths of a cell.
pub fn render_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let eighths = (value.min(max) * width * 8) / max;
    let mut bar: String = std::iter::repeat_n(BLOCK, eighths / 8).collect();
    if eighths % 8 > 0 {
        bar.push(PARTIAL_BLOCKS[eighths % 8 - 1]);
    }
    bar
}

pub fn band_color(band: PerformanceBand) -> &'static str {
    match band {
        PerformanceBand::Outstanding => GREEN,
        PerformanceBand::Great => BLUE,
        PerformanceBand::Good => CYAN,
        PerformanceBand::KeepPracticing => YELLOW,
    }
}

fn study_time_label(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Most recent first.
fn recent_quizzes(state: &StudyState, limit: usize) -> Vec<&QuizResult> {
    state
        .study_stats
        .quiz_scores
        .iter()
        .rev()
        .take(limit)
        .collect()
}

// ── Printing ────────────────────────────────────────────────────────────

fn print_header(title: &str) {
    println!();
    println!("{BOLD}{CYAN}── {title} ─────────────────────────────────────────{RESET}");
    println!();
}

fn print_overview(board: &Dashboard) {
    print_header("Overview");

    let ratio_row = |label: &str, count: usize, pct: u32, color: &str| {
        println!(
            "  {label:<16}{BOLD}{count:>5}{RESET}  {DIM}({pct:>3}%){RESET}  {color}{}{RESET}",
            render_bar(pct as usize, 100, 30)
        );
    };
    println!("  {:<16}{BOLD}{:>5}{RESET}", "Words", board.total_words);
    ratio_row("Mastered", board.mastered_count, board.mastered_percentage, GREEN);
    ratio_row("Bookmarked", board.bookmarked_count, board.bookmarked_percentage, YELLOW);
    println!("  {:<16}{:>5}", "Cards studied", board.cards_studied);
    println!("  {:<16}{:>5}", "Card flips", board.total_flips);
    println!(
        "  {:<16}{:>5}",
        "Study time",
        study_time_label(board.study_time_minutes)
    );
    println!("  {:<16}{:>5} {DIM}days{RESET}", "Streak", board.study_streak);
    println!("  {:<16}{:>5}", "Quizzes taken", board.quizzes_taken);
    println!(
        "  {:<16}{:>5}",
        "Avg accuracy",
        format!("{}%", board.average_quiz_accuracy)
    );
}

fn print_mastery(distribution: &[usize; 6]) {
    print_header("Mastery Distribution");

    let total: usize = distribution.iter().sum();
    if total == 0 {
        println!("  {DIM}No words loaded.{RESET}");
        return;
    }

    let colors = [DIM, RED, YELLOW, YELLOW, CYAN, GREEN];
    let max = distribution.iter().copied().max().unwrap_or(0);
    for (level, &count) in distribution.iter().enumerate() {
        let label = match level {
            0 => "new".to_string(),
            5 => "mastered".to_string(),
            n => format!("level {n}"),
        };
        println!(
            "  {label:<10}{count:>5}  {}{}{RESET}",
            colors[level],
            render_bar(count, max, 40)
        );
    }
}

fn print_achievements(state: &StudyState) {
    print_header("Achievements");

    for achievement in Achievement::ALL {
        if achievement.is_earned(state) {
            println!(
                "  {GREEN}✓{RESET} {BOLD}{:<18}{RESET}{}",
                achievement.name(),
                achievement.description()
            );
        } else {
            println!(
                "  {DIM}· {:<18}{}{RESET}",
                achievement.name(),
                achievement.description()
            );
        }
    }
}

fn print_recent(results: &[&QuizResult], listings: &[QuizListing]) {
    print_header("Recent Quizzes");

    if results.is_empty() {
        println!("  {DIM}No quizzes taken yet.{RESET}");
        return;
    }

    for result in results {
        let title = listings
            .iter()
            .find(|l| l.id == result.quiz_id)
            .map(|l| l.title.as_str())
            .unwrap_or(result.quiz_id.as_str());
        let band = PerformanceBand::for_percentage(result.accuracy);
        let when = result.date.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!(
            "  {DIM}{when}{RESET}  {title:<28} {:>3}/{:<3} {}{:>4}%{RESET}  {DIM}{}{RESET}",
            result.score,
            result.total,
            band_color(band),
            result.accuracy,
            format_clock(result.time_spent as i64),
        );
    }
}

fn print_catalog(listings: &[QuizListing]) {
    print_header("Quiz Catalog");

    if listings.is_empty() {
        println!("  {DIM}No quizzes found.{RESET}");
        return;
    }

    let id_width = listings.iter().map(|l| l.id.len()).max().unwrap_or(4).max(4);
    println!(
        "  {BOLD}{:<id_width$}  {:<5} {:>4}  {:>8}  {:>4}  {:>4}{RESET}",
        "Quiz", "Level", "Qs", "Attempts", "Best", "Avg"
    );
    println!("  {DIM}{}{RESET}", "─".repeat(id_width + 36));
    for l in listings {
        let best_color = if l.summary.attempts == 0 {
            DIM
        } else {
            band_color(PerformanceBand::for_percentage(l.summary.best))
        };
        println!(
            "  {:<id_width$}  {:<5} {:>4}  {:>8}  {best_color}{:>3}%{RESET}  {:>3}%",
            l.id,
            l.difficulty.code(),
            l.questions,
            l.summary.attempts,
            l.summary.best,
            l.summary.average,
        );
    }
}

// ── Public entry point ──────────────────────────────────────────────────

pub fn run(vm: &VocabMaster) {
    println!("{BOLD}{MAGENTA}vocab-master progress{RESET}");

    let board = vm.dashboard();
    let listings = vm.quiz_listings();

    print_overview(&board);
    print_mastery(&board.mastery_distribution);
    print_achievements(vm.state());
    print_recent(&recent_quizzes(vm.state(), RECENT_QUIZZES), &listings);
    print_catalog(&listings);

    println!();
}
