use std::io::{Write, stdout};

use chrono::Utc;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{self, ClearType},
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use vocab_master::VocabMaster;
use vocab_master::cli::stats::{BOLD, DIM, GREEN, RED, RESET, YELLOW, band_color};
use vocab_master::config::{DataArgs, init_logging};
use vocab_master::engine::generate::PoolFilter;
use vocab_master::engine::quiz::{Advance, AnswerFilter, QuizOutcome, QuizRunner};
use vocab_master::engine::study::StudyStore;
use vocab_master::engine::timer::{StudyTimer, format_clock};
use vocab_master::error::AppError;
use vocab_master::model::{Difficulty, QuizMode};
use vocab_master::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "vocab-master-quiz", about = "Interactive multiple-choice vocabulary quiz")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    /// Quiz id from the catalog (interactive picker if omitted)
    #[arg(long)]
    quiz: Option<String>,

    /// normal, timed or mastery (asked for if omitted)
    #[arg(long)]
    mode: Option<QuizMode>,

    /// Build a quiz from the vocabulary instead of the catalog
    #[arg(long)]
    generate: bool,

    /// Number of questions in a generated quiz
    #[arg(long, default_value = "10")]
    questions: usize,

    /// Only draw generated questions from this difficulty
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// Only draw generated questions from bookmarked words
    #[arg(long)]
    bookmarked: bool,

    /// Only draw generated questions from words not yet mastered
    #[arg(long)]
    unmastered: bool,

    /// Which answers to list after the quiz: all, correct or incorrect
    #[arg(long, default_value = "all")]
    review: AnswerFilter,
}

/// Arrow-key picker. `None` when the user backs out.
fn pick(title: &str, items: &[String]) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    let mut out = stdout();
    terminal::enable_raw_mode()?;

    let mut selected: usize = 0;

    let render = |out: &mut std::io::Stdout, sel: usize| -> std::io::Result<()> {
        crossterm::execute!(
            out,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        write!(out, "{BOLD}{title}{RESET} {DIM}(↑/↓, Enter, Esc){RESET}\r\n\r\n")?;
        for (i, item) in items.iter().enumerate() {
            if i == sel {
                write!(out, "  {GREEN}› {item}{RESET}\r\n")?;
            } else {
                write!(out, "  {DIM}  {item}{RESET}\r\n")?;
            }
        }
        out.flush()
    };

    render(&mut out, selected)?;

    let choice = loop {
        if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
            if kind != KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Up | KeyCode::Char('k') => selected = selected.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    if selected + 1 < items.len() {
                        selected += 1;
                    }
                }
                KeyCode::Enter => break Some(selected),
                KeyCode::Esc | KeyCode::Char('q') => break None,
                _ => {}
            }
            render(&mut out, selected)?;
        }
    };

    terminal::disable_raw_mode()?;
    crossterm::execute!(out, terminal::Clear(ClearType::FromCursorDown))?;
    Ok(choice)
}

/// `1`-based number or `a`-based letter of an option.
fn parse_choice(input: &str, options: usize) -> Option<usize> {
    let input = input.trim().to_ascii_lowercase();
    let index = match input.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = input.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ 'a'..='z'), None) => c as usize - 'a' as usize,
                _ => return None,
            }
        }
    };
    (index < options).then_some(index)
}

/// Play the session in `runner` to the end. Returns false if the user quit.
fn play(
    runner: &mut QuizRunner,
    study: &mut StudyStore<SqliteStore>,
    timer: &mut StudyTimer,
    rl: &mut DefaultEditor,
) -> Result<bool, Box<dyn std::error::Error>> {
    loop {
        let now = Utc::now();
        timer.poll(now, VocabMaster::today(), study);
        if runner.poll_deadline(study, now, VocabMaster::today()) {
            return Ok(true);
        }
        let Some(session) = runner.session() else {
            return Ok(runner.outcome().is_some());
        };

        let question = session.current_question().clone();
        let clock = session
            .time_left(now)
            .map(|secs| format!("   ⏱ {}", format_clock(secs)))
            .unwrap_or_default();
        println!();
        println!(
            "{BOLD}Question {}/{}{RESET}{DIM}   {}%{clock}{RESET}",
            session.current_index() + 1,
            session.questions().len(),
            session.progress(),
        );
        println!("{}", question.question);
        if let Some(pos) = &question.part_of_speech {
            println!("{DIM}({pos}){RESET}");
        }
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        let choice = loop {
            match rl.readline("> ") {
                Ok(line) => match parse_choice(&line, question.options.len()) {
                    Some(i) => break i,
                    None => println!("{DIM}Answer with 1-{}{RESET}", question.options.len()),
                },
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    runner.back_to_selection();
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        };

        let answered_at = Utc::now();
        if runner.poll_deadline(study, answered_at, VocabMaster::today()) {
            return Ok(true);
        }
        match runner.select_answer(&question.options[choice], answered_at) {
            Some(true) => println!("{GREEN}✓ Correct{RESET}"),
            Some(false) => println!("{RED}✗ {}{RESET}", question.correct_answer),
            None => {}
        }
        if runner.advance(study, Utc::now(), VocabMaster::today())? == Advance::Completed {
            return Ok(true);
        }
    }
}

fn print_results(outcome: &QuizOutcome, filter: AnswerFilter) {
    let result = &outcome.result;
    println!();
    println!("{BOLD}── Results ─────────────────────────────────────────{RESET}");
    println!();
    println!(
        "  {BOLD}{}{}{RESET}   {}/{} ({}%)   {DIM}{}{RESET}",
        band_color(outcome.band),
        outcome.band.label(),
        result.score,
        result.total,
        outcome.percentage,
        format_clock(result.time_spent as i64),
    );
    if outcome.timed_out {
        println!(
            "  {YELLOW}Time's up!{RESET} {} question(s) left unanswered",
            outcome.unanswered
        );
    }
    if outcome.mode == QuizMode::Mastery {
        if outcome.mastery_worthy {
            println!("  {GREEN}★ Mastery level reached{RESET}");
        } else {
            println!("  {DIM}Mastery needs 90% or more{RESET}");
        }
    }
    let summary = outcome.summary;
    println!(
        "  {DIM}Attempts {}   Best {}%   Average {}%{RESET}",
        summary.attempts, summary.best, summary.average
    );

    let answers = outcome.answers(filter);
    if answers.is_empty() {
        return;
    }
    println!();
    for answer in answers {
        let (mark, color) = if answer.is_correct {
            ("✓", GREEN)
        } else {
            ("✗", RED)
        };
        println!("  {color}{mark}{RESET} {}", answer.question);
        if !answer.is_correct {
            println!("      {DIM}you:{RESET} {}", answer.selected_answer);
        }
        println!(
            "      {DIM}answer:{RESET} {}   {DIM}{:.1}s{RESET}",
            answer.correct_answer,
            answer.time_spent_ms as f64 / 1000.0
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let mut vm = cli.data.open()?;
    let mut rng = rand::rng();

    let quiz = if cli.generate {
        let filter = PoolFilter {
            difficulty: cli.difficulty.clone(),
            bookmarked_only: cli.bookmarked,
            unmastered_only: cli.unmastered,
        };
        match vm.generate_quiz(&filter, cli.questions, &mut rng) {
            Ok(quiz) => quiz,
            Err(e @ AppError::InsufficientPool { .. }) => {
                eprintln!("{e}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        match &cli.quiz {
            Some(id) => vm.quiz(id)?.clone(),
            None => {
                let listings = vm.quiz_listings();
                if listings.is_empty() {
                    eprintln!("No quizzes in the catalog. Try --generate.");
                    return Ok(());
                }
                let labels: Vec<String> = listings
                    .iter()
                    .map(|l| {
                        format!(
                            "{} [{}] {} questions, best {}%",
                            l.title, l.difficulty, l.questions, l.summary.best
                        )
                    })
                    .collect();
                let Some(idx) = pick("Choose a quiz", &labels)? else {
                    return Ok(());
                };
                vm.quiz(&listings[idx].id)?.clone()
            }
        }
    };

    let mode = match cli.mode {
        Some(mode) => mode,
        None => {
            let modes = [QuizMode::Normal, QuizMode::Timed, QuizMode::Mastery];
            let labels = vec![
                "Normal".to_string(),
                "Timed (10 minutes for the whole quiz)".to_string(),
                "Mastery (aim for 90%)".to_string(),
            ];
            let Some(idx) = pick(&quiz.title, &labels)? else {
                return Ok(());
            };
            modes[idx]
        }
    };

    let mut runner = QuizRunner::new();
    runner.select_quiz(quiz);
    runner.set_mode(mode)?;
    runner.start(&mut rng, Utc::now())?;

    let mut rl = DefaultEditor::new()?;
    let mut timer = StudyTimer::default();
    timer.start(Utc::now());
    let study = vm.study_mut();

    loop {
        if !play(&mut runner, study, &mut timer, &mut rl)? {
            break;
        }
        if let Some(outcome) = runner.outcome() {
            print_results(outcome, cli.review);
        }
        match rl.readline("Retake this quiz? [y/N] ") {
            Ok(line) if line.trim().eq_ignore_ascii_case("y") => {
                runner.retake(&mut rng, Utc::now())?;
            }
            _ => break,
        }
    }

    timer.poll(Utc::now(), VocabMaster::today(), study);
    timer.stop();
    eprintln!("Done!");
    Ok(())
}
