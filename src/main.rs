use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use vocab_master::VocabMaster;
use vocab_master::config::{DataArgs, init_logging};
use vocab_master::engine::export::ExportKind;
use vocab_master::engine::words::{WordQuery, WordRow, WordStatus};
use vocab_master::model::{Difficulty, VocabularyEntry};

#[derive(Parser)]
#[command(name = "vocab-master", about = "Vocabulary study: flashcards, quizzes and progress")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline progress numbers and the word of the day, as JSON
    Dashboard,
    /// Show the progress screens
    Stats,
    /// Show GitHub-style quiz activity tiles
    Tiles {
        /// Number of weeks to display
        #[arg(long, default_value = "52")]
        weeks: usize,
    },
    /// Search and filter the word list
    Words {
        /// Text to look for in words and definitions
        #[arg(long)]
        search: Option<String>,
        /// Difficulty tag (HS, COL, ADV, ...)
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// all, bookmarked, mastered or unmastered
        #[arg(long, default_value = "all")]
        status: WordStatus,
    },
    /// Flashcard navigation
    Card {
        #[command(subcommand)]
        action: CardAction,
    },
    /// Toggle the bookmark on a word
    Bookmark { word: String },
    /// Change a word's mastery level
    Mastery {
        #[command(subcommand)]
        action: MasteryAction,
    },
    /// List the quiz catalog with attempts, best and average scores
    Quizzes,
    /// Export bookmarked or mastered words as plain text
    Export {
        /// bookmarks or mastered
        kind: ExportKind,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write to bookmarks.txt or mastered-words.txt in the current directory
        #[arg(long, conflicts_with = "out")]
        save: bool,
    },
    /// Switch between the light and dark theme
    Theme,
}

#[derive(Subcommand)]
enum CardAction {
    /// Show the current card
    Show,
    /// Move to the next card (wraps around)
    Next,
    /// Move to the previous card (wraps around)
    Prev,
    /// Jump to a card by position (clamped to the deck)
    Goto {
        #[arg(allow_hyphen_values = true)]
        index: i64,
    },
    /// Reveal the back of the current card
    Flip,
}

#[derive(Subcommand)]
enum MasteryAction {
    /// Set the level directly (clamped to 0..=5)
    Set {
        word: String,
        #[arg(allow_hyphen_values = true)]
        level: i64,
    },
    /// Raise the level by one
    Up { word: String },
}

fn card_json(vm: &VocabMaster, card: Option<&VocabularyEntry>) -> serde_json::Value {
    match card {
        Some(entry) => json!({
            "index": vm.state().current_card_index,
            "total": vm.vocabulary().len(),
            "card": WordRow::new(entry, vm.state()),
        }),
        None => json!({"index": 0, "total": 0, "card": null}),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let mut vm = cli.data.open()?;

    match cli.command {
        Commands::Dashboard => {
            let word_of_the_day = vm.word_of_the_day(&mut rand::rng());
            println!(
                "{}",
                json!({
                    "dashboard": vm.dashboard(),
                    "wordOfTheDay": word_of_the_day,
                    "theme": vm.state().theme,
                })
            );
        }

        Commands::Stats => {
            vocab_master::cli::stats::run(&vm);
        }

        Commands::Tiles { weeks } => {
            vocab_master::cli::tiles::run(vm.state(), VocabMaster::today(), weeks);
        }

        Commands::Words {
            search,
            difficulty,
            status,
        } => {
            let query = WordQuery {
                search,
                difficulty,
                status,
            };
            println!("{}", serde_json::to_string(&vm.words(&query))?);
        }

        Commands::Card { action } => {
            let card = match action {
                CardAction::Show => vm.current_card().cloned(),
                CardAction::Next => vm.next_card().cloned(),
                CardAction::Prev => vm.prev_card().cloned(),
                CardAction::Goto { index } => vm.go_to_card(index).cloned(),
                CardAction::Flip => vm.flip_card().cloned(),
            };
            println!("{}", card_json(&vm, card.as_ref()));
        }

        Commands::Bookmark { word } => {
            let bookmarked = vm.toggle_bookmark(&word)?;
            println!("{}", json!({"word": word, "bookmarked": bookmarked}));
        }

        Commands::Mastery { action } => {
            let (word, level) = match action {
                MasteryAction::Set { word, level } => {
                    let level = vm.set_mastery(&word, level)?;
                    (word, level)
                }
                MasteryAction::Up { word } => {
                    let level = vm.increase_mastery(&word)?;
                    (word, level)
                }
            };
            println!("{}", json!({"word": word, "mastery": level}));
        }

        Commands::Quizzes => {
            println!("{}", serde_json::to_string(&vm.quiz_listings())?);
        }

        Commands::Export { kind, out, save } => {
            let text = vm.export(kind);
            let target = out.or_else(|| save.then(|| PathBuf::from(kind.file_name())));
            match target {
                Some(path) => {
                    std::fs::write(&path, &text)?;
                    println!(
                        "{}",
                        json!({"file": path, "lines": text.lines().count()})
                    );
                }
                None => println!("{text}"),
            }
        }

        Commands::Theme => {
            let theme = vm.toggle_theme();
            println!("{}", json!({"theme": theme}));
        }
    }

    Ok(())
}
