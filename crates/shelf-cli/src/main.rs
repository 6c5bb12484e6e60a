//! shelftalk - Book discussion threads CLI
//!
//! Per-book threads with comments and one level of replies, backed by a
//! local SQLite database.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create .shelftalk/config.toml and the database
//! shelftalk init
//!
//! # Seed a member and a book
//! shelftalk member add 7 --nickname reader
//! shelftalk book add 42 --title "The Vegetarian" --author "Han Kang"
//!
//! # Start a thread and browse it
//! shelftalk thread create 42 --member 7 --content "first post"
//! shelftalk comment list 1
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
