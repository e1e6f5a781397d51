/// Console output for the flattener
///
/// Every message goes through one locked writer so progress lines from the
/// pipeline never interleave with warnings. Warnings and errors get a
/// colored label when stdout is a terminal.
use lazy_static::lazy_static;
use std::io::Write;
use std::sync::Mutex;
use term::color::{self, Color};

lazy_static! {
    static ref CONSOLE: Mutex<()> = Mutex::new(());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Status,
    Warning,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Status => "flatten",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }

    fn color(self) -> Option<Color> {
        match self {
            Level::Status => None,
            Level::Warning => Some(color::BRIGHT_YELLOW),
            Level::Error => Some(color::BRIGHT_RED),
        }
    }

    /// Errors are set apart by blank lines
    fn padded(self) -> bool {
        self == Level::Error
    }
}

fn emit(level: Level, msg: &str) {
    let _guard = CONSOLE.lock();
    if level.padded() {
        println!();
    }
    match level.color() {
        Some(fg) => write_label(level.label(), fg),
        None => print!("{}", level.label()),
    }
    println!(": {}", msg);
    if level.padded() {
        println!();
    }
}

/// Bold colored label; plain text when no terminal is attached
fn write_label(label: &str, fg: Color) {
    let Some(mut t) = term::stdout() else {
        print!("{}", label);
        return;
    };
    if t.fg(fg).is_err() {
        print!("{}", label);
        return;
    }
    let _ = t.attr(term::Attr::Bold);
    let _ = write!(t, "{}", label);
    let _ = t.reset();
}

pub fn status(msg: &str) {
    emit(Level::Status, msg);
}

pub fn print_warning(msg: &str) {
    emit(Level::Warning, msg);
}

pub fn print_error(msg: &str) {
    emit(Level::Error, msg);
}
