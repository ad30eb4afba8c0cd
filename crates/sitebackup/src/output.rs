//! Terminal output utilities

use console::style;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a status line
pub fn status(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print the final run report
pub fn report(text: &str) {
    println!();
    for line in text.trim_end().lines() {
        if line.starts_with(char::is_whitespace) || line.is_empty() {
            println!("{line}");
        } else {
            println!("{}", style(line).bold());
        }
    }
}
