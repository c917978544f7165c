//! Colored terminal output for recipe runs
//!
//! Uses owo-colors for terminal colors. Progress bars live in
//! `helpers::progress`.

use owo_colors::OwoColorize;

/// Print an action header (blue, bold)
/// Example: "==> Running firefox"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print one executed step, optionally prefixed with a run tag.
/// Example: "  [vm-17] -> executed DOWNLOAD with result /tmp/recipe-x.exe"
pub fn step(tag: Option<&str>, operation: &str, result: &str) {
    let tag = tag.map(|t| format!("[{}] ", t)).unwrap_or_default();
    println!(
        "  {}{} executed {} with result {}",
        tag.dimmed(),
        "->".cyan(),
        operation.bold(),
        result
    );
}

/// Print a detail line (dimmed prefix)
/// Example: "     downloading https://..."
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
/// Example: "==> firefox installed"
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Print a `name = value` pair
pub fn pair(name: &str, value: &str) {
    println!("  {} = {}", name.cyan(), value);
}

/// Print a line of the step tree at `depth` levels of indentation
pub fn tree_line(depth: usize, text: &str) {
    println!("{}{}", "  ".repeat(depth), text);
}
