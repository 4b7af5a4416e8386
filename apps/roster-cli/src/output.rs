//! Terminal output helpers

use colored::Colorize;

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn key_value(key: &str, value: &str) {
    println!("{}: {}", key.bold(), value);
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}
