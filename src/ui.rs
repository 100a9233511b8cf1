// Terminal output helpers shared by the tasks.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

pub fn banner(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bright_blue().bold());
    println!();
}

pub fn success(message: &str) {
    println!();
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

/// Ask the operator a yes/no question. Anything but `y`/`Y` declines.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("⚠️  {} (y/N) ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Spinner for remote steps with no streamed output.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
