//! Terminal output for the cyro CLI
//!
//! Every method has a colored form and a plain form. The plain form is what
//! `--no-color`, pipes and the integration tests see, so its prefixes
//! (`[WARN]`, `[TIP]`, `->`) are stable.

use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

const COLUMN_WIDTH: usize = 20;

/// Printer for CLI messages, agent tables and replies
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn with_color(colored: bool) -> Self {
        Self { colored }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Greeting shown when a chat session starts
    pub fn banner(&self, agent: Option<&str>) {
        let dim = Style::new().dimmed();
        let target = format!("({})", agent.unwrap_or("auto routing"));
        println!(
            "{} {} {}",
            self.paint("cyro", Style::new().bright_cyan().bold()),
            self.paint(concat!("v", env!("CARGO_PKG_VERSION")), dim),
            self.paint(&target, dim)
        );
        println!("{}", self.paint("Type a message, or 'exit' to quit.", dim));
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Errors go to stderr so replies on stdout stay pipeable
    pub fn error(&self, message: &str) {
        eprintln!(
            "{} {}",
            self.paint("Error:", Style::new().red().bold()),
            message
        );
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Indented `key: value` line
    pub fn kv(&self, key: &str, value: &str) {
        println!(
            "    {}: {}",
            self.paint(key, Style::new().dimmed()),
            self.paint(value, Style::new().bright_white())
        );
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// One line describing how a message was routed
    pub fn routing(&self, agent: &str, detail: &str) {
        let arrow = if self.colored { "→" } else { "->" };
        let accent = Style::new().cyan().bold();
        println!(
            "{} {} {}",
            self.paint(arrow, accent),
            self.paint(agent, accent),
            self.paint(detail, Style::new().dimmed())
        );
    }

    /// An agent's reply, printed as-is
    pub fn reply(&self, text: &str) {
        println!("{}", text);
    }

    /// Chat prompt, flushed so it shows before input is read
    pub fn prompt(&self) {
        print!("{} ", self.paint(">", Style::new().bright_cyan().bold()));
        let _ = io::stdout().flush();
    }

    pub fn table_header(&self, columns: &[&str]) {
        let rule_char = if self.colored { "─" } else { "-" };
        let rule = rule_char.repeat(columns.len() * (COLUMN_WIDTH + 1));
        println!(
            "    {}",
            self.paint(&pad_columns(columns), Style::new().bright_white().bold())
        );
        println!("    {}", self.paint(&rule, Style::new().dimmed()));
    }

    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", pad_columns(values));
    }
}

fn pad_columns(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("{:<width$}", v, width = COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}
