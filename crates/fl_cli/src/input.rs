use std::io::Write;

use anyhow::{Context, Result};
use fl_core::Article;
use fl_editor::Confirm;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented prompts on stdin.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next raw line, `None` at end of input.
    pub async fn line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.context("reading stdin")
    }

    pub async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}: ", label);
        std::io::stdout().flush()?;
        Ok(self.line().await?.map(|line| line.trim().to_string()))
    }

    /// Ask with the current value shown; an empty answer keeps it.
    pub async fn ask_or_keep(&mut self, label: &str, current: &str) -> Result<String> {
        let prompt = if current.is_empty() {
            label.to_string()
        } else {
            format!("{} [{}]", label, ellipsize(current, 40))
        };
        Ok(match self.ask(&prompt).await? {
            Some(answer) if !answer.is_empty() => answer,
            _ => current.to_string(),
        })
    }

    /// Read lines until one containing only `.`; nothing entered keeps
    /// `current`.
    pub async fn ask_block(&mut self, label: &str, current: &str) -> Result<String> {
        println!("{} (end with a line containing only '.', empty keeps the current text):", label);
        let mut block = Vec::new();
        while let Some(line) = self.line().await? {
            if line.trim() == "." {
                break;
            }
            block.push(line);
        }
        let text = block.join("\n");
        Ok(if text.trim().is_empty() { current.to_string() } else { text })
    }
}

pub fn ellipsize(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

/// Asks `[y/N]` on the terminal unless `--yes` was given.
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl TerminalConfirm {
    fn ask(article: &Article) -> std::io::Result<bool> {
        print!("Delete \"{}\"? [y/N] ", article.title);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, article: &Article) -> bool {
        if self.assume_yes {
            return true;
        }
        tokio::task::block_in_place(|| Self::ask(article)).unwrap_or(false)
    }
}
