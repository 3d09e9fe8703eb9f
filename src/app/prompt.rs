use crate::shared::errors::SetupError;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{BufRead, IsTerminal, Write};

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("cancelled")]
    Cancelled,
    #[error("input closed")]
    InputClosed,
    #[error("terminal error: {0}")]
    Terminal(String),
}

impl From<PromptError> for SetupError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled => SetupError::Cancelled,
            other => SetupError::InvalidArguments(other.to_string()),
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

pub fn prompt_line(label: &str) -> Result<String, PromptError> {
    read_answer(&format!("{label}: "))
}

fn read_answer(prompt: &str) -> Result<String, PromptError> {
    print!("{prompt}");
    std::io::stdout()
        .flush()
        .map_err(|err| PromptError::Terminal(err.to_string()))?;

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| PromptError::Terminal(err.to_string()))?;
    if read == 0 {
        return Err(PromptError::InputClosed);
    }
    Ok(line.trim().to_string())
}

/// Masked secret prompt: raw-mode key events echoed as `*`, backspace
/// supported, Ctrl+C cancels. Falls back to a plain line read when the
/// session is not a terminal.
pub fn prompt_secret(label: &str) -> Result<String, PromptError> {
    if !is_interactive() {
        return prompt_line(label);
    }

    print!("{label}: ");
    std::io::stdout()
        .flush()
        .map_err(|err| PromptError::Terminal(err.to_string()))?;

    enable_raw_mode().map_err(|err| PromptError::Terminal(err.to_string()))?;
    let result = read_masked();
    disable_raw_mode().map_err(|err| PromptError::Terminal(err.to_string()))?;

    println!();
    result.map(|secret| secret.trim().to_string())
}

fn read_masked() -> Result<String, PromptError> {
    let mut chars: Vec<char> = Vec::new();
    loop {
        let Event::Key(key) = event::read().map_err(|err| PromptError::Terminal(err.to_string()))?
        else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Err(PromptError::Cancelled);
        }

        match key.code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                if chars.pop().is_some() {
                    print!("\x08 \x08");
                    flush_best_effort();
                }
            }
            KeyCode::Char(c) => {
                chars.push(c);
                print!("*");
                flush_best_effort();
            }
            _ => {}
        }
    }
    Ok(chars.into_iter().collect())
}

fn flush_best_effort() {
    let _ = std::io::stdout().flush();
}

/// Repeats the prompt until the answer is one of the allowed choices; an
/// empty answer selects the default.
pub fn prompt_choice(
    prompt: &str,
    choices: &[(&str, &str)],
    default: &str,
) -> Result<String, PromptError> {
    loop {
        let mut answer = read_answer(prompt)?.to_lowercase();
        if answer.is_empty() {
            answer = default.to_string();
        }
        if let Some((_, value)) = choices.iter().find(|(key, _)| *key == answer) {
            return Ok(value.to_string());
        }
        let mut allowed: Vec<&str> = choices.iter().map(|(key, _)| *key).collect();
        allowed.sort_unstable();
        println!("Please enter one of: {}", allowed.join(", "));
    }
}
