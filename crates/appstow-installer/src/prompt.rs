use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Line-oriented interaction with the person running the install.
pub trait Prompter {
    /// Shows `question` and returns the trimmed answer. End of input reads as
    /// an empty answer.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Reports a recoverable problem on the diagnostic stream before a prompt
    /// is repeated.
    fn report(&mut self, message: &str);
}

/// Prompter over any reader/writer pair, stdin/stdout in the binary.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question} ").context("failed to write prompt")?;
        self.output.flush().context("failed to flush prompt")?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("failed to read answer")?;
        Ok(line.trim().to_string())
    }

    fn report(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Asks for a yes/no answer; only `y`/`yes` in any case counts as yes.
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> Result<bool> {
    let answer = prompter.ask(&format!("{question} [y/N]:"))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
