use std::io::{self, BufRead, ErrorKind, Write};

/// Line-oriented prompts over any reader/writer pair, so the interactive
/// flows can be driven by stdin or by a test script.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one trimmed line. Fails with `UnexpectedEof`
    /// once the input is exhausted.
    pub fn line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(input.trim().to_string())
    }

    pub fn lower_line(&mut self, prompt: &str) -> io::Result<String> {
        Ok(self.line(prompt)?.to_lowercase())
    }

    /// Anything starting with `y` counts as yes.
    pub fn yes(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self.lower_line(prompt)?.starts_with('y'))
    }

    pub fn confirm(&mut self, prompt: &str, default: Option<bool>) -> io::Result<bool> {
        loop {
            let hint = match default {
                Some(true) => "(Y/n)",
                Some(false) | None => "(y/N)",
            };

            match self.line(&format!("{} {}: ", prompt, hint))?.to_uppercase().as_str() {
                "Y" => return Ok(true),
                "N" => return Ok(false),
                "" => match default {
                    Some(default) => return Ok(default),
                    None => continue,
                },
                _ => continue,
            }
        }
    }

    /// Show a message and wait for enter.
    pub fn pause(&mut self, message: &str) -> io::Result<()> {
        self.line(message).map(|_| ())
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm_uses_default_and_reprompts() {
        let mut prompter = Prompter::new(Cursor::new("\nmaybe\nY\n"), Vec::new());
        assert!(!prompter.confirm("Delete?", Some(false)).unwrap());
        assert!(prompter.confirm("Delete?", None).unwrap());

        let output = String::from_utf8(prompter.into_output()).unwrap();
        assert_eq!(output.matches("Delete? (y/N): ").count(), 3);
    }

    #[test]
    fn test_line_reports_eof() {
        let mut prompter = Prompter::new(Cursor::new(""), Vec::new());
        let err = prompter.line(">> ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_yes_is_prefix_based() {
        let mut prompter = Prompter::new(Cursor::new("  Yeah\nno\n"), Vec::new());
        assert!(prompter.yes(">> ").unwrap());
        assert!(!prompter.yes(">> ").unwrap());
    }
}
