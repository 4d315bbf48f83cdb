use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

/// Failure reported by an evaluator for one code block.
#[derive(Debug)]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        ExecutionError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExecutionError {}

/// Pluggable execution capability for executable code blocks.
/// The renderer never embeds an execution engine; callers supply one.
pub trait Evaluator {
    /// Evaluate one block of code and return its captured textual output.
    fn evaluate(&mut self, language: &str, code: &str) -> Result<String, ExecutionError>;
}

/// Evaluator that pipes code to an external interpreter over stdin and
/// captures its stdout. Languages map to command lines, e.g.
/// `python` -> `python3 -`.
#[derive(Debug, Default)]
pub struct CommandEvaluator {
    commands: HashMap<String, Vec<String>>,
}

impl CommandEvaluator {
    pub fn new() -> Self {
        CommandEvaluator {
            commands: HashMap::new(),
        }
    }

    pub fn insert(&mut self, language: impl Into<String>, argv: Vec<String>) {
        self.commands.insert(language.into(), argv);
    }

    pub fn with_command(mut self, language: impl Into<String>, argv: Vec<String>) -> Self {
        self.insert(language, argv);
        self
    }

    /// Parse a `LANG=CMD` mapping as accepted on the command line.
    /// The command splits on whitespace.
    pub fn parse_mapping(spec: &str) -> Option<(String, Vec<String>)> {
        let (language, command) = spec.split_once('=')?;
        let language = language.trim();
        let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if language.is_empty() || argv.is_empty() {
            return None;
        }
        Some((language.to_string(), argv))
    }
}

impl Evaluator for CommandEvaluator {
    fn evaluate(&mut self, language: &str, code: &str) -> Result<String, ExecutionError> {
        let argv = self.commands.get(language).ok_or_else(|| {
            ExecutionError::new(format!(
                "no interpreter configured for language '{}'",
                language
            ))
        })?;

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutionError::new(format!("cannot spawn '{}': {}", argv[0], e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(code.as_bytes()) {
                let _ = child.kill();
                return Err(ExecutionError::new(format!(
                    "cannot write to '{}': {}",
                    argv[0], e
                )));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ExecutionError::new(format!("cannot wait for '{}': {}", argv[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutionError::new(format!(
                "'{}' failed ({}): {}",
                argv[0],
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
