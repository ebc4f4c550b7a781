//! Structured toolchain command lines.
//!
//! An invocation keeps every parameter as a discrete flag/value pair so
//! callers (and tests) can inspect e.g. the contour interval or output size
//! without parsing a flat string. The output path may be left as a
//! placeholder and filled in when the command is rendered, which lets the
//! stage runner point the tool at a temporary path.

use std::fmt;
use std::path::Path;

/// Text rendered for the output placeholder when no path is supplied.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// One argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Literal text.
    Text(String),
    /// The stage's output path, substituted at render time.
    Output,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    fn render(&self, output: Option<&Path>) -> String {
        match (self, output) {
            (Self::Text(s), _) => s.clone(),
            (Self::Output, Some(path)) => path.to_string_lossy().into_owned(),
            (Self::Output, None) => OUTPUT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ToolOption {
    flag: String,
    values: Vec<Value>,
}

/// A single toolchain call: program, leading words, options, positionals.
///
/// Rendered as `program leading... options... positionals...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: String,
    leading: Vec<String>,
    options: Vec<ToolOption>,
    positionals: Vec<Value>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading: Vec::new(),
            options: Vec::new(),
            positionals: Vec::new(),
        }
    }

    /// Add a word placed before all options (e.g. `hillshade` for gdaldem).
    pub fn subcommand(mut self, word: impl Into<String>) -> Self {
        self.leading.push(word.into());
        self
    }

    /// Add a flag without values.
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.options.push(ToolOption {
            flag: flag.into(),
            values: Vec::new(),
        });
        self
    }

    /// Add a flag with one value.
    pub fn option(self, flag: impl Into<String>, value: impl ToString) -> Self {
        self.option_values(flag, [value])
    }

    /// Add a flag followed by several values (e.g. `-te w s e n`).
    pub fn option_values<I, V>(mut self, flag: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.options.push(ToolOption {
            flag: flag.into(),
            values: values.into_iter().map(|v| Value::Text(v.to_string())).collect(),
        });
        self
    }

    /// Add a flag whose value is the output path.
    pub fn output_option(mut self, flag: impl Into<String>) -> Self {
        self.options.push(ToolOption {
            flag: flag.into(),
            values: vec![Value::Output],
        });
        self
    }

    /// Append an input path positional.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.positionals
            .push(Value::Text(path.as_ref().to_string_lossy().into_owned()));
        self
    }

    /// Append several input path positionals.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self = self.input(path);
        }
        self
    }

    /// Append the output path placeholder as a positional.
    pub fn output(mut self) -> Self {
        self.positionals.push(Value::Output);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn leading(&self) -> &[String] {
        &self.leading
    }

    /// Values of the first option named `flag`.
    pub fn option_value(&self, flag: &str) -> Option<&[Value]> {
        self.options
            .iter()
            .find(|o| o.flag == flag)
            .map(|o| o.values.as_slice())
    }

    /// Values of the first option named `flag`, rendered as text.
    pub fn option_text(&self, flag: &str) -> Option<Vec<String>> {
        self.option_value(flag)
            .map(|values| values.iter().map(|v| v.render(None)).collect())
    }

    /// Values of every option named `flag` (e.g. repeated `-co`).
    pub fn option_occurrences(&self, flag: &str) -> Vec<Vec<String>> {
        self.options
            .iter()
            .filter(|o| o.flag == flag)
            .map(|o| o.values.iter().map(|v| v.render(None)).collect())
            .collect()
    }

    /// Check whether a flag is present.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.options.iter().any(|o| o.flag == flag)
    }

    pub fn positionals(&self) -> &[Value] {
        &self.positionals
    }

    /// Check whether the output placeholder appears anywhere.
    pub fn uses_output(&self) -> bool {
        self.positionals.contains(&Value::Output)
            || self.options.iter().any(|o| o.values.contains(&Value::Output))
    }

    /// Render the argument list, substituting `output` for the placeholder.
    pub fn args(&self, output: Option<&Path>) -> Vec<String> {
        let mut args = self.leading.clone();
        for option in &self.options {
            args.push(option.flag.clone());
            args.extend(option.values.iter().map(|v| v.render(output)));
        }
        args.extend(self.positionals.iter().map(|v| v.render(output)));
        args
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args(None) {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
