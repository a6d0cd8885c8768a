//! Argument templates for external commands.
//!
//! Templates are argument vectors whose elements may contain `${name}`
//! placeholders, e.g. `["look", "${prefix}", "${path}"]`. Unknown
//! placeholders are left verbatim.

use std::process::Output;

use tokio::process::Command;

/// A program plus argument template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// `None` when the template has no program.
    pub fn new(template: &[String]) -> Option<Self> {
        let (program, args) = template.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with every `${name}` in `vars` replaced by its value.
    pub fn render(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| substitute(arg, vars))
            .collect()
    }

    /// Run the rendered command to completion, capturing stdout and stderr.
    ///
    /// Only a failure to spawn is an error; exit status is left to the
    /// caller.
    pub async fn output(&self, vars: &[(&str, &str)]) -> std::io::Result<Output> {
        Command::new(&self.program)
            .args(self.render(vars))
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }
}

fn substitute(arg: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(start) = rest.find("${") {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find('}') else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };
        let name = &tail[..end];
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => rendered.push_str(value),
            None => rendered.push_str(&rest[start..start + end + 3]),
        }
        rest = &tail[end + 1..];
    }
    rendered.push_str(rest);
    rendered
}

/// Non-empty lines of command output, with trailing `\r` stripped.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
