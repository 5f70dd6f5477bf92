//! SMT-LIB2 solver running as a child process
//!
//! Speaks the textual SMT-LIB2 protocol over stdin/stdout. Any solver with
//! an interactive mode works; the default is `z3 -in -smt2`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use thiserror::Error;

use crate::config::SolverOptions;
use crate::smt::printer::{sort_to_smtlib, to_smtlib};
use crate::smt::solver::{Model, ModelValue, SatResult, SmtSolver};
use crate::smt::terms::{SmtSort, SmtTerm};
use crate::types::sign_extend;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("solver I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("solver not found: {0}")]
    NotFound(String),
    #[error("solver error: {0}")]
    SolverError(String),
    #[error("failed to parse solver output: {0}")]
    ParseError(String),
}

impl From<ProcessError> for crate::Error {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::NotFound(msg) => crate::Error::SolverUnavailable(msg),
            other => crate::Error::solver(other.to_string()),
        }
    }
}

/// Interactive SMT-LIB2 solver process
///
/// Runs with `:print-success` on, so every command is answered and the
/// reply stream stays aligned with the command stream.
pub struct ProcessSolver {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    command: String,
    timeout_ms: Option<u64>,
}

/// Marker echoed back when resynchronizing after `(reset)`
const SYNC_MARKER: &str = "lawcheck-sync";

impl ProcessSolver {
    /// Spawn the default solver (`z3 -in -smt2`)
    pub fn new() -> Result<Self, ProcessError> {
        Self::spawn(&SolverOptions::default())
    }

    /// Spawn the solver described by `options`
    pub fn spawn(options: &SolverOptions) -> Result<Self, ProcessError> {
        let mut child = Command::new(&options.command)
            .args(&options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::NotFound(format!("{}: {}", options.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::SolverError("failed to capture solver stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::SolverError("failed to capture solver stdout".into()))?;

        let mut solver = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            command: options.command.clone(),
            timeout_ms: options.query_timeout_ms,
        };

        solver.send_command_expect_success("(set-option :print-success true)")?;
        solver.configure()?;
        tracing::debug!(command = %solver.command, "spawned solver process");
        Ok(solver)
    }

    /// True when `command` can be launched
    pub fn is_available(command: &str) -> bool {
        Command::new(command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Session options; lost on `(reset)`
    fn configure(&mut self) -> Result<(), ProcessError> {
        self.send_command_expect_success("(set-option :produce-models true)")?;
        self.send_command_expect_success("(set-logic QF_BV)")?;
        self.apply_timeout()
    }

    fn apply_timeout(&mut self) -> Result<(), ProcessError> {
        // z3 treats 0 as "no limit"
        let ms = self.timeout_ms.unwrap_or(0);
        let response = self.send_command(&format!("(set-option :timeout {})", ms))?;
        match response.as_str() {
            "success" => Ok(()),
            "unsupported" => {
                tracing::warn!(command = %self.command, "solver does not support :timeout");
                Ok(())
            }
            other => Err(ProcessError::SolverError(other.to_string())),
        }
    }

    fn send_command(&mut self, cmd: &str) -> Result<String, ProcessError> {
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        let response = self.read_response()?;
        if response.is_empty() {
            return Err(ProcessError::SolverError(format!(
                "no response from {} for `{}`",
                self.command, cmd
            )));
        }
        if response.starts_with("(error") {
            return Err(ProcessError::SolverError(response));
        }
        Ok(response)
    }

    fn send_command_expect_success(&mut self, cmd: &str) -> Result<(), ProcessError> {
        match self.send_command(cmd)?.as_str() {
            "success" => Ok(()),
            other => Err(ProcessError::SolverError(format!("`{}`: {}", cmd, other))),
        }
    }

    fn read_response(&mut self) -> Result<String, ProcessError> {
        let mut response = String::new();
        self.stdout.read_line(&mut response)?;
        Ok(response.trim_end().to_string())
    }

    fn reason_unknown(&mut self) -> String {
        match self.send_command("(get-info :reason-unknown)") {
            // (:reason-unknown "timeout")
            Ok(info) => info
                .trim_start_matches('(')
                .trim_end_matches(')')
                .trim_start_matches(":reason-unknown")
                .trim()
                .trim_matches('"')
                .to_string(),
            Err(e) => format!("unknown ({})", e),
        }
    }
}

impl Drop for ProcessSolver {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "(exit)");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

impl SmtSolver for ProcessSolver {
    type Error = ProcessError;

    fn declare_const(&mut self, name: &str, sort: &SmtSort) -> Result<(), ProcessError> {
        self.send_command_expect_success(&format!(
            "(declare-const {} {})",
            name,
            sort_to_smtlib(sort)
        ))
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), ProcessError> {
        self.send_command_expect_success(&format!("(assert {})", to_smtlib(term)))
    }

    fn push(&mut self) -> Result<(), ProcessError> {
        self.send_command_expect_success("(push 1)")
    }

    fn pop(&mut self) -> Result<(), ProcessError> {
        self.send_command_expect_success("(pop 1)")
    }

    fn check_sat(&mut self) -> Result<SatResult, ProcessError> {
        let response = self.send_command("(check-sat)")?;
        match response.as_str() {
            "sat" => Ok(SatResult::Sat),
            "unsat" => Ok(SatResult::Unsat),
            "unknown" => Ok(SatResult::Unknown(self.reason_unknown())),
            other => Err(ProcessError::SolverError(other.to_string())),
        }
    }

    fn check_sat_with_model(
        &mut self,
        consts: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), ProcessError> {
        let result = self.check_sat()?;
        if result != SatResult::Sat {
            return Ok((result, None));
        }

        let mut values = HashMap::new();
        for &(name, sort) in consts {
            let response = self.send_command(&format!("(get-value ({}))", name))?;
            let value = parse_value(&response, sort)?;
            values.insert(name.to_string(), value);
        }
        Ok((SatResult::Sat, Some(Model { values })))
    }

    fn set_timeout(&mut self, timeout_ms: Option<u64>) -> Result<(), ProcessError> {
        self.timeout_ms = timeout_ms;
        self.apply_timeout()
    }

    fn reset(&mut self) -> Result<(), ProcessError> {
        // `(reset)` may or may not be acknowledged; skip to the echoed marker
        writeln!(self.stdin, "(reset)")?;
        writeln!(self.stdin, "(set-option :print-success true)")?;
        writeln!(self.stdin, "(echo \"{}\")", SYNC_MARKER)?;
        self.stdin.flush()?;
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(ProcessError::SolverError(format!(
                    "{} exited during reset",
                    self.command
                )));
            }
            if line.trim().trim_matches('"') == SYNC_MARKER {
                break;
            }
        }
        self.configure()
    }
}

/// Parse a `get-value` reply such as `((x!0 #x0000002a))`
fn parse_value(response: &str, sort: &SmtSort) -> Result<ModelValue, ProcessError> {
    let body = response
        .trim()
        .strip_prefix("((")
        .and_then(|s| s.strip_suffix("))"))
        .ok_or_else(|| ProcessError::ParseError(response.to_string()))?;
    let raw = body
        .split_once(char::is_whitespace)
        .map(|(_, value)| value.trim())
        .ok_or_else(|| ProcessError::ParseError(response.to_string()))?;
    let raw = raw.trim_start_matches('(').trim_end_matches(')').trim();

    match sort {
        SmtSort::Bool => match raw {
            "true" => Ok(ModelValue::Bool(true)),
            "false" => Ok(ModelValue::Bool(false)),
            _ => Err(ProcessError::ParseError(response.to_string())),
        },
        SmtSort::BitVec(width) => {
            let bits =
                parse_bits(raw).ok_or_else(|| ProcessError::ParseError(response.to_string()))?;
            Ok(ModelValue::BitVec {
                value: sign_extend(bits, *width),
                width: *width,
            })
        }
    }
}

fn parse_bits(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("#x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = raw.strip_prefix("#b") {
        u64::from_str_radix(bin, 2).ok()
    } else {
        // `_ bv42 32` once the surrounding parentheses are gone
        let mut parts = raw.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("_"), Some(lit)) => lit.strip_prefix("bv")?.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_and_binary() {
        assert_eq!(
            parse_value("((x!0 #x0000002a))", &SmtSort::BitVec(32)).unwrap(),
            ModelValue::BitVec { value: 42, width: 32 }
        );
        assert_eq!(
            parse_value("((y!1 #b11111111))", &SmtSort::BitVec(8)).unwrap(),
            ModelValue::BitVec { value: -1, width: 8 }
        );
    }

    #[test]
    fn test_parse_indexed_literal() {
        assert_eq!(
            parse_value("((z!2 (_ bv65535 16)))", &SmtSort::BitVec(16)).unwrap(),
            ModelValue::BitVec { value: -1, width: 16 }
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(
            parse_value("((p!0 false))", &SmtSort::Bool).unwrap(),
            ModelValue::Bool(false)
        );
        assert!(parse_value("((p!0 #x01))", &SmtSort::Bool).is_err());
    }

    #[test]
    fn test_missing_solver_is_unavailable() {
        assert!(!ProcessSolver::is_available("definitely-not-a-solver-binary"));
        let options = SolverOptions {
            command: "definitely-not-a-solver-binary".into(),
            ..Default::default()
        };
        let err = ProcessSolver::spawn(&options).err().map(crate::Error::from);
        assert!(matches!(err, Some(crate::Error::SolverUnavailable(_))));
    }
}
