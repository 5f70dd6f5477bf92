//! # Solver Process Protocol Tests
//!
//! Drives `ProcessSolver` through a scripted stand-in solver that answers
//! like an SMT-LIB2 solver without `:timeout` support.

#![cfg(unix)]

use std::path::PathBuf;

use lawcheck::config::SolverOptions;
use lawcheck::smt::{
    ProcessError, ProcessSolver, Query, QueryBuilder, SatResult, SmtSolver, SmtTerm, SolverScope,
};
use lawcheck::symbolic::{CmpOp, ConstraintExpr, PathCondition};
use lawcheck::types::{IntKind, Type};

/// Acknowledges commands once `:print-success` is on, rejects `:timeout`
/// with `unsupported`, fails `(assert bad)`, and answers `unsat` to every
/// `(check-sat)`. `(reset)` switches acknowledgements back off. Every
/// command received is appended to `<script>.log`.
const SCRIPTED_SOLVER: &str = r#"
success=0
while IFS= read -r line; do
  echo "$line" >> "$0.log"
  case "$line" in
    "(set-option :print-success true)") success=1; echo success ;;
    "(set-option :timeout"*) echo unsupported ;;
    "(check-sat)") echo unsat ;;
    "(assert bad)") echo '(error "line 1: unknown constant bad")' ;;
    "(echo "*) msg=${line#(echo }; echo "${msg%)}" ;;
    "(reset)") if [ "$success" = 1 ]; then echo success; fi; success=0 ;;
    "(exit)") exit 0 ;;
    *) if [ "$success" = 1 ]; then echo success; fi ;;
  esac
done
"#;

fn script_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lawcheck-{}-{}.sh", name, std::process::id()))
}

fn received(name: &str) -> Vec<String> {
    let mut log = script_path(name).into_os_string();
    log.push(".log");
    std::fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn scripted_solver(name: &str) -> Option<ProcessSolver> {
    if !ProcessSolver::is_available("bash") {
        eprintln!("bash not found, skipping");
        return None;
    }
    let path = script_path(name);
    let _ = std::fs::remove_file(format!("{}.log", path.display()));
    std::fs::write(&path, SCRIPTED_SOLVER).unwrap();
    let options = SolverOptions {
        command: "bash".into(),
        args: vec![path.to_string_lossy().into_owned()],
        query_timeout_ms: Some(1_000),
    };
    Some(ProcessSolver::spawn(&options).unwrap())
}

fn guard_query() -> Query {
    let path = PathCondition::from_guards(vec![ConstraintExpr::compare(
        CmpOp::Lt,
        ConstraintExpr::var("x!0", Type::i32()),
        ConstraintExpr::int(0, IntKind::I32),
    )]);
    QueryBuilder::build(&path).unwrap()
}

fn check(solver: &mut ProcessSolver) -> Result<SatResult, ProcessError> {
    let mut scope = SolverScope::acquire(solver)?;
    scope.check(&guard_query()).map(|(result, _)| result)
}

#[test]
fn test_unsupported_timeout_does_not_shift_answers() {
    let Some(mut solver) = scripted_solver("shift") else { return };

    for _ in 0..3 {
        assert_eq!(check(&mut solver).unwrap(), SatResult::Unsat);
    }
}

#[test]
fn test_reset_restores_session() {
    let Some(mut solver) = scripted_solver("reset") else { return };

    assert_eq!(check(&mut solver).unwrap(), SatResult::Unsat);
    solver.reset().unwrap();
    assert_eq!(check(&mut solver).unwrap(), SatResult::Unsat);
    assert_eq!(check(&mut solver).unwrap(), SatResult::Unsat);

    let timeouts: Vec<String> = received("reset")
        .into_iter()
        .filter(|cmd| cmd.starts_with("(set-option :timeout"))
        .collect();
    assert_eq!(timeouts, vec!["(set-option :timeout 1000)"; 2]);
}

#[test]
fn test_rejected_assertion_keeps_stream_aligned() {
    let Some(mut solver) = scripted_solver("direct") else { return };

    solver.push().unwrap();
    let err = solver.assert(&SmtTerm::constant("bad")).unwrap_err();
    assert!(matches!(err, ProcessError::SolverError(_)));
    solver.pop().unwrap();
    assert_eq!(check(&mut solver).unwrap(), SatResult::Unsat);
}
