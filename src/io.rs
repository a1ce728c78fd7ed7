use std::fs;
use std::path::Path;

use crate::constants::Word;
use crate::error::MmuError;
use crate::memory::PhysicalMemory;
use crate::vm_manager::VirtualMemory;

/// One line of an operation script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read(u64),
    Write(u64, Word),
    Translate(u64),
}

impl Operation {
    /// Run against `vm`, turning failures into an [`Outcome`]
    pub fn apply<M: PhysicalMemory>(self, vm: &mut VirtualMemory<M>) -> Outcome {
        let result = match self {
            Operation::Read(address) => vm.read(address).map(Outcome::Value),
            Operation::Write(address, value) => vm.write(address, value).map(|()| Outcome::Written),
            Operation::Translate(address) => vm.translate(address).map(Outcome::Physical),
        };
        result.unwrap_or_else(Outcome::Failed)
    }
}

/// Result of running one [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Value(Word),
    Written,
    Physical(u64),
    Failed(MmuError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Value(value) => write!(f, "{}", value),
            Outcome::Written => write!(f, "ok"),
            Outcome::Physical(pa) => write!(f, "{}", pa),
            Outcome::Failed(e) => write!(f, "error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown operation '{op}'")]
    UnknownOperation { line: usize, op: String },
    #[error("line {line}: '{op}' expects {expected} argument(s), got {got}")]
    ArgumentCount { line: usize, op: String, expected: usize, got: usize },
    #[error("line {line}: invalid {what} '{token}'")]
    InvalidNumber { line: usize, what: &'static str, token: String },
}

/// Parse a script: one operation per line, `#` starts a comment.
///
/// ```text
/// w 13 3     # write 3 to virtual address 13
/// r 13       # read it back
/// t 0x100    # show the physical address of 0x100
/// ```
pub fn parse_script(content: &str) -> Result<Vec<Operation>, ScriptError> {
    let mut ops = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line = i + 1;
        let code = raw.split('#').next().unwrap_or_default();
        let tokens: Vec<&str> = code.split_whitespace().collect();
        let Some((&op, args)) = tokens.split_first() else {
            continue;
        };

        let expect_args = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ScriptError::ArgumentCount {
                    line,
                    op: op.to_string(),
                    expected,
                    got: args.len(),
                })
            }
        };

        let parsed = match op {
            "r" | "read" => {
                expect_args(1)?;
                Operation::Read(parse_address(args[0], line)?)
            }
            "w" | "write" => {
                expect_args(2)?;
                let address = parse_address(args[0], line)?;
                let value: Word = args[1].parse().map_err(|_| ScriptError::InvalidNumber {
                    line,
                    what: "value",
                    token: args[1].to_string(),
                })?;
                Operation::Write(address, value)
            }
            "t" | "translate" => {
                expect_args(1)?;
                Operation::Translate(parse_address(args[0], line)?)
            }
            _ => {
                return Err(ScriptError::UnknownOperation { line, op: op.to_string() });
            }
        };
        ops.push(parsed);
    }

    Ok(ops)
}

/// Decimal, or hexadecimal with a `0x` prefix
fn parse_address(token: &str, line: usize) -> Result<u64, ScriptError> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| ScriptError::InvalidNumber {
        line,
        what: "address",
        token: token.to_string(),
    })
}

pub fn read_script<P: AsRef<Path>>(path: P) -> Result<String, std::io::Error> {
    fs::read_to_string(path.as_ref())
}

/// One outcome per line
pub fn format_results(results: &[Outcome]) -> String {
    results.iter().map(|r| format!("{}\n", r)).collect()
}

pub fn write_results<P: AsRef<Path>>(path: P, results: &[Outcome]) -> Result<(), std::io::Error> {
    fs::write(path.as_ref(), format_results(results))
}
