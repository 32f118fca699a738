//! Stored-procedure calls and what they return.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ProcMapperError, Result};
use crate::params::ParameterSet;
use crate::results::TabularResult;
use crate::types::RowValues;

/// Name of the reserved integer output parameter carrying the procedure's error number.
pub const ERROR_NUMBER_PARAM: &str = "NmbError";
/// Name of the reserved string output parameter carrying the procedure's error message.
pub const ERROR_MESSAGE_PARAM: &str = "MsgError";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_#][\p{L}\p{N}_@#$]{0,127}$").expect("identifier pattern is valid")
});

/// SQL type of an output parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Int,
    /// `VARCHAR(MAX)`
    VarCharMax,
}

impl OutputType {
    #[must_use]
    pub fn sql_type(self) -> &'static str {
        match self {
            OutputType::Int => "INT",
            OutputType::VarCharMax => "VARCHAR(MAX)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterDirection {
    Input,
    Output(OutputType),
}

/// A parameter as it is bound on the command: `@`-prefixed name, value and direction.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: RowValues,
    pub direction: ParameterDirection,
}

impl BoundParameter {
    /// Name without the `@` prefix.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('@')
    }

    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self.direction, ParameterDirection::Output(_))
    }
}

/// A validated procedure invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    name: String,
    name_parts: Vec<String>,
    parameters: ParameterSet,
    bind_status: bool,
}

impl ProcedureCall {
    /// Validate `name` and `parameters` into a call.
    ///
    /// `name` may be schema-qualified (`dbo.getEmployee`) and its parts may already be
    /// bracket-quoted. Parameter names must be plain identifiers.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ParameterError` for an empty or malformed procedure name,
    /// a malformed parameter name, or a parameter that reuses a reserved status name while
    /// status parameters are bound.
    pub fn new(name: &str, parameters: ParameterSet, bind_status: bool) -> Result<Self> {
        let name_parts = split_procedure_name(name)?;

        for (key, _) in parameters.iter() {
            if !IDENTIFIER.is_match(key) {
                return Err(ProcMapperError::ParameterError(format!(
                    "`{key}` is not a valid parameter name"
                )));
            }
            if bind_status
                && (key.eq_ignore_ascii_case(ERROR_NUMBER_PARAM)
                    || key.eq_ignore_ascii_case(ERROR_MESSAGE_PARAM))
            {
                return Err(ProcMapperError::ParameterError(format!(
                    "`{key}` is reserved for the procedure status output"
                )));
            }
        }

        Ok(Self {
            name: name.trim().to_string(),
            name_parts,
            parameters,
            bind_status,
        })
    }

    /// The procedure name as given by the caller.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unquoted parts of the (possibly schema-qualified) name.
    #[must_use]
    pub fn name_parts(&self) -> &[String] {
        &self.name_parts
    }

    /// Bracket-quoted name safe to splice into a command, e.g. `[dbo].[getEmployee]`.
    #[must_use]
    pub fn quoted_name(&self) -> String {
        self.name_parts
            .iter()
            .map(|part| format!("[{}]", part.replace(']', "]]")))
            .collect::<Vec<_>>()
            .join(".")
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    #[must_use]
    pub fn binds_status(&self) -> bool {
        self.bind_status
    }

    /// Every parameter the command binds: inputs ordered by name, then the status outputs.
    #[must_use]
    pub fn bound_parameters(&self) -> Vec<BoundParameter> {
        let mut bound: Vec<BoundParameter> = self
            .parameters
            .iter()
            .map(|(key, value)| BoundParameter {
                name: format!("@{key}"),
                value: value.clone(),
                direction: ParameterDirection::Input,
            })
            .collect();

        if self.bind_status {
            bound.push(BoundParameter {
                name: format!("@{ERROR_NUMBER_PARAM}"),
                value: RowValues::Null,
                direction: ParameterDirection::Output(OutputType::Int),
            });
            bound.push(BoundParameter {
                name: format!("@{ERROR_MESSAGE_PARAM}"),
                value: RowValues::Null,
                direction: ParameterDirection::Output(OutputType::VarCharMax),
            });
        }
        bound
    }
}

fn split_procedure_name(name: &str) -> Result<Vec<String>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProcMapperError::ParameterError(
            "procedure name must not be empty".to_string(),
        ));
    }

    let mut parts = Vec::new();
    let mut rest = name;
    loop {
        let (part, tail) = if let Some(quoted) = rest.strip_prefix('[') {
            let end = find_closing_bracket(quoted).ok_or_else(|| {
                ProcMapperError::ParameterError(format!("unterminated `[` in `{name}`"))
            })?;
            (quoted[..end].replace("]]", "]"), &quoted[end + 1..])
        } else {
            let end = rest.find('.').unwrap_or(rest.len());
            let part = &rest[..end];
            if !IDENTIFIER.is_match(part) {
                return Err(ProcMapperError::ParameterError(format!(
                    "`{name}` is not a valid procedure name"
                )));
            }
            (part.to_string(), &rest[end..])
        };

        if part.is_empty() {
            return Err(ProcMapperError::ParameterError(format!(
                "`{name}` has an empty name part"
            )));
        }
        parts.push(part);

        match tail.strip_prefix('.') {
            Some(next) => rest = next,
            None if tail.is_empty() => break,
            None => {
                return Err(ProcMapperError::ParameterError(format!(
                    "`{name}` is not a valid procedure name"
                )));
            }
        }
    }

    if parts.len() > 3 {
        return Err(ProcMapperError::ParameterError(format!(
            "`{name}` has too many name parts"
        )));
    }
    Ok(parts)
}

// Index of the `]` closing a quoted part, skipping `]]` escapes.
fn find_closing_bracket(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b']' {
            if bytes.get(i + 1) == Some(&b']') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Values written by the procedure into `@NmbError` / `@MsgError`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureStatus {
    pub error_number: Option<i32>,
    pub error_message: Option<String>,
}

impl ProcedureStatus {
    /// True when the procedure set a non-zero error number.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.error_number, Some(code) if code != 0)
    }

    /// Turn a reported application error into `ProcMapperError::ProcedureFailed`.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ProcedureFailed` if `is_error()` holds.
    pub fn check(&self) -> Result<()> {
        match self.error_number {
            Some(code) if code != 0 => Err(ProcMapperError::ProcedureFailed {
                code,
                message: self.error_message.clone().unwrap_or_default(),
            }),
            _ => Ok(()),
        }
    }
}

/// Result of `execute`: the first result set plus the status outputs.
#[derive(Debug, Clone, Default)]
pub struct ProcedureOutput {
    pub result: TabularResult,
    pub status: ProcedureStatus,
}
