// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Macro-token resolution for completed programs.
//!
//! Two token forms are recognized inside header and body text: `@name`
//! (letters, digits and underscores) and `@"expression"`. Bare tokens are
//! resolved across the whole line first, then quoted tokens. Text produced
//! by a substitution is never rescanned.

use crate::core::env::Environment;
use crate::core::source_map::SourceOrigin;

use super::program::Program;

/// A token whose expression could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveFailure {
    pub origin: SourceOrigin,
    pub expr: String,
    pub reason: String,
}

/// Outcome of resolving one line of text.
#[derive(Debug, Default)]
struct LineResolution {
    text: String,
    audit: Vec<String>,
    failures: Vec<(String, String)>,
}

#[derive(Clone, Copy)]
enum TokenForm {
    Bare,
    Quoted,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn resolve_pass(text: &str, form: TokenForm, env: &mut Environment) -> LineResolution {
    let mut out = LineResolution::default();
    let mut rest = text;
    while let Some(at) = rest.find('@') {
        out.text.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let (expr, consumed) = match form {
            TokenForm::Bare => {
                let len = after
                    .char_indices()
                    .find(|(_, c)| !is_word_char(*c))
                    .map(|(idx, _)| idx)
                    .unwrap_or(after.len());
                (&after[..len], len)
            }
            TokenForm::Quoted => match after.strip_prefix('"') {
                Some(body) => match body.find('"') {
                    Some(end) => (&body[..end], end + 2),
                    None => (body, body.len() + 1),
                },
                None => ("", 0),
            },
        };
        if consumed == 0 {
            out.text.push('@');
            rest = after;
            continue;
        }
        let token = &rest[at..at + 1 + consumed];
        match env.eval(expr) {
            Ok(value) => {
                let rendered = value.to_string();
                out.audit.push(format!("{rendered}={expr}"));
                out.text.push_str(&rendered);
            }
            Err(err) => {
                out.failures.push((expr.to_string(), err.message));
                out.text.push_str(token);
            }
        }
        rest = &after[consumed..];
    }
    out.text.push_str(rest);
    out
}

/// Resolve both token forms in `text`, returning the new text, the audit
/// note of each pass, and the failures.
fn resolve_text(
    text: &str,
    env: &mut Environment,
) -> (String, String, String, Vec<(String, String)>) {
    let bare = resolve_pass(text, TokenForm::Bare, env);
    let quoted = resolve_pass(&bare.text, TokenForm::Quoted, env);
    let mut failures = bare.failures;
    failures.extend(quoted.failures);
    (
        quoted.text,
        bare.audit.join(","),
        quoted.audit.join(","),
        failures,
    )
}

/// Resolve macro tokens in a program's header and body against `env`.
///
/// Body records gain an audit comment `value=expression` per substitution.
/// Failed tokens are left in place and reported.
pub fn resolve_program(program: &mut Program, env: &mut Environment) -> Vec<ResolveFailure> {
    let mut failures = Vec::new();
    let program_origin = program.origin().clone();

    for line in program.header_mut().iter_mut() {
        let (text, _, _, failed) = resolve_text(line, env);
        *line = text;
        failures.extend(failed.into_iter().map(|(expr, reason)| ResolveFailure {
            origin: program_origin.clone(),
            expr,
            reason,
        }));
    }

    for record in program.lines_mut().iter_mut() {
        let Some(current) = record.text.as_deref() else {
            continue;
        };
        if current.is_empty() {
            continue;
        }
        let (text, bare_audit, quoted_audit, failed) = resolve_text(current, env);
        record.text = Some(text);
        if !bare_audit.is_empty() {
            record.append_comment(&bare_audit, ",");
        }
        if !quoted_audit.is_empty() {
            record.append_comment(&quoted_audit, "");
        }
        failures.extend(failed.into_iter().map(|(expr, reason)| ResolveFailure {
            origin: record.origin.clone(),
            expr,
            reason,
        }));
    }

    failures
}
