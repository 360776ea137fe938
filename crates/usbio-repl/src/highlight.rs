//! Line editor support for the REPL
//!
//! Syntax highlighting, bracket matching, completion and input validation.

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::collections::HashSet;
use steel_parser::lexer::TokenStream;
use steel_parser::parser::SourceId;
use steel_parser::span::Span;
use steel_parser::tokens::TokenType;

use crate::dispatch::COMMANDS;
use crate::script::{constant_names, UTILITIES};

/// rustyline helper aware of the bridge commands and constants
#[derive(Helper)]
pub struct ReplHelper {
    commands: HashSet<String>,
    constants: HashSet<String>,
}

impl ReplHelper {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS
                .iter()
                .map(|spec| spec.name)
                .chain(UTILITIES.iter().copied())
                .map(str::to_string)
                .collect(),
            constants: constant_names().into_iter().map(str::to_string).collect(),
        }
    }

    /// Known names matching `prefix`, prefix matches first
    fn candidates(&self, fragment: &str) -> Vec<String> {
        let mut starting = Vec::new();
        let mut containing = Vec::new();
        for name in self.commands.iter().chain(&self.constants) {
            if name.starts_with(fragment) {
                starting.push(name.clone());
            } else if name.contains(fragment) {
                containing.push(name.clone());
            }
        }
        starting.sort();
        containing.sort();
        starting.into_iter().chain(containing).collect()
    }
}

impl Default for ReplHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let found = TokenStream::new(line, true, SourceId::none()).find_map(|token| match token.ty {
            TokenType::Identifier(ref symbol) if (token.span().start()..=token.span().end()).contains(&pos) => {
                Some((token.span(), symbol.to_string()))
            }
            _ => None,
        });

        let Some((span, fragment)) = found else {
            return Ok((0, Vec::new()));
        };

        let completions = self
            .candidates(&fragment)
            .into_iter()
            .map(|name| Pair {
                display: format!("{}", name.white()),
                replacement: name,
            })
            .collect();

        Ok((span.start(), completions))
    }

    fn update(
        &self,
        line: &mut rustyline::line_buffer::LineBuffer,
        start: usize,
        elected: &str,
        cl: &mut rustyline::Changeset,
    ) {
        let end = TokenStream::new(line, true, SourceId::none())
            .find(|token| token.span().start() == start)
            .map(|token| token.span().end());
        if let Some(end) = end {
            line.replace(start..end, elected, cl);
        }
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut balance = 0i32;
        let mut has_error = false;

        for token in TokenStream::new(ctx.input(), true, SourceId::none()) {
            match token.ty {
                TokenType::OpenParen(..) => balance += 1,
                TokenType::CloseParen(_) => balance -= 1,
                // unterminated string or comment
                TokenType::Error => has_error = true,
                _ => {}
            }
        }

        if balance > 0 || (has_error && balance >= 0) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _context: &Context) -> Option<String> {
        None
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let paren = matching_paren(line, pos);

        let mut ranges: Vec<(std::ops::Range<usize>, String)> = Vec::new();
        for token in TokenStream::new(line, true, SourceId::none()) {
            let source = token.source();
            let colored = match &token.ty {
                TokenType::Lambda
                | TokenType::If
                | TokenType::Define
                | TokenType::Let
                | TokenType::Require => source.bright_purple(),
                TokenType::BooleanLiteral(_) => source.bright_magenta(),
                TokenType::Number(_) => source.bright_yellow(),
                TokenType::StringLiteral(_) => source.bright_green(),
                TokenType::Identifier(ident) if self.commands.contains(ident.as_ref()) => {
                    source.bright_blue()
                }
                TokenType::Identifier(ident) if self.constants.contains(ident.as_ref()) => {
                    source.bright_cyan()
                }
                _ => continue,
            };
            ranges.push((token.span().range(), colored.to_string()));
        }
        if let Some(at) = paren {
            if let Some(ch) = line.get(at..at + 1) {
                ranges.push((at..at + 1, format!("\x1b[1;34m{}\x1b[0m", ch)));
            }
        }
        if ranges.is_empty() {
            return Cow::Borrowed(line);
        }

        // token ranges never overlap a paren, so sorting by start is enough
        ranges.sort_by_key(|(range, _)| range.start);
        let mut highlighted = String::with_capacity(line.len() * 2);
        let mut last = 0;
        for (range, replacement) in ranges {
            highlighted.push_str(&line[last..range.start]);
            highlighted.push_str(&replacement);
            last = range.end;
        }
        highlighted.push_str(&line[last..]);
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, line: &str, pos: usize, _forced: bool) -> bool {
        if line.is_empty() {
            return false;
        }
        if check_bracket(line, pos).is_some() {
            return true;
        }
        if pos >= line.len() {
            let b = line.as_bytes()[line.len() - 1];
            matches!(b, b'"' | b' ') || b.is_ascii_digit()
        } else {
            false
        }
    }
}

/// Byte offset of the paren matching the one at or just before `pos`
fn matching_paren(line: &str, pos: usize) -> Option<usize> {
    let mut stack: Vec<Span> = Vec::new();
    for token in TokenStream::new(line, true, SourceId::none()) {
        match token.ty {
            TokenType::OpenParen(_, paren_mod) => {
                stack.push(TokenType::open_span(token.span, paren_mod));
            }
            TokenType::CloseParen(_) => {
                let close = token.span;
                let Some(open) = stack.pop() else {
                    continue;
                };
                if open.start() == pos {
                    return Some(close.start());
                }
                if close.start() == pos || close.end() == pos {
                    return Some(open.start());
                }
            }
            _ => {}
        }
    }
    None
}

/// Bracket under or next to the cursor
fn check_bracket(line: &str, pos: usize) -> Option<(u8, usize)> {
    let bytes = line.as_bytes();

    let on_bracket = |pos: usize| {
        let b = bytes.get(pos).copied()?;
        let open = is_open_bracket(b);
        let close = is_close_bracket(b);

        if (open && (pos + 1 < bytes.len())) || (close && pos > 0) {
            Some((b, open))
        } else {
            None
        }
    };

    if let Some((current, _)) = on_bracket(pos) {
        return Some((current, pos));
    }

    if pos > 0 {
        if let Some((current, false)) = on_bracket(pos - 1) {
            return Some((current, pos - 1));
        }
    }

    match on_bracket(pos + 1) {
        Some((current, true)) => Some((current, pos + 1)),
        _ => None,
    }
}

fn is_open_bracket(bracket: u8) -> bool {
    matches!(bracket, b'{' | b'[' | b'(')
}

fn is_close_bracket(bracket: u8) -> bool {
    matches!(bracket, b'}' | b']' | b')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_prefer_prefix() {
        let helper = ReplHelper::new();
        let found = helper.candidates("spi_read");
        assert_eq!(found[0], "spi_read");
        assert!(found.contains(&"spi_read_write".to_string()));
        assert!(helper.candidates("START").contains(&"START_AND_STOP".to_string()));
    }

    #[test]
    fn test_check_bracket() {
        assert_eq!(check_bracket("(spi_reset)", 0), Some((b'(', 0)));
        assert_eq!(check_bracket("(spi_reset)", 11), Some((b')', 10)));
        assert_eq!(check_bracket("", 0), None);
        assert_eq!(check_bracket("abc", 1), None);
    }

    #[test]
    fn test_matching_paren() {
        let line = "(spi_read 4)";
        assert_eq!(matching_paren(line, 0), Some(11));
        assert_eq!(matching_paren(line, 12), Some(0));
        assert_eq!(matching_paren(line, 5), None);
    }

    #[test]
    fn test_highlight_plain_text_is_borrowed() {
        let helper = ReplHelper::new();
        assert!(matches!(helper.highlight("foo", 0), Cow::Borrowed("foo")));
    }
}
