#![allow(clippy::module_inception)]

use std::rc::Rc;

use inkwell::{context::Context, module::Module};
use serde::Serialize;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod backend;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

const NULL_FILE: &str = "<null>";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from(NULL_FILE)))
    }

    /// Whether this position points into no source at all.
    pub fn is_null(&self) -> bool {
        self.0 == 0 && self.1.as_str() == NULL_FILE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }
}

/// Runs every front-end pass and lowers `source` into a fresh module owned by `context`.
///
/// `operands` are the command line values baked into the `arg`/`argf` accessors.
pub fn compile_to_module<'ctx>(
    source: &str,
    file_name: &str,
    operands: &[String],
    context: &'ctx Context,
) -> Result<Module<'ctx>, Error> {
    let tokens = lexer::lexer::tokenize(source.to_string(), Some(file_name.to_string()))?;
    let program = parser::parser::parse(tokens, Rc::new(file_name.to_string()))?;
    let typed = type_checker::type_checker::type_check(&program)?;
    compiler::compiler::compile(&typed, operands, file_name, context)
}

/// Finds the line containing byte offset `position` inside `content`.
///
/// Returns the 1-based line number, the line text and the offset inside that line.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        start = end;
        line_number += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line_at_position() {
        let content = "Hello, world!\nsecond\nthird\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(content, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(content, 35).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);

        assert!(super::get_line_at_position(content, 400).is_none());
    }

    #[test]
    fn test_null_position() {
        assert!(super::Position::null().is_null());
        assert!(!super::Position(0, std::rc::Rc::new("test.ek".to_string())).is_null());
    }

    #[test]
    fn test_remove_starting_whitespace() {
        assert_eq!(
            super::remove_starting_whitespace("    int $x = 1;"),
            (String::from("int $x = 1;"), 4)
        );
    }
}

/// Renders `error` against the source it was raised for, writing to stdout.
pub fn display_error(error: &Error, source: &str) {
    /*
        Error: TypeMismatch (Expected type `int`, received `float`)
        -> test.ek
           |
         3 | int $a = 1.0;
           | ---------^
    */

    let position = error.get_position();

    if let ErrorTip::None = error.get_tip() {
        println!("Error: {}", error.get_error_name());
    } else {
        println!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    if position.is_null() {
        println!("-> {}", error.get_error_impl());
        return;
    }
    println!("-> {}", position.1);

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    println!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    println!("{} | {}", line_string, line_text_removed.trim());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    println!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
