pub mod ast;
pub mod bp;
pub mod cursor;
pub mod error;
pub mod error_fmt;
mod expr;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod visitor;

pub use ast::{Expr, ExprContext, Module, Stmt};
pub use error::{ContextError, ParseError, RenderError};
pub use lexer::{LexError, Token, TokenKind, tokenize};
pub use parser::{ParseOptions, Parser};
pub use render::{dump, dump_stmt, unparse};
pub use visitor::Visitor;

/// Parse a whole module with default options
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    parse_module_with(source, &ParseOptions::default())
}

pub fn parse_module_with(source: &str, options: &ParseOptions) -> Result<Module, ParseError> {
    Parser::new(source, options)?.parse_module()
}

/// Parse a single `while` statement from the start of `source`.
///
/// `Ok(None)` means the input does not start with a well-formed while
/// statement; anything after the statement is ignored.
pub fn parse_while_statement(source: &str) -> Result<Option<Stmt>, ParseError> {
    Parser::new(source, &ParseOptions::default())?.parse_while_statement()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_while_statement_entry_point() {
        let stmt = parse_while_statement("while x:\n    y = 1\nelse:\n    pass\n")
            .unwrap()
            .unwrap();
        let Stmt::While(node) = stmt else {
            panic!("Expected While, got {:?}", stmt);
        };
        assert_eq!(node.body.len(), 1);
        assert_eq!(node.orelse, vec![Stmt::Pass]);

        // Missing colon is a plain mismatch here
        assert_eq!(parse_while_statement("while x\n").unwrap(), None);
        assert!(parse_module("while x\n").is_err());
    }

    #[test]
    fn test_tree_serializes_to_json() {
        let module = parse_module("a.b = 1\n").unwrap();
        let json = serde_json::to_value(&module).unwrap();
        let stmt = &json["body"][0];
        assert_eq!(stmt["node"], "Assign");
        assert_eq!(stmt["targets"][0]["node"], "Attribute");
        assert_eq!(stmt["targets"][0]["ctx"], "Store");
        assert_eq!(stmt["targets"][0]["attr"], "b");
    }

    #[test]
    fn test_options_are_honoured() {
        let source = "x = [[[[[1]]]]]\n";
        assert!(parse_module(source).is_ok());
        let shallow = ParseOptions { max_depth: 3 };
        assert!(matches!(
            parse_module_with(source, &shallow),
            Err(ParseError::TooDeeplyNested { limit: 3, .. })
        ));
    }

    #[test]
    fn test_lex_errors_surface_through_parse() {
        let err = parse_module("if x:\n        a\n    b\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex(_)));
    }
}
