//! Rewrites the Latin vocabulary left in the tree into its target spelling.
//!
//! Numerals and strings already carry their final values after tokenizing, so
//! only declaration keywords, boolean and null words, and operator words are
//! touched. Every rule matches source vocabulary only; running the pass over
//! an already transformed tree leaves it unchanged.

use crate::ast_walk::{traverse, NodeKind, Visitor};
use crate::parser::{
    BinaryExpression, BooleanLiteral, BooleanValue, DeclarationKind, NullLiteral, NullValue,
    Program, VariableDeclaration,
};

pub struct Transformer;

impl Visitor for Transformer {
    fn enter_variable_declaration(
        &mut self,
        node: &mut VariableDeclaration,
        _parent: Option<NodeKind>,
    ) {
        node.kind = match node.kind {
            DeclarationKind::Dico => DeclarationKind::Var,
            DeclarationKind::Constituo => DeclarationKind::Const,
            DeclarationKind::Pono => DeclarationKind::Let,
            target => target,
        };
    }

    fn enter_binary_expression(&mut self, node: &mut BinaryExpression, _parent: Option<NodeKind>) {
        if let Some(symbol) = operator_symbol(&node.operator) {
            node.operator = symbol.to_string();
        }
    }

    fn enter_boolean_literal(&mut self, node: &mut BooleanLiteral, _parent: Option<NodeKind>) {
        let native = match &node.value {
            BooleanValue::Word(word) if word == "verum" => Some(true),
            BooleanValue::Word(word) if word == "falsum" => Some(false),
            _ => None,
        };
        if let Some(value) = native {
            node.value = BooleanValue::Native(value);
        }
    }

    fn enter_null_literal(&mut self, node: &mut NullLiteral, _parent: Option<NodeKind>) {
        if matches!(&node.value, NullValue::Word(word) if word == "nullus") {
            node.value = NullValue::Native;
        }
    }
}

pub fn operator_symbol(word: &str) -> Option<&'static str> {
    match word {
        "sit" => Some("=="),
        "nonest" => Some("!="),
        "maior" => Some(">"),
        "minor" => Some("<"),
        "additum" => Some("+"),
        "detractum" => Some("-"),
        "multiplicatum" => Some("*"),
        "divisum" => Some("/"),
        _ => None,
    }
}

/// Transforms `program` in place.
#[tracing::instrument(level = "trace", skip_all)]
pub fn transform(program: &mut Program) {
    traverse(program, &mut Transformer);
}
