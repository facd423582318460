//! Depth-first traversal of the syntax tree with per-kind visitor hooks.

use crate::parser::{
    BinaryExpression, BlockStatement, BooleanLiteral, Expression, Identifier, IfStatement,
    NullLiteral, NumberLiteral, Program, Statement, StringLiteral, VariableDeclaration,
    VariableDeclarator, WhileStatement,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Program,
    VariableDeclaration,
    VariableDeclarator,
    Identifier,
    NumberLiteral,
    StringLiteral,
    BooleanLiteral,
    NullLiteral,
    BinaryExpression,
    BlockStatement,
    IfStatement,
    WhileStatement,
}

/// Hooks called when the walker enters a node, before its children.
///
/// `parent` is the kind of the enclosing node, `None` for the program root.
/// Every hook defaults to doing nothing.
#[allow(unused_variables)]
pub trait Visitor {
    fn enter_program(&mut self, node: &mut Program, parent: Option<NodeKind>) {}
    fn enter_variable_declaration(
        &mut self,
        node: &mut VariableDeclaration,
        parent: Option<NodeKind>,
    ) {
    }
    fn enter_variable_declarator(
        &mut self,
        node: &mut VariableDeclarator,
        parent: Option<NodeKind>,
    ) {
    }
    fn enter_identifier(&mut self, node: &mut Identifier, parent: Option<NodeKind>) {}
    fn enter_number_literal(&mut self, node: &mut NumberLiteral, parent: Option<NodeKind>) {}
    fn enter_string_literal(&mut self, node: &mut StringLiteral, parent: Option<NodeKind>) {}
    fn enter_boolean_literal(&mut self, node: &mut BooleanLiteral, parent: Option<NodeKind>) {}
    fn enter_null_literal(&mut self, node: &mut NullLiteral, parent: Option<NodeKind>) {}
    fn enter_binary_expression(
        &mut self,
        node: &mut BinaryExpression,
        parent: Option<NodeKind>,
    ) {
    }
    fn enter_block_statement(&mut self, node: &mut BlockStatement, parent: Option<NodeKind>) {}
    fn enter_if_statement(&mut self, node: &mut IfStatement, parent: Option<NodeKind>) {}
    fn enter_while_statement(&mut self, node: &mut WhileStatement, parent: Option<NodeKind>) {}
}

pub fn traverse(program: &mut Program, visitor: &mut impl Visitor) {
    visitor.enter_program(program, None);
    walk_statements(&mut program.body, NodeKind::Program, visitor);
}

fn walk_statements(statements: &mut [Statement], parent: NodeKind, visitor: &mut impl Visitor) {
    for statement in statements {
        walk_statement(statement, parent, visitor);
    }
}

fn walk_statement(statement: &mut Statement, parent: NodeKind, visitor: &mut impl Visitor) {
    match statement {
        Statement::VariableDeclaration(declaration) => {
            visitor.enter_variable_declaration(declaration, Some(parent));
            for declarator in &mut declaration.declarations {
                walk_declarator(declarator, NodeKind::VariableDeclaration, visitor);
            }
        }
        Statement::VariableDeclarator(declarator) => walk_declarator(declarator, parent, visitor),
        Statement::If(if_statement) => {
            visitor.enter_if_statement(if_statement, Some(parent));
            walk_binary(&mut if_statement.test, NodeKind::IfStatement, visitor);
            walk_block(&mut if_statement.consequent, NodeKind::IfStatement, visitor);
            if let Some(alternate) = &mut if_statement.alternate {
                walk_block(alternate, NodeKind::IfStatement, visitor);
            }
        }
        Statement::While(while_statement) => {
            visitor.enter_while_statement(while_statement, Some(parent));
            walk_binary(&mut while_statement.test, NodeKind::WhileStatement, visitor);
            walk_block(&mut while_statement.body, NodeKind::WhileStatement, visitor);
        }
        Statement::Block(block) => walk_block(block, parent, visitor),
        Statement::Expression(expression) => walk_expression(expression, parent, visitor),
    }
}

fn walk_declarator(
    declarator: &mut VariableDeclarator,
    parent: NodeKind,
    visitor: &mut impl Visitor,
) {
    visitor.enter_variable_declarator(declarator, Some(parent));
    visitor.enter_identifier(&mut declarator.id, Some(NodeKind::VariableDeclarator));
    walk_expression(&mut declarator.init, NodeKind::VariableDeclarator, visitor);
}

fn walk_block(block: &mut BlockStatement, parent: NodeKind, visitor: &mut impl Visitor) {
    visitor.enter_block_statement(block, Some(parent));
    walk_statements(&mut block.body, NodeKind::BlockStatement, visitor);
}

fn walk_binary(binary: &mut BinaryExpression, parent: NodeKind, visitor: &mut impl Visitor) {
    visitor.enter_binary_expression(binary, Some(parent));
    walk_expression(&mut binary.left, NodeKind::BinaryExpression, visitor);
    walk_expression(&mut binary.right, NodeKind::BinaryExpression, visitor);
}

fn walk_expression(expression: &mut Expression, parent: NodeKind, visitor: &mut impl Visitor) {
    match expression {
        Expression::Identifier(node) => visitor.enter_identifier(node, Some(parent)),
        Expression::Number(node) => visitor.enter_number_literal(node, Some(parent)),
        Expression::String(node) => visitor.enter_string_literal(node, Some(parent)),
        Expression::Boolean(node) => visitor.enter_boolean_literal(node, Some(parent)),
        Expression::Null(node) => visitor.enter_null_literal(node, Some(parent)),
        Expression::Binary(node) => walk_binary(node, parent, visitor),
    }
}
