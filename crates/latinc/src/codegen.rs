//! Renders a syntax tree as JavaScript-style source text.
//!
//! Generation only reads the tree. Run it after the transformer to get the
//! target language; run it on a freshly parsed tree and the Latin words are
//! printed as they were written.

use tracing::trace;

use crate::parser::{
    BinaryExpression, BlockStatement, BooleanValue, Expression, NullValue, Program, Statement,
    VariableDeclarator,
};

#[tracing::instrument(level = "trace", skip_all)]
pub fn generate(program: &Program) -> String {
    let output = join_statements(&program.body);
    trace!(output_len = output.len(), "Generated program text");
    output
}

fn join_statements(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(generate_statement)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate_statement(statement: &Statement) -> String {
    match statement {
        Statement::VariableDeclaration(declaration) => {
            let declarators = declaration
                .declarations
                .iter()
                .map(generate_declarator)
                .collect::<Vec<_>>()
                .join("\n");
            format!("{} {}", declaration.kind.as_str(), declarators)
        }
        Statement::VariableDeclarator(declarator) => generate_declarator(declarator),
        Statement::If(if_statement) => {
            let mut out = format!(
                "if ({}) {}",
                generate_binary(&if_statement.test),
                generate_block(&if_statement.consequent)
            );
            if let Some(alternate) = &if_statement.alternate {
                out.push_str(" else ");
                out.push_str(&generate_block(alternate));
            }
            out
        }
        Statement::While(while_statement) => format!(
            "while ({}) {}",
            generate_binary(&while_statement.test),
            generate_block(&while_statement.body)
        ),
        Statement::Block(block) => generate_block(block),
        Statement::Expression(expression) => generate_expression(expression),
    }
}

fn generate_declarator(declarator: &VariableDeclarator) -> String {
    format!(
        "{} = {};",
        declarator.id.name,
        generate_expression(&declarator.init)
    )
}

fn generate_block(block: &BlockStatement) -> String {
    format!("{{{}}}", join_statements(&block.body))
}

fn generate_binary(binary: &BinaryExpression) -> String {
    format!(
        "{} {} {}",
        generate_operand(&binary.left),
        binary.operator,
        generate_operand(&binary.right)
    )
}

/// Nested relations keep the parentheses they were written with.
fn generate_operand(operand: &Expression) -> String {
    match operand {
        Expression::Binary(binary) => format!("({})", generate_binary(binary)),
        other => generate_expression(other),
    }
}

pub fn generate_expression(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(identifier) => identifier.name.clone(),
        Expression::Number(literal) => literal.value.to_string(),
        Expression::String(literal) => format!("\"{}\"", literal.value),
        Expression::Boolean(literal) => match &literal.value {
            BooleanValue::Word(word) => word.clone(),
            BooleanValue::Native(value) => value.to_string(),
        },
        Expression::Null(literal) => match &literal.value {
            NullValue::Word(word) => word.clone(),
            NullValue::Native => "null".to_string(),
        },
        Expression::Binary(binary) => generate_binary(binary),
    }
}
