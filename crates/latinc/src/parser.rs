use serde::Serialize;
use tracing::trace;

use crate::tokenizer::{Keyword, Position, Token, TokenData, NULL_WORD};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    /// A bare `name esse value` binding outside of a declaration.
    VariableDeclarator(VariableDeclarator),
    If(IfStatement),
    While(WhileStatement),
    Block(BlockStatement),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expression {
    Identifier(Identifier),
    Number(NumberLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Null(NullLiteral),
    Binary(BinaryExpression),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    Dico,
    Constituo,
    Pono,
    Var,
    Const,
    Let,
}

impl DeclarationKind {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Dico => Some(DeclarationKind::Dico),
            Keyword::Constituo => Some(DeclarationKind::Constituo),
            Keyword::Pono => Some(DeclarationKind::Pono),
            Keyword::Si | Keyword::Dum => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Dico => "dico",
            DeclarationKind::Constituo => "constituo",
            DeclarationKind::Pono => "pono",
            DeclarationKind::Var => "var",
            DeclarationKind::Const => "const",
            DeclarationKind::Let => "let",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    /// Never empty.
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Expression,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NumberLiteral {
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BooleanLiteral {
    pub value: BooleanValue,
}

/// Boolean literals keep their source word until the transformer runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BooleanValue {
    Word(String),
    Native(bool),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NullLiteral {
    pub value: NullValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NullValue {
    Word(String),
    Native,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: String,
    pub right: Box<Expression>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IfStatement {
    pub test: BinaryExpression,
    pub consequent: BlockStatement,
    /// There is no `else` keyword yet, so the parser always leaves this empty.
    pub alternate: Option<BlockStatement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WhileStatement {
    pub test: BinaryExpression,
    pub body: BlockStatement,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected {found} at {position}")]
    UnexpectedToken { found: String, position: Position },
    #[error("expected {expected}, found {found} at {position}")]
    Expected {
        expected: &'static str,
        found: String,
        position: Position,
    },
    #[error("expected condition after \"{keyword}\" at {position}")]
    MissingCondition {
        keyword: &'static str,
        position: Position,
    },
    #[error("expected '{{' after condition at {position}")]
    MissingOpeningBrace { position: Position },
    #[error("expected '}}' after {context} body at {position}")]
    MissingClosingBrace {
        context: &'static str,
        position: Position,
    },
    #[error("declaration without any declarators at {position}")]
    EmptyDeclaration { position: Position },
    #[error("nesting deeper than {} levels at {position}", MAX_NESTING)]
    NestingTooDeep { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::UnexpectedEnd => None,
            ParseError::UnexpectedToken { position, .. }
            | ParseError::Expected { position, .. }
            | ParseError::MissingCondition { position, .. }
            | ParseError::MissingOpeningBrace { position }
            | ParseError::MissingClosingBrace { position, .. }
            | ParseError::EmptyDeclaration { position }
            | ParseError::NestingTooDeep { position } => Some(*position),
        }
    }
}

/// How many blocks and parenthesized relations may enclose one another.
pub const MAX_NESTING: usize = 256;

#[tracing::instrument(level = "trace", skip_all)]
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut parser = Parser {
        tokens,
        current: 0,
        depth: 0,
    };
    let mut program = Program { body: vec![] };

    while let Some(token) = parser.peek() {
        if token.data == TokenData::Semicolon {
            parser.current += 1;
            continue;
        }
        program.body.push(parser.parse_statement()?);
    }

    trace!(statements = program.body.len(), "Parsed program");
    Ok(program)
}

/// A cursor over an immutable token slice. Every production consumes exactly
/// the tokens it needs, terminators included.
struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    /// Blocks and parentheses currently open.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.current)
    }

    fn next(&mut self) -> Result<&'a Token, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.current += 1;
        Ok(token)
    }

    fn enter_nesting(&mut self, position: Position) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep { position });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        trace!(token = ?token.data, "Parsing statement");

        match &token.data {
            TokenData::Keyword(keyword @ (Keyword::Si | Keyword::Dum)) => {
                self.parse_control(*keyword)
            }
            TokenData::Keyword(keyword) => self
                .parse_declaration(*keyword)
                .map(Statement::VariableDeclaration),
            TokenData::Name(_) => self
                .parse_declarator()
                .map(Statement::VariableDeclarator),
            TokenData::Brace { is_opening: true } => {
                self.parse_block("block statement").map(Statement::Block)
            }
            TokenData::Number(_)
            | TokenData::String(_)
            | TokenData::Boolean(_)
            | TokenData::Null
            | TokenData::Parenthesis { is_opening: true } => {
                self.parse_operand().map(Statement::Expression)
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                position: token.position,
            }),
        }
    }

    fn parse_control(&mut self, keyword: Keyword) -> Result<Statement, ParseError> {
        let keyword_token = self.next()?;
        let (keyword_text, context) = match keyword {
            Keyword::Si => ("if", "if statement"),
            _ => ("while", "while statement"),
        };

        let test = match self.parse_expression()? {
            Expression::Binary(test) => test,
            _ => {
                return Err(ParseError::MissingCondition {
                    keyword: keyword_text,
                    position: keyword_token.position,
                })
            }
        };

        match self.peek() {
            Some(Token {
                data: TokenData::Brace { is_opening: true },
                ..
            }) => {}
            Some(token) => {
                return Err(ParseError::MissingOpeningBrace {
                    position: token.position,
                })
            }
            None => return Err(ParseError::UnexpectedEnd),
        }
        let block = self.parse_block(context)?;

        Ok(match keyword {
            Keyword::Si => Statement::If(IfStatement {
                test,
                consequent: block,
                alternate: None,
            }),
            _ => Statement::While(WhileStatement { test, body: block }),
        })
    }

    fn parse_declaration(&mut self, keyword: Keyword) -> Result<VariableDeclaration, ParseError> {
        let keyword_token = self.next()?;
        let kind = DeclarationKind::from_keyword(keyword).ok_or_else(|| {
            ParseError::UnexpectedToken {
                found: keyword_token.data.describe(),
                position: keyword_token.position,
            }
        })?;

        let mut declarations = vec![];
        while let Some(token) = self.peek() {
            match token.data {
                TokenData::Semicolon => {
                    self.current += 1;
                    break;
                }
                TokenData::Brace { is_opening: false } => break,
                _ => declarations.push(self.parse_declarator()?),
            }
        }

        if declarations.is_empty() {
            return Err(ParseError::EmptyDeclaration {
                position: keyword_token.position,
            });
        }
        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_declarator(&mut self) -> Result<VariableDeclarator, ParseError> {
        let token = self.next()?;
        let TokenData::Name(name) = &token.data else {
            return Err(ParseError::Expected {
                expected: "a variable name",
                found: token.data.describe(),
                position: token.position,
            });
        };

        let marker = self.next()?;
        if marker.data != TokenData::Copula {
            return Err(ParseError::Expected {
                expected: "'esse'",
                found: marker.data.describe(),
                position: marker.position,
            });
        }

        Ok(VariableDeclarator {
            id: Identifier { name: name.clone() },
            init: self.parse_expression()?,
        })
    }

    fn parse_block(&mut self, context: &'static str) -> Result<BlockStatement, ParseError> {
        let opening = self.next()?;
        self.enter_nesting(opening.position)?;
        let block = self.parse_block_body(opening, context);
        self.depth -= 1;
        block
    }

    fn parse_block_body(
        &mut self,
        opening: &Token,
        context: &'static str,
    ) -> Result<BlockStatement, ParseError> {
        let mut block = BlockStatement::default();

        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::MissingClosingBrace {
                    context,
                    position: opening.position,
                });
            };
            match token.data {
                TokenData::Brace { is_opening: false } => {
                    self.current += 1;
                    return Ok(block);
                }
                TokenData::Semicolon => self.current += 1,
                _ => block.body.push(self.parse_statement()?),
            }
        }
    }

    /// An operand, optionally followed by one operator and a second operand.
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_operand()?;
        match self.peek() {
            Some(Token {
                data: TokenData::Operator(_),
                ..
            }) => self.parse_binary_tail(left).map(Expression::Binary),
            _ => Ok(left),
        }
    }

    fn parse_binary_tail(&mut self, left: Expression) -> Result<BinaryExpression, ParseError> {
        let token = self.next()?;
        let TokenData::Operator(operator) = &token.data else {
            return Err(ParseError::Expected {
                expected: "an operator",
                found: token.data.describe(),
                position: token.position,
            });
        };
        let right = self.parse_operand()?;

        Ok(BinaryExpression {
            left: Box::new(left),
            operator: operator.clone(),
            right: Box::new(right),
        })
    }

    fn parse_operand(&mut self) -> Result<Expression, ParseError> {
        let token = self.next()?;
        let expression = match &token.data {
            TokenData::Number(value) => Expression::Number(NumberLiteral { value: *value }),
            TokenData::String(value) => Expression::String(StringLiteral {
                value: value.clone(),
            }),
            TokenData::Boolean(word) => Expression::Boolean(BooleanLiteral {
                value: BooleanValue::Word(word.clone()),
            }),
            TokenData::Null => Expression::Null(NullLiteral {
                value: NullValue::Word(NULL_WORD.to_string()),
            }),
            TokenData::Name(name) => Expression::Identifier(Identifier { name: name.clone() }),
            TokenData::Parenthesis { is_opening: true } => {
                self.enter_nesting(token.position)?;
                let binary = self.parse_parenthesized();
                self.depth -= 1;
                Expression::Binary(binary?)
            }
            other => {
                return Err(ParseError::Expected {
                    expected: "an expression",
                    found: other.describe(),
                    position: token.position,
                })
            }
        };
        Ok(expression)
    }

    /// The relation and closing `)` after an opening parenthesis.
    fn parse_parenthesized(&mut self) -> Result<BinaryExpression, ParseError> {
        let left = self.parse_operand()?;
        let binary = self.parse_binary_tail(left)?;
        let closing = self.next()?;
        if closing.data != (TokenData::Parenthesis { is_opening: false }) {
            return Err(ParseError::Expected {
                expected: "')'",
                found: closing.data.describe(),
                position: closing.position,
            });
        }
        Ok(binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_source(source: &str) -> Program {
        let tokens = tokenize(source).expect("tokenize source");
        parse(&tokens).expect("parse source")
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = tokenize(source).expect("tokenize source");
        parse(&tokens).expect_err("parse should fail")
    }

    fn token(data: TokenData, column: u32) -> Token {
        Token {
            data,
            position: Position::new(1, column),
        }
    }

    fn number(value: i64) -> Expression {
        Expression::Number(NumberLiteral { value })
    }

    fn ident(name: &str) -> Identifier {
        Identifier {
            name: name.to_string(),
        }
    }

    #[test]
    fn simple_declaration() {
        assert_eq!(
            parse_source("dico age esse XVIII;"),
            Program {
                body: vec![Statement::VariableDeclaration(VariableDeclaration {
                    kind: DeclarationKind::Dico,
                    declarations: vec![VariableDeclarator {
                        id: ident("age"),
                        init: number(18),
                    }],
                })],
            }
        );
    }

    #[test]
    fn tokens_without_terminator() {
        let tokens = vec![
            token(TokenData::Keyword(Keyword::Dico), 1),
            token(TokenData::Name("isEmployed".to_string()), 6),
            token(TokenData::Copula, 18),
            token(TokenData::Boolean("falsum".to_string()), 24),
        ];
        let program = parse(&tokens).expect("parse tokens");
        assert_eq!(
            program.body,
            vec![Statement::VariableDeclaration(VariableDeclaration {
                kind: DeclarationKind::Dico,
                declarations: vec![VariableDeclarator {
                    id: ident("isEmployed"),
                    init: Expression::Boolean(BooleanLiteral {
                        value: BooleanValue::Word("falsum".to_string()),
                    }),
                }],
            })]
        );
    }

    #[test]
    fn consecutive_declarations_stay_separate() {
        let program = parse_source("dico a esse I; constituo b esse II; pono c esse nullus;");
        let kinds: Vec<DeclarationKind> = program
            .body
            .iter()
            .map(|statement| match statement {
                Statement::VariableDeclaration(declaration) => {
                    assert_eq!(declaration.declarations.len(), 1);
                    declaration.kind
                }
                other => panic!("expected a declaration, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                DeclarationKind::Dico,
                DeclarationKind::Constituo,
                DeclarationKind::Pono
            ]
        );
    }

    #[test]
    fn parsing_leaves_tokens_untouched() {
        let tokens = tokenize("dico a esse I; dico b esse II;").expect("tokenize");
        let before = tokens.clone();
        let first = parse(&tokens).expect("first parse");
        let second = parse(&tokens).expect("second parse");
        assert_eq!(tokens, before);
        assert_eq!(first, second);
    }

    #[test]
    fn multiple_declarators() {
        let program = parse_source("dico a esse I b esse \"duo\";");
        let Statement::VariableDeclaration(declaration) = &program.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(declaration.declarations.len(), 2);
        assert_eq!(
            declaration.declarations[1].init,
            Expression::String(StringLiteral {
                value: "duo".to_string()
            })
        );
    }

    #[test]
    fn initializer_may_be_a_relation() {
        let program = parse_source("dico summa esse a additum -II;");
        let Statement::VariableDeclaration(declaration) = &program.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(
            declaration.declarations[0].init,
            Expression::Binary(BinaryExpression {
                left: Box::new(Expression::Identifier(ident("a"))),
                operator: "additum".to_string(),
                right: Box::new(number(-2)),
            })
        );
    }

    #[test]
    fn if_statement_with_parenthesized_condition() {
        let program = parse_source("si (condicio sit V) { dico age esse XV; };");
        assert_eq!(
            program.body,
            vec![Statement::If(IfStatement {
                test: BinaryExpression {
                    left: Box::new(Expression::Identifier(ident("condicio"))),
                    operator: "sit".to_string(),
                    right: Box::new(number(5)),
                },
                consequent: BlockStatement {
                    body: vec![Statement::VariableDeclaration(VariableDeclaration {
                        kind: DeclarationKind::Dico,
                        declarations: vec![VariableDeclarator {
                            id: ident("age"),
                            init: number(15),
                        }],
                    })],
                },
                alternate: None,
            })]
        );
    }

    #[test]
    fn while_statement_with_bare_condition() {
        let program = parse_source("dum i minor X { i esse i additum I; }");
        let Statement::While(while_statement) = &program.body[0] else {
            panic!("expected a while statement, got {:?}", program.body);
        };
        assert_eq!(while_statement.test.operator, "minor");
        assert_eq!(
            while_statement.body.body,
            vec![Statement::VariableDeclarator(VariableDeclarator {
                id: ident("i"),
                init: Expression::Binary(BinaryExpression {
                    left: Box::new(Expression::Identifier(ident("i"))),
                    operator: "additum".to_string(),
                    right: Box::new(number(1)),
                }),
            })]
        );
    }

    #[test]
    fn nested_blocks() {
        let program = parse_source("{ { dico a esse I } }");
        let Statement::Block(outer) = &program.body[0] else {
            panic!("expected a block");
        };
        let Statement::Block(inner) = &outer.body[0] else {
            panic!("expected a nested block");
        };
        assert_eq!(inner.body.len(), 1);
    }

    #[test]
    fn literal_statements() {
        let program = parse_source("XLII; \"salve\"; verum;");
        assert_eq!(program.body.len(), 3);
        assert_eq!(program.body[0], Statement::Expression(number(42)));
    }

    #[test]
    fn missing_condition() {
        let err = parse_err("si a { }");
        assert_eq!(
            err,
            ParseError::MissingCondition {
                keyword: "if",
                position: Position {
                    offset: 0,
                    line: 1,
                    column: 1
                },
            }
        );
    }

    #[test]
    fn missing_opening_brace() {
        let err = parse_err("dum a sit b dico c esse I;");
        assert!(
            matches!(err, ParseError::MissingOpeningBrace { position } if position.column == 13),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn missing_closing_brace() {
        let tokens = vec![
            token(TokenData::Keyword(Keyword::Si), 1),
            token(TokenData::Name("a".to_string()), 4),
            token(TokenData::Operator("sit".to_string()), 6),
            token(TokenData::Name("b".to_string()), 10),
            token(TokenData::Brace { is_opening: true }, 12),
        ];
        let err = parse(&tokens).expect_err("parse should fail");
        assert_eq!(
            err.to_string(),
            "expected '}' after if statement body at line 1 column 12"
        );
    }

    #[test]
    fn missing_copula() {
        let err = parse_err("dico age XVIII;");
        assert_eq!(
            err.to_string(),
            "expected 'esse', found number 18 at line 1 column 10"
        );
    }

    #[test]
    fn empty_declaration() {
        let err = parse_err("constituo;");
        assert!(matches!(err, ParseError::EmptyDeclaration { .. }));
    }

    #[test]
    fn unexpected_end_of_input() {
        let tokens = vec![
            token(TokenData::Keyword(Keyword::Dico), 1),
            token(TokenData::Name("a".to_string()), 6),
            token(TokenData::Copula, 8),
        ];
        let err = parse(&tokens).expect_err("parse should fail");
        assert_eq!(err, ParseError::UnexpectedEnd);
        assert_eq!(err.position(), None);
        assert_eq!(err.to_string(), "unexpected end of input");
    }

    #[test]
    fn deeply_nested_blocks_are_rejected() {
        let source = format!("{}{}", "{".repeat(10_000), "}".repeat(10_000));
        let err = parse_err(&source);
        assert_eq!(
            err,
            ParseError::NestingTooDeep {
                position: Position {
                    offset: MAX_NESTING,
                    line: 1,
                    column: MAX_NESTING as u32 + 1,
                },
            }
        );
    }

    #[test]
    fn deeply_nested_parentheses_are_rejected() {
        let source = format!("dico a esse {}I sit I{};", "(".repeat(1_000), ")".repeat(1_000));
        let err = parse_err(&source);
        assert!(
            matches!(err, ParseError::NestingTooDeep { .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let source = format!("{}{}", "{".repeat(MAX_NESTING), "}".repeat(MAX_NESTING));
        let program = parse_source(&source);
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn stray_tokens_are_rejected() {
        let err = parse_err("esse");
        assert!(
            matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "'esse'"),
            "unexpected error: {err:?}"
        );
    }
}
