//! Restricted arithmetic for offset and end-cut formulas stored in the catalog.
//!
//! Grammar: numbers, the six section constants, `+ - * /`, unary sign and
//! parentheses. Anything else is rejected as `InvalidFormula`.

use crate::core::constants::WorkingConstants;
use crate::domain::model::Category;
use crate::utils::error::{RecipeError, Result};

/// 公式中允許使用的常數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    DistEndToLastRungCut,
    RungCount,
    Pitch,
    SectionWidth,
    DistEndToFirstRungRaw,
    StileLength,
}

impl Variable {
    // 目錄裡同時存在 Pitch 與 pitch 兩種寫法，名稱比對不分大小寫
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "distendtolastrungcut" => Some(Variable::DistEndToLastRungCut),
            "rungcount" => Some(Variable::RungCount),
            "pitch" => Some(Variable::Pitch),
            "sectionwidth" => Some(Variable::SectionWidth),
            "distendtofirstrungraw" => Some(Variable::DistEndToFirstRungRaw),
            "stilelength" => Some(Variable::StileLength),
            _ => None,
        }
    }

    fn value(self, constants: &WorkingConstants, category: Category) -> f64 {
        match self {
            Variable::DistEndToLastRungCut => constants.end_cut(category),
            Variable::RungCount => f64::from(constants.rung_count),
            Variable::Pitch => constants.pitch,
            Variable::SectionWidth => constants.section_width,
            Variable::DistEndToFirstRungRaw => constants.dist_end_to_first_rung,
            Variable::StileLength => constants.stile_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Var(Variable),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

const PREFIX_BP: u8 = 3;

// 括號與正負號的巢狀上限
const MAX_DEPTH: usize = 64;

fn invalid(expression: &str, reason: impl Into<String>) -> RecipeError {
    RecipeError::InvalidFormula {
        formula: expression.to_string(),
        reason: reason.into(),
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(expression, format!("bad number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &expression[start..end];
                let var = Variable::from_name(name)
                    .ok_or_else(|| invalid(expression, format!("unknown identifier '{}'", name)))?;
                tokens.push(Token::Var(var));
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(invalid(expression, format!("unexpected character '{}'", other)))
                    }
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    constants: &'a WorkingConstants,
    category: Category,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn binding_power(token: Token) -> Option<u8> {
        match token {
            Token::Plus | Token::Minus => Some(1),
            Token::Star | Token::Slash => Some(2),
            _ => None,
        }
    }

    fn parse_nested(&mut self, min_bp: u8) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(invalid(self.expression, "formula nested too deeply"));
        }
        self.depth += 1;
        let value = self.parse_expr(min_bp);
        self.depth -= 1;
        value
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<f64> {
        let mut lhs = match self.advance() {
            Some(Token::Number(n)) => n,
            Some(Token::Var(var)) => var.value(self.constants, self.category),
            Some(Token::Minus) => -self.parse_nested(PREFIX_BP)?,
            Some(Token::Plus) => self.parse_nested(PREFIX_BP)?,
            Some(Token::LParen) => {
                let inner = self.parse_nested(0)?;
                match self.advance() {
                    Some(Token::RParen) => inner,
                    _ => return Err(invalid(self.expression, "missing ')'")),
                }
            }
            Some(other) => {
                return Err(invalid(self.expression, format!("unexpected token {:?}", other)))
            }
            None => return Err(invalid(self.expression, "unexpected end of formula")),
        };

        while let Some(op) = self.peek() {
            let Some(bp) = Self::binding_power(op) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(bp + 1)?;
            lhs = match op {
                Token::Plus => lhs + rhs,
                Token::Minus => lhs - rhs,
                Token::Star => lhs * rhs,
                _ => {
                    if rhs == 0.0 {
                        return Err(invalid(self.expression, "division by zero"));
                    }
                    lhs / rhs
                }
            };
        }

        Ok(lhs)
    }
}

/// 以本次執行的常數計算公式；`DistEndToLastRungCut` 依類別取值
pub fn evaluate(expression: &str, constants: &WorkingConstants, category: Category) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(invalid(expression, "empty formula"));
    }

    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
        depth: 0,
        constants,
        category,
    };
    let value = parser.parse_expr(0)?;

    if let Some(extra) = parser.peek() {
        return Err(invalid(expression, format!("unexpected token {:?}", extra)));
    }
    if !value.is_finite() {
        return Err(invalid(expression, "result is not a finite number"));
    }

    Ok(value)
}
