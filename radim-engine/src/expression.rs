//! 数值输入框共用的算术表达式求值器。
//!
//! 支持 `+ - * / ^`、一元正负号、括号、常量 `pi` / `e` 以及常用函数，
//! 三角函数以弧度为单位。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("expression does not evaluate to a finite number")]
    NonFinite,
}

/// 求值整条表达式，结果必须是有限数。
pub fn evaluate(input: &str) -> Result<f64, ExpressionError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Err(ExpressionError::Empty);
    }
    let value = parser.expression()?;
    parser.skip_whitespace();
    if let Some(found) = parser.peek() {
        return Err(ExpressionError::UnexpectedChar {
            found,
            position: parser.pos,
        });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExpressionError::NonFinite)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// 跳过空白后，若下一个字符属于 `candidates` 则消费并返回。
    fn eat_any(&mut self, candidates: &[char]) -> Option<char> {
        self.skip_whitespace();
        let next = self.peek()?;
        if candidates.contains(&next) {
            self.pos += 1;
            Some(next)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ExpressionError> {
        self.skip_whitespace();
        match self.peek() {
            Some(found) if found == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(ExpressionError::UnexpectedChar {
                found,
                position: self.pos,
            }),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_any(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_any(&['*', '/']) {
            let rhs = self.unary()?;
            value = if op == '*' { value * rhs } else { value / rhs };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ExpressionError> {
        match self.eat_any(&['+', '-']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    // 幂运算右结合，`-2^2` 解析为 `-(2^2)`。
    fn power(&mut self) -> Result<f64, ExpressionError> {
        let base = self.primary()?;
        if self.eat_any(&['^']).is_some() {
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, ExpressionError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(')')?;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() => self.identifier(),
            Some(found) => Err(ExpressionError::UnexpectedChar {
                found,
                position: self.pos,
            }),
        }
    }

    fn number(&mut self) -> Result<f64, ExpressionError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if matches!(self.peek(), Some('e' | 'E')) && self.exponent_follows() {
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| ExpressionError::InvalidNumber(literal))
    }

    fn exponent_follows(&self) -> bool {
        match self.chars.get(self.pos + 1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => self
                .chars
                .get(self.pos + 2)
                .is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn identifier(&mut self) -> Result<f64, ExpressionError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_lowercase();

        match name.as_str() {
            "pi" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        let function: fn(f64) -> f64 = match name.as_str() {
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            "asin" => f64::asin,
            "acos" => f64::acos,
            "atan" => f64::atan,
            "ln" => f64::ln,
            "log" => f64::log10,
            "exp" => f64::exp,
            _ => return Err(ExpressionError::UnknownIdentifier(name)),
        };
        self.expect('(')?;
        let argument = self.expression()?;
        self.expect(')')?;
        Ok(function(argument))
    }
}
