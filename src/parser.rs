use crate::error::SyntaxError;
use itertools::Itertools;
use log::{debug, trace};
use std::fmt;

/// 正则表达式的单个记号。
///
/// 连接运算在输入里通常是省略的（`ab` 就是 a 连接 b），
/// 扫描时会补上显式的 `Concat`，输出时写作 `.`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(char),
    Epsilon,
    Union,
    Star,
    Plus,
    Optional,
    Concat,
    LeftParen,
    RightParen,
}

impl Token {
    pub fn symbol(self) -> char {
        match self {
            Token::Literal(c) => c,
            Token::Epsilon => 'ε',
            Token::Union => '|',
            Token::Star => '*',
            Token::Plus => '+',
            Token::Optional => '?',
            Token::Concat => '.',
            Token::LeftParen => '(',
            Token::RightParen => ')',
        }
    }

    /// 优先级：闭包类的后缀运算 > 连接 > 或。括号不参与比较。
    fn precedence(self) -> u8 {
        match self {
            Token::Star | Token::Plus | Token::Optional => 3,
            Token::Concat => 2,
            Token::Union => 1,
            _ => 0,
        }
    }

    /// 这个记号能否作为一个操作数的结尾，即它的右边可以接连接运算。
    fn ends_operand(self) -> bool {
        matches!(
            self,
            Token::Literal(_)
                | Token::Epsilon
                | Token::RightParen
                | Token::Star
                | Token::Plus
                | Token::Optional
        )
    }

    /// 这个记号能否作为一个操作数的开头。
    fn starts_operand(self) -> bool {
        matches!(self, Token::Literal(_) | Token::Epsilon | Token::LeftParen)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal('\n') => write!(f, "\\n"),
            Token::Literal('\t') => write!(f, "\\t"),
            Token::Literal('\r') => write!(f, "\\r"),
            Token::Literal(c) if is_meta(*c) => write!(f, "\\{}", c),
            token => write!(f, "{}", token.symbol()),
        }
    }
}

fn is_meta(c: char) -> bool {
    matches!(c, '|' | '*' | '+' | '?' | '.' | '(' | ')' | '\\' | 'ε')
}

/// 把后缀记号序列拼成字符串，例如 `a|b` 的后缀式是 `ab|`。
pub fn postfix_to_string(tokens: &[Token]) -> String {
    tokens.iter().join("")
}

/// 用默认配置把正则表达式转换为后缀记号序列。
pub fn to_postfix(re: &str) -> Result<Vec<Token>, SyntaxError> {
    Parser::new().parse(re)
}

/// 解析器的配置。
/// 先设置选项，再 `build()` 出一个 `Parser`。
#[derive(Debug, Clone)]
pub struct ParserBuilder {
    ignore_whitespace: bool,
    normalize_math_symbols: bool,
    epsilon: char,
}

impl ParserBuilder {
    pub fn new() -> ParserBuilder {
        ParserBuilder {
            ignore_whitespace: true,
            normalize_math_symbols: true,
            epsilon: 'ε',
        }
    }

    /// 是否跳过表达式中的空白字符。默认跳过。
    /// 需要匹配空格时可以写 `\ `。
    pub fn ignore_whitespace(&mut self, yes: bool) -> &mut ParserBuilder {
        self.ignore_whitespace = yes;
        self
    }

    /// 是否把数学斜体字母（𝑎、𝑏……）、`𝜀`、`∗` 替换成普通字符。
    /// 从教材或者 PDF 里复制出来的表达式经常带这些字符。默认替换。
    pub fn normalize_math_symbols(&mut self, yes: bool) -> &mut ParserBuilder {
        self.normalize_math_symbols = yes;
        self
    }

    /// 表示空串的字符，默认是 `ε`。
    /// 可以是元字符，这时它不再有原来的含义；`\` 除外，它总是转义符。
    pub fn epsilon(&mut self, c: char) -> &mut ParserBuilder {
        self.epsilon = c;
        self
    }

    pub fn build(&self) -> Parser {
        Parser {
            ignore_whitespace: self.ignore_whitespace,
            normalize_math_symbols: self.normalize_math_symbols,
            epsilon: self.epsilon,
        }
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    ignore_whitespace: bool,
    normalize_math_symbols: bool,
    epsilon: char,
}

impl Parser {
    pub fn new() -> Parser {
        ParserBuilder::new().build()
    }

    /// 扫描表达式、补上显式连接，再用调度场算法转换为后缀序列。
    pub fn parse(&self, re: &str) -> Result<Vec<Token>, SyntaxError> {
        let infix = self.tokenize(re)?;
        trace!(
            "infix tokens of {:?}: {}",
            re,
            infix.iter().map(|(_, token)| token).join("")
        );
        let postfix = shunting_yard(&infix)?;
        debug!("postfix of {:?}: {}", re, postfix_to_string(&postfix));
        Ok(postfix)
    }

    /// 词法扫描。返回的每个记号都带着它在输入中的位置（字符下标），
    /// 补上的连接运算的位置是它右边那个记号的位置。
    fn tokenize(&self, re: &str) -> Result<Vec<(usize, Token)>, SyntaxError> {
        let mut tokens: Vec<(usize, Token)> = Vec::new();
        let mut chars = re.chars().enumerate();

        while let Some((position, c)) = chars.next() {
            let c = if self.normalize_math_symbols {
                normalize_math_symbol(c)
            } else {
                c
            };
            if self.ignore_whitespace && c.is_whitespace() {
                continue;
            }

            let token = match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => Token::Literal(unescape(escaped)),
                    None => return Err(SyntaxError::DanglingEscape { position }),
                },
                c if c == self.epsilon => Token::Epsilon,
                '|' => Token::Union,
                '*' => Token::Star,
                '+' => Token::Plus,
                '?' => Token::Optional,
                '.' => Token::Concat,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                c => Token::Literal(c),
            };

            if let Some(&(_, prev)) = tokens.last() {
                if prev.ends_operand() && token.starts_operand() {
                    tokens.push((position, Token::Concat));
                }
            }
            tokens.push((position, token));
        }

        Ok(tokens)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// 调度场算法。后缀运算符的优先级最高，并且总是紧跟在它的操作数后面，
/// 所以直接输出，不进运算符栈。
fn shunting_yard(infix: &[(usize, Token)]) -> Result<Vec<Token>, SyntaxError> {
    let mut output = Vec::with_capacity(infix.len());
    let mut stack: Vec<(usize, Token)> = Vec::new();

    for (i, &(position, token)) in infix.iter().enumerate() {
        let prev = if i > 0 { Some(infix[i - 1].1) } else { None };
        let next = infix.get(i + 1).map(|&(_, t)| t);

        match token {
            Token::Literal(_) | Token::Epsilon => output.push(token),
            Token::Star | Token::Plus | Token::Optional => {
                require_left_operand(prev, token, position)?;
                output.push(token);
            }
            Token::Union | Token::Concat => {
                require_left_operand(prev, token, position)?;
                if !next.map_or(false, Token::starts_operand) {
                    return Err(SyntaxError::MissingOperand {
                        operator: token.symbol(),
                        position,
                    });
                }
                while let Some(&(_, top)) = stack.last() {
                    if top == Token::LeftParen || top.precedence() < token.precedence() {
                        break;
                    }
                    output.push(top);
                    stack.pop();
                }
                stack.push((position, token));
            }
            Token::LeftParen => {
                if next == Some(Token::RightParen) {
                    return Err(SyntaxError::EmptyGroup { position });
                }
                stack.push((position, token));
            }
            Token::RightParen => loop {
                match stack.pop() {
                    Some((_, Token::LeftParen)) => break,
                    Some((_, op)) => output.push(op),
                    None => return Err(SyntaxError::UnbalancedParen { position }),
                }
            },
        }
    }

    while let Some((position, top)) = stack.pop() {
        if top == Token::LeftParen {
            return Err(SyntaxError::UnbalancedParen { position });
        }
        output.push(top);
    }

    Ok(output)
}

fn require_left_operand(
    prev: Option<Token>,
    operator: Token,
    position: usize,
) -> Result<(), SyntaxError> {
    if prev.map_or(false, Token::ends_operand) {
        Ok(())
    } else {
        Err(SyntaxError::MissingOperand {
            operator: operator.symbol(),
            position,
        })
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        c => c,
    }
}

fn normalize_math_symbol(c: char) -> char {
    match c {
        '∗' => '*',
        '𝜀' => 'ε',
        'ℎ' => 'h',
        '\u{1D44E}'..='\u{1D467}' => shift_to(c, 0x1D44E, 'a'),
        '\u{1D434}'..='\u{1D44D}' => shift_to(c, 0x1D434, 'A'),
        c => c,
    }
}

fn shift_to(c: char, base: u32, first: char) -> char {
    std::char::from_u32(first as u32 + (c as u32 - base)).unwrap_or(c)
}
