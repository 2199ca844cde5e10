use crate::error::SyntaxError;
use crate::parser::Token;
use log::trace;
use std::fmt;

/// 正则表达式的语法树。
///
/// 每个非叶子节点独占它的子节点，整棵树只有一个根。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Literal(char),
    Epsilon,
    Concat(Box<Ast>, Box<Ast>),
    Union(Box<Ast>, Box<Ast>),
    Star(Box<Ast>),
    Plus(Box<Ast>),
    Optional(Box<Ast>),
}

impl Ast {
    /// 由后缀记号序列建立语法树。
    ///
    /// 用一个显式的栈：字面量压入叶子节点，二元运算弹出两个节点
    /// （先弹出的是右操作数），一元运算弹出一个节点。
    /// 处理完所有记号后栈里必须恰好剩下一个节点，它就是根。
    ///
    /// 这一步返回的 `MissingOperand` 里的 `position` 是后缀记号序列的下标，
    /// 不是原始输入中的字符下标。
    pub fn from_postfix(postfix: &[Token]) -> Result<Ast, SyntaxError> {
        let mut stack: Vec<Ast> = Vec::new();

        for (position, token) in postfix.iter().enumerate() {
            let missing = || SyntaxError::MissingOperand {
                operator: token.symbol(),
                position,
            };

            let node = match *token {
                Token::Literal(c) => Ast::Literal(c),
                Token::Epsilon => Ast::Epsilon,
                Token::Concat | Token::Union => {
                    let right = stack.pop().ok_or_else(missing)?;
                    let left = stack.pop().ok_or_else(missing)?;
                    if *token == Token::Concat {
                        Ast::Concat(Box::new(left), Box::new(right))
                    } else {
                        Ast::Union(Box::new(left), Box::new(right))
                    }
                }
                Token::Star => Ast::Star(Box::new(stack.pop().ok_or_else(missing)?)),
                Token::Plus => Ast::Plus(Box::new(stack.pop().ok_or_else(missing)?)),
                Token::Optional => Ast::Optional(Box::new(stack.pop().ok_or_else(missing)?)),
                // 合法的后缀式里不会出现括号。
                Token::LeftParen | Token::RightParen => {
                    return Err(SyntaxError::MalformedPostfix {
                        remaining: stack.len(),
                    })
                }
            };
            stack.push(node);
        }

        let root = match stack.len() {
            0 => return Err(SyntaxError::Empty),
            1 => stack.pop().ok_or(SyntaxError::Empty)?,
            remaining => return Err(SyntaxError::MalformedPostfix { remaining }),
        };
        trace!("ast: {}", root);
        Ok(root)
    }

    /// 树中节点的个数。
    pub fn size(&self) -> usize {
        match self {
            Ast::Literal(_) | Ast::Epsilon => 1,
            Ast::Concat(l, r) | Ast::Union(l, r) => 1 + l.size() + r.size(),
            Ast::Star(c) | Ast::Plus(c) | Ast::Optional(c) => 1 + c.size(),
        }
    }

    /// 生成dot文件，可以由graphviz画出语法树。
    /// 节点按先序遍历编号，左右子树的边分别标注 L 和 R。
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("digraph AST {\n");
        dot.push_str("node [style = filled];\n");
        let mut next_id = 0;
        self.write_dot_node(&mut dot, &mut next_id);
        dot.push_str("}\n");
        dot
    }

    fn write_dot_node(&self, dot: &mut String, next_id: &mut usize) -> usize {
        let id = *next_id;
        *next_id += 1;

        let (label, shape, color) = match self {
            Ast::Literal(c) => (escape_label(*c), "circle", "lightyellow"),
            Ast::Epsilon => ("ε".to_string(), "circle", "lightyellow"),
            Ast::Concat(..) => ("·".to_string(), "diamond", "lightblue"),
            Ast::Union(..) => ("|".to_string(), "diamond", "lightblue"),
            Ast::Star(_) => ("*".to_string(), "square", "lightgreen"),
            Ast::Plus(_) => ("+".to_string(), "square", "lightgreen"),
            Ast::Optional(_) => ("?".to_string(), "square", "lightgreen"),
        };
        dot.push_str(&format!(
            "{} [label = \"{}\", shape = {}, fillcolor = {}];\n",
            id, label, shape, color
        ));

        match self {
            Ast::Concat(l, r) | Ast::Union(l, r) => {
                let left = l.write_dot_node(dot, next_id);
                dot.push_str(&format!("{} -> {} [label = \"L\"];\n", id, left));
                let right = r.write_dot_node(dot, next_id);
                dot.push_str(&format!("{} -> {} [label = \"R\"];\n", id, right));
            }
            Ast::Star(c) | Ast::Plus(c) | Ast::Optional(c) => {
                let child = c.write_dot_node(dot, next_id);
                dot.push_str(&format!("{} -> {};\n", id, child));
            }
            Ast::Literal(_) | Ast::Epsilon => {}
        }
        id
    }
}

pub(crate) fn escape_label(c: char) -> String {
    match c {
        '"' => "\\\"".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\\\n".to_string(),
        '\t' => "\\\\t".to_string(),
        '\r' => "\\\\r".to_string(),
        c => c.to_string(),
    }
}

/// 输出带完整括号的中缀形式，例如 `((a|b)*·c)`。
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Literal(c) => write!(f, "{}", Token::Literal(*c)),
            Ast::Epsilon => write!(f, "ε"),
            Ast::Concat(l, r) => write!(f, "({}·{})", l, r),
            Ast::Union(l, r) => write!(f, "({}|{})", l, r),
            Ast::Star(c) => write!(f, "{}*", c),
            Ast::Plus(c) => write!(f, "{}+", c),
            Ast::Optional(c) => write!(f, "{}?", c),
        }
    }
}
