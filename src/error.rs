use std::fmt;

/// 正则表达式的语法错误。
///
/// 词法扫描、中缀转后缀、由后缀式建立语法树这几步都可能产生这个错误。
/// 词法扫描和中缀转后缀产生的错误里，`position` 是出错字符在输入中的下标
/// （按字符计数，不是字节）。由后缀式建立语法树时产生的错误里，
/// `position` 是后缀记号序列的下标。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// 有右括号没有对应的左括号，或者左括号到结尾都没有闭合。
    UnbalancedParen { position: usize },
    /// 运算符缺少操作数，例如 `|a`、`(*a)`、`a|`。
    MissingOperand { operator: char, position: usize },
    /// 空括号 `()`。
    EmptyGroup { position: usize },
    /// 表达式以单独的转义符 `\` 结尾。
    DanglingEscape { position: usize },
    /// 后缀式处理完毕后栈里剩下的不是恰好一个节点。
    MalformedPostfix { remaining: usize },
    /// 空表达式。想表示空串请写 `ε`。
    Empty,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::UnbalancedParen { position } => {
                write!(f, "unbalanced parenthesis at position {}", position)
            }
            SyntaxError::MissingOperand { operator, position } => write!(
                f,
                "operator '{}' at position {} is missing an operand",
                operator, position
            ),
            SyntaxError::EmptyGroup { position } => {
                write!(f, "empty group '()' at position {}", position)
            }
            SyntaxError::DanglingEscape { position } => {
                write!(f, "dangling escape '\\' at position {}", position)
            }
            SyntaxError::MalformedPostfix { remaining } => write!(
                f,
                "malformed expression: {} nodes left on the stack, expected 1",
                remaining
            ),
            SyntaxError::Empty => write!(f, "empty expression"),
        }
    }
}

impl std::error::Error for SyntaxError {}
