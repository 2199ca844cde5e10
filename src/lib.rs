/*!
本项目把正则表达式编译为极小化DFA，并检查中间产物的一致性。

处理流程：
- 正则表达式 -> 后缀记号序列（调度场算法）
- 后缀记号序列 -> 语法树
- 语法树 -> 带空转移的NFA（Thompson 构造）
- NFA -> DFA（子集构造法）
- DFA的极小化（划分细化）
- 用NFA、DFA、极小DFA分别判断同一个输入串，三者的结果必须相同

另外还可以生成语法树、NFA、DFA的dot文件，以及DFA的状态转移表。

# 用法

```
let automata = wasm_redfa::compile("(a|b)*c").unwrap();
let verdict = automata.check("abc");
assert!(verdict.min_dfa_accept && verdict.consistent);
```

点击每个页面右上角的 `source` 即可观看源码。
*/
mod utils;

/// 正则表达式的语法错误。
pub mod error;

/// 词法扫描和中缀转后缀。
///
/// 支持的语法：字面量、`ε`（空串）、`|`、`*`、`+`、`?`、括号、
/// 显式的连接符 `.`，以及用 `\` 转义上面这些元字符。
/// 相邻的两个操作数之间会自动插入连接运算。
pub mod parser;

/// 语法树。
pub mod ast;

/// NFA 相关的结构体和方法。
///
/// 本模块包含了NFA的结构体和方法，以及从正则表达式构建NFA的方法。
pub mod nfa;

/// DFA 相关的结构体和方法。
///
/// 本模块包含了DFA的结构体和方法，从NFA构建DFA的方法，以及DFA的极小化。
///
/// DFA是稀疏的：每个状态只储存有定义的转移。没有定义的转移相当于进入了
/// 一个不画出来的陷阱状态，读到这样的字符就直接拒绝。
pub mod dfa;

pub use dfa::{CompletedDfa, DFA};
pub use error::SyntaxError;
pub use nfa::NFA;
pub use parser::{Parser, ParserBuilder, Token};

use ast::Ast;
use itertools::Itertools;
use log::debug;
use std::fmt;
use wasm_bindgen::prelude::*;

/// 一个正则表达式的所有中间产物。
#[derive(Debug, Clone)]
pub struct Automata {
    source: String,
    postfix: Vec<Token>,
    ast: Ast,
    nfa: NFA,
    dfa: DFA,
    min_dfa: DFA,
}

/// 用默认配置编译正则表达式。
pub fn compile(re: &str) -> Result<Automata, SyntaxError> {
    compile_with(&Parser::new(), re)
}

/// 用指定的解析器编译正则表达式。
pub fn compile_with(parser: &Parser, re: &str) -> Result<Automata, SyntaxError> {
    let postfix = parser.parse(re)?;
    let ast = Ast::from_postfix(&postfix)?;
    let nfa = nfa::Builder::new().build_nfa_from_ast(&ast);
    let dfa = DFA::build_dfa_from_nfa(&nfa);
    let min_dfa = dfa.minimize();
    debug!("{:?}: {}", re, Automata::count_states(&nfa, &dfa, &min_dfa));

    Ok(Automata {
        source: re.to_string(),
        postfix,
        ast,
        nfa,
        dfa,
        min_dfa,
    })
}

impl Automata {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    pub fn dfa(&self) -> &DFA {
        &self.dfa
    }

    pub fn min_dfa(&self) -> &DFA {
        &self.min_dfa
    }

    /// 分别用NFA、DFA、极小DFA判断输入串。
    pub fn check(&self, input: &str) -> Verdict {
        let nfa_accept = self.nfa.accepts(input);
        let dfa_accept = self.dfa.accepts(input);
        let min_dfa_accept = self.min_dfa.accepts(input);
        Verdict {
            nfa_accept,
            dfa_accept,
            min_dfa_accept,
            consistent: nfa_accept == dfa_accept && dfa_accept == min_dfa_accept,
        }
    }

    /// 按顺序判断每个输入串，结果和输入一一对应。
    pub fn check_all<S: AsRef<str>>(&self, inputs: &[S]) -> Vec<Verdict> {
        inputs.iter().map(|input| self.check(input.as_ref())).collect()
    }

    pub fn reduction(&self) -> Reduction {
        Automata::count_states(&self.nfa, &self.dfa, &self.min_dfa)
    }

    fn count_states(nfa: &NFA, dfa: &DFA, min_dfa: &DFA) -> Reduction {
        Reduction {
            nfa_states: nfa.number_of_states(),
            dfa_states: dfa.number_of_states(),
            min_dfa_states: min_dfa.number_of_states(),
        }
    }
}

/// 三个自动机对同一个输入串的判断结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub nfa_accept: bool,
    pub dfa_accept: bool,
    pub min_dfa_accept: bool,
    /// 三个结果是否相同。
    pub consistent: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = |accept: bool| if accept { "accept" } else { "reject" };
        write!(
            f,
            "NFA: {}, DFA: {}, min-DFA: {}, {}",
            word(self.nfa_accept),
            word(self.dfa_accept),
            word(self.min_dfa_accept),
            if self.consistent {
                "consistent"
            } else {
                "INCONSISTENT"
            }
        )
    }
}

/// 各个自动机的状态数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub nfa_states: usize,
    pub dfa_states: usize,
    pub min_dfa_states: usize,
}

impl Reduction {
    /// 极小化去掉的状态数。
    pub fn removed(&self) -> usize {
        self.dfa_states.saturating_sub(self.min_dfa_states)
    }

    /// 极小化去掉的状态占DFA状态数的百分比。
    pub fn percent(&self) -> f64 {
        if self.dfa_states == 0 {
            return 0.0;
        }
        self.removed() as f64 * 100.0 / self.dfa_states as f64
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NFA {} states, DFA {} states, min-DFA {} states ({:.1}% removed)",
            self.nfa_states,
            self.dfa_states,
            self.min_dfa_states,
            self.percent()
        )
    }
}

/// 一个正则表达式和它在每个输入串上的判断结果。
#[derive(Debug, Clone)]
pub struct Analysis {
    pub automata: Automata,
    pub verdicts: Vec<(String, Verdict)>,
}

impl Analysis {
    pub fn is_consistent(&self) -> bool {
        self.verdicts.iter().all(|(_, verdict)| verdict.consistent)
    }
}

/// 编译一个正则表达式并判断所有输入串。
pub fn analyze<S: AsRef<str>>(re: &str, inputs: &[S]) -> Result<Analysis, SyntaxError> {
    let automata = compile(re)?;
    let verdicts = inputs
        .iter()
        .map(|input| {
            let input: &str = input.as_ref();
            (input.to_string(), automata.check(input))
        })
        .collect();
    Ok(Analysis { automata, verdicts })
}

/// 批量处理。每个正则表达式都用同一组输入串检查，
/// 某个表达式有语法错误不影响其它表达式。
pub fn analyze_batch<R, S>(expressions: &[R], inputs: &[S]) -> Vec<Result<Analysis, SyntaxError>>
where
    R: AsRef<str>,
    S: AsRef<str>,
{
    expressions
        .iter()
        .map(|re| {
            let re: &str = re.as_ref();
            let analysis = analyze(re, inputs);
            if let Err(err) = &analysis {
                debug!("skipping {:?}: {}", re, err);
            }
            analysis
        })
        .collect()
}

/// `get_ans` 输出中各部分之间的分隔符。
const SEPARATOR: char = '@';

/// 输入正则表达式和若干行测试串，返回后缀式、极小DFA的状态转移表、
/// 极小DFA的dot文件和每个测试串的判断结果，用 `@` 分隔。
/// 表达式有语法错误时返回 `error@` 加上错误信息。
///
/// `@` 是分隔符，表达式和测试串里都不能出现。
#[wasm_bindgen]
pub fn get_ans(input: &str, tests: &str) -> String {
    utils::set_panic_hook();
    if let Some(position) = input.chars().position(|c| c == SEPARATOR) {
        return format!(
            "error@the section separator is not allowed at position {} of the expression",
            position
        );
    }
    if let Some(line) = tests.lines().position(|line| line.contains(SEPARATOR)) {
        return format!(
            "error@the section separator is not allowed in test line {}",
            line + 1
        );
    }
    let automata = match compile(input) {
        Ok(automata) => automata,
        Err(err) => return format!("error@{}", err),
    };
    let verdicts = tests
        .lines()
        .map(|line| format!("{}\t{}", line, automata.check(line)))
        .join("\n");
    format!(
        "{}@{}@{}@{}",
        parser::postfix_to_string(automata.postfix()),
        automata.min_dfa().to_fmt_output(),
        automata.min_dfa().to_dot(),
        verdicts
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_agrees_on_star_plus_and_union() {
        let cases: &[(&str, &[&str], &[&str])] = &[
            ("a*", &["", "a", "aaa"], &["b", "ab"]),
            ("a+", &["a", "aa"], &["", "b"]),
            ("(a|b)*c", &["c", "abc", "bac"], &["", "ab", "cc"]),
            ("a?b", &["b", "ab"], &["", "aab"]),
        ];
        for (re, accepted, rejected) in cases {
            let automata = compile(re).unwrap();
            for input in accepted.iter() {
                let verdict = automata.check(input);
                assert!(verdict.min_dfa_accept, "{} should accept {:?}", re, input);
                assert!(verdict.consistent);
            }
            for input in rejected.iter() {
                let verdict = automata.check(input);
                assert!(!verdict.nfa_accept, "{} should reject {:?}", re, input);
                assert!(verdict.consistent);
            }
        }
    }

    #[test]
    fn reduction_counts_states() {
        let automata = compile("(b|b)*abb(a|b)*").unwrap();
        let reduction = automata.reduction();
        assert_eq!(reduction.nfa_states, automata.nfa().number_of_states());
        assert!(reduction.removed() > 0);
        assert!(reduction.percent() > 0.0 && reduction.percent() < 100.0);

        let empty = Reduction {
            nfa_states: 0,
            dfa_states: 0,
            min_dfa_states: 0,
        };
        assert_eq!(empty.percent(), 0.0);
    }

    #[test]
    fn verdict_display() {
        let verdict = compile("ab").unwrap().check("a");
        assert_eq!(
            verdict.to_string(),
            "NFA: reject, DFA: reject, min-DFA: reject, consistent"
        );
    }

    #[test]
    fn get_ans_sections() {
        let ans = get_ans("a|b", "a\nc");
        let sections: Vec<&str> = ans.split('@').collect();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0], "ab|");
        assert_eq!(sections[1], "\ta\tb\n#q0\tq1\tq1\n*q1\tN\tN\n");
        assert!(sections[2].starts_with("digraph DFA {"));
        assert_eq!(
            sections[3],
            "a\tNFA: accept, DFA: accept, min-DFA: accept, consistent\n\
             c\tNFA: reject, DFA: reject, min-DFA: reject, consistent"
        );
    }

    #[test]
    fn get_ans_rejects_separator() {
        let ans = get_ans("a@b", "ab");
        assert_eq!(
            ans,
            "error@the section separator is not allowed at position 1 of the expression"
        );
        assert_eq!(ans.split('@').count(), 2);

        let ans = get_ans("ab", "ab\na@b");
        assert_eq!(
            ans,
            "error@the section separator is not allowed in test line 2"
        );
        assert_eq!(ans.split('@').count(), 2);

        assert_eq!(get_ans("\\@", "").split('@').count(), 2);
        assert_eq!(get_ans("ab", "ab\nb").split('@').count(), 4);
    }

    #[test]
    fn get_ans_reports_syntax_errors() {
        assert_eq!(get_ans("(a|b", ""), "error@unbalanced parenthesis at position 0");
    }
}
