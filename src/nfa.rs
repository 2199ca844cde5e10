use itertools::Itertools;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{escape_label, Ast};
use crate::error::SyntaxError;
use crate::parser::Parser;

// 状态直接用它在状态表 Vec 中的下标作为id。
pub type StateId = usize;

/// NFA状态的集合。用有序集合，这样同一个集合总是得到同一个迭代顺序，
/// 可以直接当作 HashMap 的 key，也方便打印。
pub type StateSet = BTreeSet<StateId>;

#[derive(Debug, Clone)]
pub struct NFA {
    states: Vec<State>,
    alphabet: BTreeSet<char>,
    start_state: StateId,
    accept_states: StateSet,
}

/// NFA内的状态的增删改查
impl NFA {
    pub(crate) fn init_empty() -> NFA {
        NFA {
            states: Vec::new(),
            alphabet: BTreeSet::new(),
            start_state: 0,
            accept_states: StateSet::new(),
        }
    }

    /// 添加一个没有任何转移的新状态，返回它的id。
    pub(crate) fn add_state(&mut self) -> StateId {
        let id = self.states.len();
        self.states.push(State::default());
        id
    }

    pub(crate) fn add_transition(&mut self, from: StateId, input: char, to: StateId) {
        self.states[from]
            .transitions
            .entry(input)
            .or_default()
            .insert(to);
        self.alphabet.insert(input);
    }

    pub(crate) fn add_epsilon_transition(&mut self, from: StateId, to: StateId) {
        self.states[from].epsilon_transitions.insert(to);
    }

    pub(crate) fn set_start_state(&mut self, state: StateId) {
        self.start_state = state;
    }

    pub(crate) fn set_accept_state(&mut self, state: StateId) {
        self.accept_states.insert(state);
    }

    pub fn number_of_states(&self) -> usize {
        self.states.len()
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    pub fn accept_states(&self) -> &StateSet {
        &self.accept_states
    }

    /// 所有非空转移用到的输入字符，按顺序排列。
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    /// 所有转移，按出发状态排序。空转移的输入是 `None`。
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Option<char>, StateId)> + '_ {
        self.states.iter().enumerate().flat_map(|(from, state)| {
            let epsilon = state
                .epsilon_transitions
                .iter()
                .map(move |&to| (from, None::<char>, to));
            let non_epsilon = state
                .transitions
                .iter()
                .flat_map(move |(&input, targets)| {
                    targets.iter().map(move |&to| (from, Some(input), to))
                });
            epsilon.chain(non_epsilon)
        })
    }
}

/// 状态和转移的计算相关方法
impl NFA {
    /// 求一个状态集合的空闭包，即只经过空转移能到达的所有状态（包括自身）。
    pub fn epsilon_closure<I>(&self, states: I) -> StateSet
    where
        I: IntoIterator<Item = StateId>,
    {
        let mut stack: Vec<StateId> = states.into_iter().collect();
        let mut closure = StateSet::new();
        while let Some(state) = stack.pop() {
            if !closure.insert(state) {
                continue;
            }
            for &to in self.states[state].epsilon_transitions.iter() {
                if !closure.contains(&to) {
                    stack.push(to);
                }
            }
        }
        closure
    }

    /// 从集合中任意状态出发，读入 `input` 能到达的状态集合。不求闭包。
    pub fn move_on(&self, states: &StateSet, input: char) -> StateSet {
        states
            .iter()
            .filter_map(|&state| self.states[state].transitions.get(&input))
            .flatten()
            .copied()
            .collect()
    }

    /// 状态集合中是否含有接收状态。
    pub fn contains_accept_state(&self, states: &StateSet) -> bool {
        !states.is_disjoint(&self.accept_states)
    }

    /// 直接在NFA上模拟，判断是否接受 `input`。
    ///
    /// 当前状态集合一旦为空就不可能再接受，提前返回。
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure(std::iter::once(self.start_state));
        for c in input.chars() {
            let next = self.move_on(&current, c);
            if next.is_empty() {
                return false;
            }
            current = self.epsilon_closure(next);
        }
        self.contains_accept_state(&current)
    }
}

/// 格式化相关方法
impl NFA {
    // 生成dot文件，可以由graphviz生成状态机图
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("digraph NFA {\n");
        dot.push_str("rankdir=LR;\n");
        dot.push_str("node [shape = doublecircle];\n");
        for state in &self.accept_states {
            dot.push_str(&format!("{};\n", state));
        }
        dot.push_str("node [shape = circle];\n");
        dot.push_str("start [shape = point];\n");
        dot.push_str(&format!("start -> {};\n", self.start_state));
        for (from, input, to) in self.transitions() {
            let label = match input {
                Some(c) => escape_label(c),
                None => "ε".to_string(),
            };
            dot.push_str(&format!("{} -> {} [label=\"{}\"];\n", from, to, label));
        }
        dot.push_str("}\n");
        dot
    }
}

/// NFA的状态。
///
/// 一个状态可以同时有空转移和非空转移（连接运算会在子NFA的接收状态上加空转移），
/// 所以两种转移分开储存。同一个输入字符可以转移到多个状态。
#[derive(Debug, Clone, Default)]
pub struct State {
    transitions: BTreeMap<char, StateSet>,
    epsilon_transitions: StateSet,
}

impl State {
    pub fn transitions(&self) -> &BTreeMap<char, StateSet> {
        &self.transitions
    }

    pub fn epsilon_transitions(&self) -> &StateSet {
        &self.epsilon_transitions
    }
}

/// NFA的构造器，用 thompson 构造法从语法树构造NFA。
///
/// 自底向上：先构造子NFA，记录每一个子NFA的开始和接收状态，然后把子NFA合并成一个大NFA。
/// 状态id单调递增地分配，构造过程中不会复用。
pub struct Builder {
    nfa: NFA,
}

/// 构造过程中的子NFA，只需要记住它的入口和出口。
#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            nfa: NFA::init_empty(),
        }
    }

    /// 用默认的解析配置从正则表达式构造NFA。
    pub fn build_nfa_from_re(self, re: &str) -> Result<NFA, SyntaxError> {
        self.build_nfa_from_re_with(&Parser::new(), re)
    }

    pub fn build_nfa_from_re_with(self, parser: &Parser, re: &str) -> Result<NFA, SyntaxError> {
        let postfix = parser.parse(re)?;
        let ast = Ast::from_postfix(&postfix)?;
        Ok(self.build_nfa_from_ast(&ast))
    }

    /// 本方法会消费掉这个builder自己，然后返回构造完毕的NFA。
    pub fn build_nfa_from_ast(mut self, ast: &Ast) -> NFA {
        let Fragment { start, accept } = self.compile(ast);
        self.nfa.set_start_state(start);
        self.nfa.set_accept_state(accept);
        debug!(
            "nfa: {} states, start {}, accept {}, alphabet [{}]",
            self.nfa.number_of_states(),
            start,
            accept,
            self.nfa.alphabet().iter().join(", ")
        );
        self.nfa
    }

    fn new_fragment(&mut self) -> Fragment {
        let start = self.nfa.add_state();
        let accept = self.nfa.add_state();
        Fragment { start, accept }
    }

    fn compile(&mut self, node: &Ast) -> Fragment {
        match node {
            Ast::Literal(c) => {
                let f = self.new_fragment();
                self.nfa.add_transition(f.start, *c, f.accept);
                f
            }
            Ast::Epsilon => {
                let f = self.new_fragment();
                self.nfa.add_epsilon_transition(f.start, f.accept);
                f
            }
            Ast::Concat(left, right) => {
                let a = self.compile(left);
                let b = self.compile(right);
                self.nfa.add_epsilon_transition(a.accept, b.start);
                Fragment {
                    start: a.start,
                    accept: b.accept,
                }
            }
            Ast::Union(left, right) => {
                let a = self.compile(left);
                let b = self.compile(right);
                let f = self.new_fragment();
                self.nfa.add_epsilon_transition(f.start, a.start);
                self.nfa.add_epsilon_transition(f.start, b.start);
                self.nfa.add_epsilon_transition(a.accept, f.accept);
                self.nfa.add_epsilon_transition(b.accept, f.accept);
                f
            }
            Ast::Star(child) => self.closure(child, true, true),
            Ast::Plus(child) => self.closure(child, false, true),
            Ast::Optional(child) => self.closure(child, true, false),
        }
    }

    /// 克林闭包、正闭包和可选的接线方式只差两条边：
    /// `skip` 是从新开始状态直接到新接收状态的空转移（允许0次），
    /// `repeat` 是从子NFA的接收状态回到它开始状态的空转移（允许多次）。
    fn closure(&mut self, child: &Ast, skip: bool, repeat: bool) -> Fragment {
        let inner = self.compile(child);
        let f = self.new_fragment();
        self.nfa.add_epsilon_transition(f.start, inner.start);
        if skip {
            self.nfa.add_epsilon_transition(f.start, f.accept);
        }
        if repeat {
            self.nfa.add_epsilon_transition(inner.accept, inner.start);
        }
        self.nfa.add_epsilon_transition(inner.accept, f.accept);
        f
    }
}
