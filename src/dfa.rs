use crate::ast::escape_label;
use crate::nfa::{StateSet, NFA};
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// DFA的极小化相关的方法。
pub mod minimize;

pub type StateId = usize;

/// 已经构造完成的DFA，可以读取状态转移函数、字母表、开始状态等信息。
pub trait CompletedDfa {
    fn alphabet(&self) -> &BTreeSet<char>;
    fn start_state(&self) -> StateId;
    fn accept_states(&self) -> &BTreeSet<StateId>;
    fn number_of_states(&self) -> usize;

    /// delta 是状态转移函数δ的读音。这个函数等价于 δ(from, input)。
    /// 也就是说，这个函数会返回从状态from经过输入input到达的状态。
    /// 没有定义这个转移时返回 `None`，相当于进入了陷阱状态。
    fn delta(&self, from: StateId, input: char) -> Option<StateId>;

    fn is_accept_state(&self, state: StateId) -> bool {
        self.accept_states().contains(&state)
    }

    /// 在DFA上模拟。遇到没有定义的转移就立即拒绝，后面的输入不再读取。
    fn accepts(&self, input: &str) -> bool {
        let mut state = self.start_state();
        for c in input.chars() {
            match self.delta(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accept_state(state)
    }

    /// 格式化打印状态转移表。
    /// `#` 标记开始状态，`*` 标记接收状态，`N` 表示没有定义的转移。
    fn to_fmt_output(&self) -> String {
        let mut output = format!("\t{}\n", self.alphabet().iter().join("\t"));
        let start_state = self.start_state();

        for i in 0..self.number_of_states() {
            if self.is_accept_state(i) {
                output.push('*');
            }
            if i == start_state {
                output.push_str(&format!("#q{}\t", i));
            } else {
                output.push_str(&format!("q{}\t", i));
            }

            let row = self
                .alphabet()
                .iter()
                .map(|&input| match self.delta(i, input) {
                    Some(to) => format!("q{}", to),
                    None => "N".to_string(),
                })
                .join("\t");
            output.push_str(&row);
            output.push('\n');
        }
        output
    }

    /// 将这个DFA转换为Graphviz的dot语言，用于绘制状态转移图。
    fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("digraph DFA {\n");
        dot.push_str("rankdir=LR;\n");
        dot.push_str("node [shape = doublecircle];\n");
        for state_id in self.accept_states() {
            dot.push_str(&format!("{};\n", state_id));
        }
        dot.push_str("node [shape = circle];\n");
        dot.push_str("start [shape = point];\n");
        dot.push_str(&format!("start -> {};\n", self.start_state()));
        for from in 0..self.number_of_states() {
            for &input in self.alphabet() {
                if let Some(to) = self.delta(from, input) {
                    dot.push_str(&format!(
                        "{} -> {} [label = \"{}\"];\n",
                        from,
                        to,
                        escape_label(input)
                    ));
                }
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// 稀疏DFA：每个状态自己储存从它出发的转移，没有定义的转移就不存。
///
/// 子集构造法得到的DFA和极小化之后的DFA都用这个结构表示。
#[derive(Debug, Clone)]
pub struct DFA {
    states: Vec<State>,
    alphabet: BTreeSet<char>,
    start_state: StateId,
    accept_states: BTreeSet<StateId>,
}

/// DFA的状态。`signature` 是这个状态代表的NFA状态集合，
/// 只在构造时用于去重，构造完成后仅供展示。
#[derive(Debug, Clone, Default)]
pub struct State {
    signature: StateSet,
    transitions: BTreeMap<char, StateId>,
}

impl State {
    pub fn signature(&self) -> &StateSet {
        &self.signature
    }

    pub fn transitions(&self) -> &BTreeMap<char, StateId> {
        &self.transitions
    }
}

impl DFA {
    pub(crate) fn init_empty(alphabet: BTreeSet<char>) -> Self {
        DFA {
            states: Vec::new(),
            alphabet,
            start_state: 0,
            accept_states: BTreeSet::new(),
        }
    }

    pub(crate) fn add_state(&mut self, signature: StateSet) -> StateId {
        let id = self.states.len();
        self.states.push(State {
            signature,
            transitions: BTreeMap::new(),
        });
        id
    }

    /// DFA的转移是确定的，同一个状态同一个输入再次添加会覆盖原来的目标。
    pub(crate) fn add_transition(&mut self, from: StateId, input: char, to: StateId) {
        self.alphabet.insert(input);
        self.states[from].transitions.insert(input, to);
    }

    pub(crate) fn set_start_state(&mut self, id: StateId) {
        self.start_state = id;
    }

    pub(crate) fn set_accept_state(&mut self, id: StateId) {
        self.accept_states.insert(id);
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn signature(&self, id: StateId) -> &StateSet {
        &self.states[id].signature
    }

    pub fn number_of_transitions(&self) -> usize {
        self.states.iter().map(|state| state.transitions.len()).sum()
    }

    /// 所有转移，按出发状态和输入字符排序。
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, char, StateId)> + '_ {
        self.states.iter().enumerate().flat_map(|(from, state)| {
            state
                .transitions
                .iter()
                .map(move |(&input, &to)| (from, input, to))
        })
    }
}

impl DFA {
    /// 从NFA构造DFA，用子集构造法（幂集构造法）。
    ///
    /// 开始状态是NFA开始状态的空闭包。用一个队列保存还没有处理的NFA状态集合，
    /// 对每个集合和字母表里的每个字符，求 move 之后的空闭包，
    /// 如果得到的是一个新集合，就给它分配一个新的DFA状态id并放进队列。
    /// move 的结果为空时不添加转移。
    pub fn build_dfa_from_nfa(nfa: &NFA) -> Self {
        let mut dfa = DFA::init_empty(nfa.alphabet().clone());
        let mut ids: HashMap<StateSet, StateId> = HashMap::new();
        let mut worklist: VecDeque<(StateId, StateSet)> = VecDeque::new();

        let start = nfa.epsilon_closure(std::iter::once(nfa.start_state()));
        let start_id = dfa.add_state(start.clone());
        if nfa.contains_accept_state(&start) {
            dfa.set_accept_state(start_id);
        }
        dfa.set_start_state(start_id);
        ids.insert(start.clone(), start_id);
        worklist.push_back((start_id, start));

        while let Some((from, subset)) = worklist.pop_front() {
            for &input in nfa.alphabet() {
                let moved = nfa.move_on(&subset, input);
                if moved.is_empty() {
                    continue;
                }
                let target = nfa.epsilon_closure(moved);

                let to = match ids.get(&target) {
                    Some(&id) => id,
                    None => {
                        let id = dfa.add_state(target.clone());
                        if nfa.contains_accept_state(&target) {
                            dfa.set_accept_state(id);
                        }
                        trace!("dfa state {} = {{{}}}", id, target.iter().join(", "));
                        ids.insert(target.clone(), id);
                        worklist.push_back((id, target));
                        id
                    }
                };
                dfa.add_transition(from, input, to);
            }
        }

        debug!(
            "dfa: {} states, {} accepting, {} transitions",
            dfa.number_of_states(),
            dfa.accept_states.len(),
            dfa.number_of_transitions()
        );
        dfa
    }
}

impl CompletedDfa for DFA {
    fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    fn start_state(&self) -> StateId {
        self.start_state
    }

    fn accept_states(&self) -> &BTreeSet<StateId> {
        &self.accept_states
    }

    fn number_of_states(&self) -> usize {
        self.states.len()
    }

    fn delta(&self, from: StateId, input: char) -> Option<StateId> {
        self.states
            .get(from)
            .and_then(|state| state.transitions.get(&input))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::Builder;

    fn dfa(re: &str) -> DFA {
        DFA::build_dfa_from_nfa(&Builder::new().build_nfa_from_re(re).unwrap())
    }

    #[test]
    fn start_state_is_closure_of_nfa_start() {
        let nfa = Builder::new().build_nfa_from_re("a|b").unwrap();
        let dfa = DFA::build_dfa_from_nfa(&nfa);
        assert_eq!(dfa.start_state(), 0);
        // a: 0 -> 1, b: 2 -> 3, 新的开始和接收状态是 4 和 5。
        assert_eq!(
            dfa.signature(0),
            &vec![0, 2, 4].into_iter().collect::<StateSet>()
        );
        assert_eq!(dfa.number_of_states(), 3);
        assert_eq!(dfa.accept_states().len(), 2);
    }

    #[test]
    fn accepting_iff_signature_contains_nfa_accept_state() {
        let nfa = Builder::new().build_nfa_from_re("(a|b)*c").unwrap();
        let dfa = DFA::build_dfa_from_nfa(&nfa);
        for id in 0..dfa.number_of_states() {
            assert_eq!(
                dfa.is_accept_state(id),
                nfa.contains_accept_state(dfa.signature(id))
            );
        }
    }

    #[test]
    fn signatures_are_unique() {
        let dfa = dfa("(b|b)*abb(a|b)*");
        let signatures: BTreeSet<&StateSet> = (0..dfa.number_of_states())
            .map(|id| dfa.signature(id))
            .collect();
        assert_eq!(signatures.len(), dfa.number_of_states());
    }

    #[test]
    fn state_accessor_matches_delta() {
        let dfa = dfa("ab");
        let start = dfa.state(dfa.start_state());
        assert_eq!(start.transitions().len(), 1);
        assert_eq!(
            start.transitions().get(&'a').copied(),
            dfa.delta(dfa.start_state(), 'a')
        );
        assert_eq!(start.signature(), dfa.signature(dfa.start_state()));
        for (from, input, to) in dfa.transitions() {
            assert_eq!(dfa.state(from).transitions().get(&input), Some(&to));
        }
    }

    #[test]
    fn missing_transition_rejects() {
        let dfa = dfa("ab");
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("ba"));
        assert!(!dfa.accepts("abc"));
        assert_eq!(dfa.delta(dfa.start_state(), 'b'), None);
    }

    #[test]
    fn simulation_examples() {
        let dfa = dfa("(a|b)*c");
        for accepted in &["c", "abc", "aabbc"] {
            assert!(dfa.accepts(accepted), "{}", accepted);
        }
        for rejected in &["", "ab", "ca"] {
            assert!(!dfa.accepts(rejected), "{}", rejected);
        }
    }

    #[test]
    fn fmt_output_marks_start_and_accept_states() {
        let dfa = dfa("a|b");
        assert_eq!(
            dfa.to_fmt_output(),
            "\ta\tb\n#q0\tq1\tq2\n*q1\tN\tN\n*q2\tN\tN\n"
        );
    }

    #[test]
    fn dot_has_one_edge_per_transition() {
        let dfa = dfa("(a|b)*c");
        let dot = dfa.to_dot();
        assert!(dot.starts_with("digraph DFA {"));
        assert_eq!(dot.matches("[label =").count(), dfa.number_of_transitions());
        assert_eq!(dfa.transitions().count(), dfa.number_of_transitions());
    }
}
