use super::{CompletedDfa, StateId, DFA};
use crate::nfa::StateSet;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::Hash;

pub type BlockId = usize;

/// 从开始状态出发能到达的所有状态，按广度优先的发现顺序排列，开始状态排在第一个。
pub fn reachable_states(dfa: &impl CompletedDfa) -> Vec<StateId> {
    let mut order = vec![dfa.start_state()];
    let mut seen: BTreeSet<StateId> = order.iter().copied().collect();
    let mut queue: VecDeque<StateId> = order.iter().copied().collect();

    while let Some(state) = queue.pop_front() {
        for &input in dfa.alphabet() {
            if let Some(to) = dfa.delta(state, input) {
                if seen.insert(to) {
                    order.push(to);
                    queue.push_back(to);
                }
            }
        }
    }
    order
}

/// 可达状态的一个划分。每个状态属于恰好一个块。
///
/// 块的编号按状态在广度优先顺序中第一次出现的先后分配，
/// 所以开始状态所在的块总是 0 号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    block_of: BTreeMap<StateId, BlockId>,
    number_of_blocks: usize,
}

impl Partition {
    /// 按 `key` 给状态分组，`key` 相同的状态放在同一个块里。
    fn group_by<K, F>(states: &[StateId], key: F) -> Self
    where
        K: Eq + Hash,
        F: Fn(StateId) -> K,
    {
        let mut numbering: HashMap<K, BlockId> = HashMap::new();
        let mut block_of = BTreeMap::new();
        for &state in states {
            let next = numbering.len();
            let block = *numbering.entry(key(state)).or_insert(next);
            block_of.insert(state, block);
        }
        Partition {
            block_of,
            number_of_blocks: numbering.len(),
        }
    }

    /// 初始划分：接收状态一组，非接收状态一组。其中一组为空时只有一个块。
    fn initial(dfa: &impl CompletedDfa, states: &[StateId]) -> Self {
        Self::group_by(states, |state| dfa.is_accept_state(state))
    }

    /// 细化一次。两个状态留在同一块里，当且仅当它们原来在同一块，
    /// 并且对每个输入字符都转移到同一个块（或者都没有转移）。
    fn refine(&self, dfa: &impl CompletedDfa, states: &[StateId]) -> Self {
        Self::group_by(states, |state| {
            let row: Vec<Option<BlockId>> = dfa
                .alphabet()
                .iter()
                .map(|&input| dfa.delta(state, input).and_then(|to| self.block_of(to)))
                .collect();
            (self.block_of(state), row)
        })
    }

    pub fn block_of(&self, state: StateId) -> Option<BlockId> {
        self.block_of.get(&state).copied()
    }

    pub fn number_of_blocks(&self) -> usize {
        self.number_of_blocks
    }

    /// 每个块里的状态，下标就是块的编号。
    pub fn blocks(&self) -> Vec<Vec<StateId>> {
        let mut blocks = vec![Vec::new(); self.number_of_blocks];
        for (&state, &block) in &self.block_of {
            blocks[block].push(state);
        }
        blocks
    }
}

/// 计算等价状态的划分（Moore 算法）。
///
/// 不可达状态不参与划分。从 {接收, 非接收} 开始反复细化，
/// 直到一轮细化之后块的个数不再变化。
pub fn compute_partition(dfa: &impl CompletedDfa) -> Partition {
    let states = reachable_states(dfa);
    if states.len() < dfa.number_of_states() {
        debug!(
            "pruned {} unreachable states",
            dfa.number_of_states() - states.len()
        );
    }

    let mut partition = Partition::initial(dfa, &states);
    let mut round = 0;
    loop {
        round += 1;
        let refined = partition.refine(dfa, &states);
        trace!(
            "refinement round {}: {} -> {} blocks",
            round,
            partition.number_of_blocks(),
            refined.number_of_blocks()
        );
        if refined.number_of_blocks() == partition.number_of_blocks() {
            return refined;
        }
        partition = refined;
    }
}

impl DFA {
    /// 极小化。每个块变成一个新状态，转移取自块里任意一个成员（它们都一样），
    /// 新状态的签名是块内所有成员签名的并集。
    ///
    /// 对一个已经极小的DFA再做一次极小化，状态数不变。
    pub fn minimize(&self) -> DFA {
        let partition = compute_partition(self);
        let blocks = partition.blocks();
        let mut minimized = DFA::init_empty(self.alphabet.clone());

        for members in &blocks {
            let signature: StateSet = members
                .iter()
                .flat_map(|&state| self.signature(state).iter().copied())
                .collect();
            let id = minimized.add_state(signature);
            if members.iter().any(|&state| self.is_accept_state(state)) {
                minimized.set_accept_state(id);
            }
        }

        for (block, members) in blocks.iter().enumerate() {
            let representative = match members.first() {
                Some(&state) => state,
                None => continue,
            };
            for (&input, &to) in &self.states[representative].transitions {
                if let Some(target) = partition.block_of(to) {
                    minimized.add_transition(block, input, target);
                }
            }
        }

        if let Some(start) = partition.block_of(self.start_state) {
            minimized.set_start_state(start);
        }

        debug!(
            "minimized dfa: {} -> {} states",
            self.number_of_states(),
            minimized.number_of_states()
        );
        minimized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::Builder;

    fn dfa(re: &str) -> DFA {
        DFA::build_dfa_from_nfa(&Builder::new().build_nfa_from_re(re).unwrap())
    }

    fn single(state: StateId) -> StateSet {
        std::iter::once(state).collect()
    }

    /// 0 -a-> 1, 0 -b-> 2, 1 -a-> 1, 2 -a-> 2，1 和 2 都是接收状态。
    /// 1 和 2 等价。
    fn dfa_with_equivalent_states() -> DFA {
        let mut dfa = DFA::init_empty(BTreeSet::new());
        for i in 0..3 {
            dfa.add_state(single(i));
        }
        dfa.set_start_state(0);
        dfa.add_transition(0, 'a', 1);
        dfa.add_transition(0, 'b', 2);
        dfa.add_transition(1, 'a', 1);
        dfa.add_transition(2, 'a', 2);
        dfa.set_accept_state(1);
        dfa.set_accept_state(2);
        dfa
    }

    #[test]
    fn merges_equivalent_states() {
        let dfa = dfa_with_equivalent_states();
        let minimized = dfa.minimize();
        assert_eq!(minimized.number_of_states(), 2);
        assert_eq!(minimized.start_state(), 0);
        assert_eq!(minimized.delta(0, 'a'), Some(1));
        assert_eq!(minimized.delta(0, 'b'), Some(1));
        assert_eq!(minimized.delta(1, 'a'), Some(1));
        assert_eq!(minimized.delta(1, 'b'), None);
        assert_eq!(
            minimized.signature(1),
            &vec![1, 2].into_iter().collect::<StateSet>()
        );
        for input in &["a", "b", "aaa", "ba", "", "ab", "bb"] {
            assert_eq!(dfa.accepts(input), minimized.accepts(input), "{}", input);
        }
    }

    #[test]
    fn prunes_unreachable_states() {
        let mut dfa = dfa_with_equivalent_states();
        let orphan = dfa.add_state(single(3));
        dfa.add_transition(orphan, 'a', 0);
        assert_eq!(reachable_states(&dfa), vec![0, 1, 2]);
        let partition = compute_partition(&dfa);
        assert_eq!(partition.block_of(orphan), None);
        assert_eq!(dfa.minimize().number_of_states(), 2);
    }

    #[test]
    fn missing_transition_is_distinguishing() {
        // 1 有 b 转移而 2 没有，所以它们不能合并。
        let mut dfa = dfa_with_equivalent_states();
        dfa.add_transition(1, 'b', 1);
        assert_eq!(dfa.minimize().number_of_states(), 3);
    }

    #[test]
    fn initial_partition_with_only_accepting_states() {
        let minimized = dfa("a*").minimize();
        assert_eq!(minimized.number_of_states(), 1);
        assert!(minimized.accepts(""));
        assert!(minimized.accepts("aaaa"));
        assert_eq!(minimized.to_fmt_output(), "\ta\n*#q0\tq0\n");
    }

    #[test]
    fn merged_table_output() {
        assert_eq!(
            dfa("a|b").minimize().to_fmt_output(),
            "\ta\tb\n#q0\tq1\tq1\n*q1\tN\tN\n"
        );
    }

    #[test]
    fn strictly_reduces_redundant_expression() {
        let dfa = dfa("(b|b)*abb(a|b)*");
        let minimized = dfa.minimize();
        assert!(minimized.number_of_states() < dfa.number_of_states());
        assert_eq!(minimized.number_of_states(), 4);
        assert_eq!(minimized.accept_states().len(), 1);
    }

    #[test]
    fn minimizing_twice_changes_nothing() {
        for re in &["(a|b)*c", "(b|b)*abb(a|b)*", "a+b?", "ab|ac"] {
            let once = dfa(re).minimize();
            let twice = once.minimize();
            assert_eq!(once.number_of_states(), twice.number_of_states(), "{}", re);
            assert_eq!(once.to_fmt_output(), twice.to_fmt_output(), "{}", re);
        }
    }

    #[test]
    fn signatures_cover_merged_members() {
        let dfa = dfa("(a|b)*c");
        let minimized = dfa.minimize();
        let before: StateSet = (0..dfa.number_of_states())
            .flat_map(|id| dfa.signature(id).iter().copied())
            .collect();
        let after: StateSet = (0..minimized.number_of_states())
            .flat_map(|id| minimized.signature(id).iter().copied())
            .collect();
        assert_eq!(before, after);
    }
}
