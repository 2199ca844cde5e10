//! 在浏览器或 node 中测试 wasm 入口。
#![cfg(target_arch = "wasm32")]

extern crate wasm_bindgen_test;
use wasm_bindgen_test::*;

use wasm_redfa::get_ans;

#[wasm_bindgen_test]
fn get_ans_returns_four_sections() {
    let ans = get_ans("(a|b)*c", "abc\nab");
    let sections: Vec<&str> = ans.split('@').collect();
    assert_eq!(sections.len(), 4);
    assert_eq!(sections[0], "ab|*c.");
    assert!(sections[2].starts_with("digraph DFA {"));
    assert!(sections[3].starts_with("abc\tNFA: accept"));
}

#[wasm_bindgen_test]
fn get_ans_reports_errors() {
    assert!(get_ans("a||b", "").starts_with("error@"));
}
