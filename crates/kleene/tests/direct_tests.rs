use kleene::direct::regex_to_dfa;
use kleene::{ConvertOptions, Dfa, RegexToDfaRequest, StepKind, StepRecorder};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn compile_regex(re_str: &str, quiet: bool) -> Dfa {
    init();
    let mut recorder = StepRecorder::default();
    let result = regex_to_dfa(re_str, &ConvertOptions::default(), &mut recorder)
        .expect("failed to convert regex");
    if !quiet {
        println!("dfa = {:?}", result.dfa.to_json());
    }
    result.dfa
}

fn run_vectors(tests: &[(&str, bool)], dfa: &Dfa, re_str: &str) {
    for (test, expected_result) in tests {
        let result = dfa.accepts(test);
        assert_eq!(
            result, *expected_result,
            "'{}' failed on input '{}', expect match: {}, actual match: {}",
            re_str, test, expected_result, result
        );
    }
}

#[test]
fn single_symbol() {
    let re_str = "a";
    let dfa = compile_regex(re_str, false);

    assert_eq!(dfa.states().len(), 2);
    assert_eq!(dfa.transitions().len(), 1);
    let start = dfa.start_state();
    assert!(!start.is_final);
    let other = dfa.states().iter().find(|s| s.id != start.id).unwrap();
    assert!(other.is_final);
    assert_eq!(dfa.next_state(&start.id, 'a'), Some(other.id.as_str()));

    run_vectors(&[("a", true), ("", false), ("aa", false), ("b", false)], &dfa, re_str)
}

#[test]
fn single_star() {
    let re_str = "a*";
    let dfa = compile_regex(re_str, false);

    assert_eq!(dfa.states().len(), 1);
    let start = dfa.start_state();
    assert!(start.is_final);
    assert_eq!(dfa.next_state(&start.id, 'a'), Some(start.id.as_str()));

    run_vectors(&[("", true), ("a", true), ("aaaa", true), ("b", false)], &dfa, re_str)
}

#[test]
fn basic() {
    let re_str = "a(b|c)*";
    let dfa = compile_regex(re_str, true);

    let test_vectors = vec![
        ("a", true),
        ("b", false),
        ("x", false),
        ("ab", true),
        ("ac", true),
        ("abcbc", true),
        ("acbcb", true),
        ("bcbc", false),
        ("abbbbbbbbbb", true),
    ];

    run_vectors(&test_vectors, &dfa, re_str)
}

#[test]
fn optional_and_plus() {
    let re_str = "(a*b)?c+";
    let dfa = compile_regex(re_str, true);

    let test_vectors = vec![
        ("c", true),
        ("bc", true),
        ("aaabccc", true),
        ("", false),
        ("ab", false),
        ("abbc", false),
        ("cc", true),
    ];

    run_vectors(&test_vectors, &dfa, re_str)
}

#[test]
fn empty_regex_and_epsilon() {
    for re_str in ["", "ε", "()", " "] {
        let dfa = compile_regex(re_str, true);
        assert_eq!(dfa.states().len(), 1, "'{}'", re_str);
        run_vectors(&[("", true), ("a", false)], &dfa, re_str);
    }
}

#[test]
fn empty_set_branches_drop_out() {
    let dfa = compile_regex("a∅|∅*b", true);
    run_vectors(&[("", false), ("b", true), ("a", false), ("ab", false)], &dfa, "a∅|∅*b");
}

#[test]
fn union_of_words() {
    let re_str = "abc|abd|b";
    let dfa = compile_regex(re_str, true);
    run_vectors(
        &[("abc", true), ("abd", true), ("b", true), ("ab", false), ("abcd", false)],
        &dfa,
        re_str,
    )
}

#[test]
fn step_trace_for_textbook_example() {
    let mut recorder = StepRecorder::default();
    regex_to_dfa("(a|b)*abb", &ConvertOptions::default(), &mut recorder).unwrap();
    let steps = recorder.steps();

    let dfa_states = steps.iter().filter(|s| s.kind == StepKind::DfaState).count();
    assert_eq!(dfa_states, 4);
    assert_eq!(steps[3].data["followposTable"]["3"], serde_json::json!([4]));
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.id, format!("step_{}", i + 1));
        assert_eq!(step.timestamp, i as u64 + 1);
    }
}

#[test]
fn malformed_regexes_fail_through_convert() {
    for re_str in ["(a", "a)", "*", "a|*", "(a|b", "a#"] {
        let response = RegexToDfaRequest::new(re_str).convert();
        assert!(!response.success, "'{}'", re_str);
        assert!(response.error.is_some(), "'{}'", re_str);
        assert!(response.dfa.is_none(), "'{}'", re_str);
    }
}

#[test]
fn execution_trace_follows_the_walk() {
    let dfa = compile_regex("ab", true);
    let trace = dfa.execution_trace("ab");

    assert_eq!(trace.len(), 3);
    assert_eq!(trace[0].state.as_deref(), Some(dfa.start_state().id.as_str()));
    assert_eq!(trace[2].symbol, Some('b'));
    assert!(dfa.is_final(trace[2].state.as_deref().unwrap()));
}

#[test]
fn long_literal_converts() {
    init();
    let response = RegexToDfaRequest::new("ab".repeat(2000)).convert();

    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.dfa.as_ref().map(|dfa| dfa.states.len()), Some(4001));
    assert!(serde_json::to_string(&response).is_ok());
}

#[test]
fn nesting_up_to_the_limit_converts() {
    let re_str = format!("{}(a|b)*abb{}", "(".repeat(99), ")".repeat(99));
    let dfa = compile_regex(&re_str, true);
    run_vectors(&[("abb", true), ("babb", true), ("ab", false)], &dfa, &re_str)
}

#[test]
fn deep_nesting_fails_through_convert() {
    let re_str = format!("{}a{}", "(".repeat(1000), ")".repeat(1000));
    let response = RegexToDfaRequest::new(re_str).convert();

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Parentheses nest deeper than 100 levels at position 100")
    );
}
