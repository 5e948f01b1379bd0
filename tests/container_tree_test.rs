// Attachment engine behaviour on hand-built grammars
use std::sync::Arc;

use musicxml_containers::{Bound, ContainerTree, ContentError, GrammarNode, MaxOccurs};

/// Sequence{ a, Choice(0..1){ b | c } }
fn scenario() -> Arc<GrammarNode> {
    GrammarNode::sequence(
        vec![
            GrammarNode::element("a", Bound::ONCE),
            GrammarNode::choice(
                vec![GrammarNode::element("b", Bound::ONCE), GrammarNode::element("c", Bound::ONCE)],
                Bound::OPTIONAL,
            ),
        ],
        Bound::ONCE,
    )
}

#[test]
fn test_scenario() {
    let mut tree = ContainerTree::instantiate(scenario());
    assert_eq!(tree.required_names(false), vec!["a"]);

    tree.add("a", 1, None).unwrap();
    assert!(tree.required_names(false).is_empty());

    tree.add("b", 2, None).unwrap();
    assert_eq!(
        tree.add("c", 3, None).unwrap_err(),
        ContentError::NoMatchingSlot { tag: "c".to_string() }
    );

    tree.remove(&2).unwrap();
    tree.add("c", 3, None).unwrap();
    assert_eq!(tree.items(), vec![1, 3]);
}

#[test]
fn test_round_trip_restores_fresh_state() {
    // note-like content: Sequence{ Choice{ (grace, pitch) | (pitch, duration) }, dot* }
    let grammar = GrammarNode::sequence(
        vec![
            GrammarNode::choice(
                vec![
                    GrammarNode::sequence(
                        vec![GrammarNode::element("grace", Bound::ONCE), GrammarNode::element("pitch", Bound::ONCE)],
                        Bound::ONCE,
                    ),
                    GrammarNode::sequence(
                        vec![GrammarNode::element("pitch", Bound::ONCE), GrammarNode::element("duration", Bound::ONCE)],
                        Bound::ONCE,
                    ),
                ],
                Bound::ONCE,
            ),
            GrammarNode::element("dot", Bound::ANY),
        ],
        Bound::ONCE,
    );
    let fresh = ContainerTree::<u32>::instantiate(grammar.clone()).snapshot();

    let mut tree = ContainerTree::instantiate(grammar);
    let added = [("grace", 1), ("pitch", 2), ("dot", 3), ("dot", 4)];
    for (tag, item) in added {
        tree.add(tag, item, None).unwrap();
    }
    assert_ne!(tree.snapshot(), fresh);

    for (_, item) in added.iter().rev() {
        tree.remove(item).unwrap();
    }
    assert_eq!(tree.snapshot(), fresh);
    assert!(tree.is_empty());
}

#[test]
fn test_saturation_without_repetition() {
    let grammar = GrammarNode::sequence(vec![GrammarNode::element("beam", Bound::range(0, 3).unwrap())], Bound::ONCE);
    let mut tree = ContainerTree::instantiate(grammar);
    for item in 0..3 {
        tree.add("beam", item, None).unwrap();
    }
    assert_eq!(
        tree.add("beam", 3, None).unwrap_err(),
        ContentError::SlotSaturated {
            tag: "beam".to_string(),
            max: 3
        }
    );
    assert_eq!(tree.count_of("beam"), 3);
}

#[test]
fn test_saturation_spills_into_new_repetition() {
    let grammar = GrammarNode::sequence(
        vec![
            GrammarNode::element("beats", Bound::ONCE),
            GrammarNode::element("beat-type", Bound::ONCE),
        ],
        Bound::at_least(1),
    );
    let mut tree = ContainerTree::instantiate(grammar);
    tree.add("beats", 1, None).unwrap();
    tree.add("beat-type", 2, None).unwrap();
    tree.add("beats", 3, None).unwrap();

    assert_eq!(tree.repetitions(tree.root()), 2);
    let leaf = tree.leaf_of(&3).unwrap();
    assert_eq!(tree.leaf(leaf).unwrap().attached, vec![3]);
    assert_eq!(tree.required_names(false), vec!["beat-type"]);
}

#[test]
fn test_choice_exclusivity_until_fully_removed() {
    let grammar = GrammarNode::choice(
        vec![
            GrammarNode::sequence(
                vec![GrammarNode::element("x", Bound::ONCE), GrammarNode::element("y", Bound::OPTIONAL)],
                Bound::ONCE,
            ),
            GrammarNode::element("z", Bound::ONCE),
        ],
        Bound::ONCE,
    );
    let mut tree = ContainerTree::instantiate(grammar);
    tree.add("x", 1, None).unwrap();
    tree.add("y", 2, None).unwrap();
    assert!(tree.add("z", 3, None).is_err());

    tree.remove(&1).unwrap();
    assert!(tree.add("z", 3, None).is_err());

    tree.remove(&2).unwrap();
    tree.add("z", 3, None).unwrap();
}

#[test]
fn test_required_names_monotonic() {
    let grammar = GrammarNode::sequence(
        vec![
            GrammarNode::element("part-name", Bound::ONCE),
            GrammarNode::element("part-abbreviation", Bound::OPTIONAL),
            GrammarNode::element("score-instrument", Bound::at_least(2)),
        ],
        Bound::ONCE,
    );
    let mut tree = ContainerTree::instantiate(grammar);
    assert_eq!(
        tree.required_names(false),
        vec!["part-name", "score-instrument"]
    );

    tree.add("score-instrument", 1, None).unwrap();
    assert_eq!(
        tree.required_names(false),
        vec!["part-name", "score-instrument"]
    );
    tree.add("score-instrument", 2, None).unwrap();
    assert_eq!(tree.required_names(false), vec!["part-name"]);
    tree.add("part-name", 3, None).unwrap();
    assert!(tree.required_names(false).is_empty());
}

#[test]
fn test_duplication_pruning_keeps_one_repetition() {
    let grammar = GrammarNode::sequence(
        vec![GrammarNode::element("measure", Bound::ONCE)],
        Bound::new(1, MaxOccurs::Unbounded).unwrap(),
    );
    let mut tree = ContainerTree::instantiate(grammar);
    let fresh_slots = tree.live_slots();

    for item in 1..=3 {
        tree.add("measure", item, None).unwrap();
    }
    assert_eq!(tree.repetitions(tree.root()), 3);
    assert_eq!(tree.items(), vec![1, 2, 3]);

    for item in 1..=3 {
        tree.remove(&item).unwrap();
    }
    assert_eq!(tree.repetitions(tree.root()), 1);
    assert_eq!(tree.live_slots(), fresh_slots);
    assert_eq!(tree.required_names(false), vec!["measure"]);
}

#[test]
fn test_emptied_first_repetition_is_pruned() {
    // Sequence(1..unbounded){ x, y? }
    let grammar = GrammarNode::sequence(
        vec![
            GrammarNode::element("x", Bound::ONCE),
            GrammarNode::element("y", Bound::OPTIONAL),
        ],
        Bound::new(1, MaxOccurs::Unbounded).unwrap(),
    );
    let mut tree = ContainerTree::instantiate(grammar);
    tree.add("x", 1, None).unwrap();
    tree.add("x", 2, None).unwrap();
    assert_eq!(tree.repetitions(tree.root()), 2);

    tree.remove(&1).unwrap();
    assert_eq!(tree.repetitions(tree.root()), 1);
    assert_eq!(tree.items(), vec![2]);
    assert!(tree.required_names(false).is_empty());

    // y belongs after the remaining x, not in front of it
    tree.add("y", 3, None).unwrap();
    assert_eq!(tree.items(), vec![2, 3]);
    assert!(tree.required_names(false).is_empty());
    let names: Vec<String> = tree.entries().into_iter().map(|(tag, _)| tag).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn test_failed_add_leaves_tree_untouched() {
    let mut tree = ContainerTree::instantiate(scenario());
    tree.add("a", 1, None).unwrap();
    let before = tree.snapshot();

    assert!(tree.add("a", 2, None).is_err());
    assert!(tree.add("nothing", 3, None).is_err());
    assert_eq!(tree.remove(&42).unwrap_err(), ContentError::NotAttached);
    assert_eq!(tree.replace(&42, 5).unwrap_err(), ContentError::NotFound);
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_repeated_choice_keeps_document_order() {
    let grammar = GrammarNode::sequence(
        vec![GrammarNode::choice(
            vec![
                GrammarNode::element("note", Bound::ONCE),
                GrammarNode::element("backup", Bound::ONCE),
                GrammarNode::element("attributes", Bound::ONCE),
            ],
            Bound::new(0, MaxOccurs::Unbounded).unwrap(),
        )],
        Bound::ONCE,
    );
    let mut tree = ContainerTree::instantiate(grammar);
    for (item, tag) in ["attributes", "note", "note", "backup", "note"].iter().enumerate() {
        tree.add(tag, item, None).unwrap();
    }
    assert_eq!(tree.items(), vec![0, 1, 2, 3, 4]);

    tree.remove(&2).unwrap();
    assert_eq!(tree.items(), vec![0, 1, 3, 4]);
    let names: Vec<String> = tree.entries().into_iter().map(|(tag, _)| tag).collect();
    assert_eq!(names, vec!["attributes", "note", "backup", "note"]);
}

#[test]
fn test_forward_hint_picks_later_candidate() {
    // tie appears in two branches; the hint selects the second leaf
    let grammar = GrammarNode::sequence(
        vec![
            GrammarNode::element("tie", Bound::OPTIONAL),
            GrammarNode::element("voice", Bound::OPTIONAL),
            GrammarNode::element("tie", Bound::OPTIONAL),
        ],
        Bound::ONCE,
    );
    let mut tree = ContainerTree::instantiate(grammar);
    tree.add("voice", 1, None).unwrap();
    // the first tie is closed once voice is attached
    tree.add("tie", 2, None).unwrap();
    assert_eq!(tree.items(), vec![1, 2]);

    let mut hinted = ContainerTree::instantiate(tree.grammar().clone());
    let leaf = hinted.add("tie", 1, Some(1)).unwrap();
    assert_eq!(Some(leaf), tree.leaf_of(&2));
    // voice sits before the tie that now holds a child
    assert!(hinted.add("voice", 2, None).is_err());
    assert!(hinted.add("tie", 3, Some(5)).is_err());
}
