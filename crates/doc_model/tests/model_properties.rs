//! Property tests for the document model
//!
//! Generated trees are brought into canonical form first; markup must then
//! survive a full write/read cycle unchanged.

use doc_model::{
    map_marks_in_range, normalize_runs, parse_markup, runs_are_canonical, runs_char_len,
    to_markup, Alignment, DocumentLayout, DocumentTree, Mark, MarkSet, Node, TextDirection,
    TextRun,
};
use proptest::prelude::*;

fn arb_mark() -> impl Strategy<Value = Mark> {
    prop_oneof![
        Just(Mark::Bold),
        Just(Mark::Italic),
        Just(Mark::Underline),
        Just(Mark::Strike),
        Just(Mark::Subscript),
        Just(Mark::Superscript),
        "[0-9a-f]{6}".prop_map(|hex| Mark::TextColor(format!("#{hex}"))),
        "[0-9a-f]{6}".prop_map(|hex| Mark::Highlight(format!("#{hex}"))),
        "[a-z]{1,8}".prop_map(|host| Mark::Link(format!("https://{host}.test/?q=1&r=2"))),
        "[A-Za-z]{1,10}".prop_map(Mark::FontFamily),
    ]
}

fn arb_marks() -> impl Strategy<Value = MarkSet> {
    prop::collection::vec(arb_mark(), 0..3).prop_map(MarkSet::from)
}

fn arb_runs() -> impl Strategy<Value = Vec<TextRun>> {
    prop::collection::vec(("[a-zA-Z אב<>&\"'\n]{1,8}", arb_marks()), 0..4).prop_map(|parts| {
        let mut runs: Vec<TextRun> = parts
            .into_iter()
            .map(|(text, marks)| TextRun::with_marks(text, marks))
            .collect();
        normalize_runs(&mut runs);
        runs
    })
}

fn arb_align() -> impl Strategy<Value = Option<Alignment>> {
    prop_oneof![
        Just(None),
        Just(Some(Alignment::Left)),
        Just(Some(Alignment::Center)),
        Just(Some(Alignment::Right)),
        Just(Some(Alignment::Justify)),
    ]
}

fn arb_class() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z]{1,6}(-[0-9])?")
}

fn arb_textblock() -> impl Strategy<Value = Node> {
    (0u8..7, arb_runs(), arb_align(), arb_class()).prop_map(|(level, runs, align, class)| {
        let mut node = if level == 0 {
            Node::paragraph(runs)
        } else {
            Node::heading(level, runs)
        };
        node.attrs.align = align;
        node.attrs.class = class;
        node
    })
}

fn arb_list() -> impl Strategy<Value = Node> {
    (
        any::<bool>(),
        prop::collection::vec((0usize..4, arb_runs()), 1..5),
        arb_class(),
    )
        .prop_map(|(ordered, items, class)| {
            let items = items
                .into_iter()
                .map(|(depth, runs)| Node::list_item(depth, runs))
                .collect();
            let mut list = Node::list(ordered, items);
            list.attrs.class = class;
            list
        })
}

fn arb_table() -> impl Strategy<Value = Node> {
    (1usize..3, 1usize..3, any::<bool>(), arb_runs()).prop_map(|(rows, cols, header, runs)| {
        let rows = (0..rows)
            .map(|row| {
                let cells = (0..cols)
                    .map(|_| {
                        let content = vec![Node::paragraph(runs.clone())];
                        if header && row == 0 {
                            Node::header(content)
                        } else {
                            Node::cell(content)
                        }
                    })
                    .collect();
                Node::row(cells)
            })
            .collect();
        Node::table(rows).with_class("docx-table")
    })
}

fn arb_block() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => arb_textblock(),
        2 => arb_list(),
        1 => arb_table(),
        1 => arb_textblock().prop_map(|inner| Node::blockquote(vec![inner])),
        1 => "[a-z {}<;\n]{0,12}".prop_map(Node::code_block),
        1 => Just(Node::horizontal_rule()),
        1 => "[A-Za-z0-9+/]{4,12}".prop_map(|payload| {
            Node::image(format!("data:image/png;base64,{payload}"), Some("figure".into()))
        }),
    ]
}

fn arb_tree() -> impl Strategy<Value = DocumentTree> {
    (prop::collection::vec(arb_block(), 1..6), any::<bool>()).prop_map(|(blocks, envelope)| {
        let tree = DocumentTree::from_blocks(blocks);
        if envelope {
            tree.with_layout(DocumentLayout {
                direction: Some(TextDirection::Rtl),
                typography: Some("'David', 'Times New Roman', serif".into()),
                class: Some("docx-content".into()),
            })
        } else {
            tree
        }
    })
}

proptest! {
    #[test]
    fn prop_generated_trees_are_valid(tree in arb_tree()) {
        prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
    }

    #[test]
    fn prop_markup_round_trip(tree in arb_tree()) {
        let markup = to_markup(&tree);
        let parsed = parse_markup(&markup).unwrap();
        prop_assert_eq!(&parsed, &tree);
        prop_assert_eq!(to_markup(&parsed), markup);
    }

    #[test]
    fn prop_normalize_is_idempotent(tree in arb_tree()) {
        let mut again = tree.clone();
        again.normalize();
        prop_assert_eq!(again, tree);
    }

    #[test]
    fn prop_mark_mapping_keeps_runs_canonical(
        runs in arb_runs(),
        mark in arb_mark(),
        a in 0usize..20,
        b in 0usize..20,
    ) {
        let mut runs = runs;
        let len = runs_char_len(&runs);
        let (start, end) = (a.min(b).min(len), a.max(b).min(len));
        map_marks_in_range(&mut runs, start, end, |marks| marks.insert(mark.clone()));
        prop_assert!(runs_are_canonical(&runs));
        prop_assert_eq!(runs_char_len(&runs), len);
    }

    #[test]
    fn prop_word_count_matches_whitespace_split(tree in arb_tree()) {
        let expected = tree.plain_text().split_whitespace().count();
        prop_assert_eq!(tree.word_count(), expected);
    }
}
