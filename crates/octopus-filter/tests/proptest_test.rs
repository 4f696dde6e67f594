//! Property tests for the lexer, literals and binder

use octopus_filter::ast::{Literal, LiteralKind};
use octopus_filter::parser::parse;
use octopus_filter::{extract_raw, unquote, FilterError, FilterExpression};
use proptest::prelude::*;

/// Well formed filter sources built from a few leaf functions
fn filter_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[A-Za-z][A-Za-z-]{0,12}".prop_map(|h| format!(r#"(has-header "{h}")"#)),
        "[a-z/]{1,10}".prop_map(|p| format!(r#"(path-contains "{p}")"#)),
        "[a-z]{1,8}".prop_map(|p| format!(r#"(path-matches r"^/{p}/.*")"#)),
        (100i64..600).prop_map(|c| format!("(status-code-eq {c})")),
        (0i64..0xffff).prop_map(|p| format!("(listener-port-eq {p:#x})")),
        Just("(in-scope)".to_string()),
        Just("(from-proxy)".to_string()),
    ];
    let sep = prop_oneof![Just(" "), Just("  "), Just("\n\t")];

    leaf.prop_recursive(4, 32, 4, move |inner| {
        let sep = sep.clone();
        prop_oneof![
            (
                prop_oneof![Just("and"), Just("or")],
                prop::collection::vec(prop_oneof![inner.clone(), Just("true".to_string())], 0..4),
                sep,
            )
                .prop_map(|(op, args, sep)| {
                    let mut source = format!("({op}");
                    for arg in args {
                        source.push_str(sep);
                        source.push_str(&arg);
                    }
                    source.push(')');
                    source
                }),
            inner.prop_map(|e| format!("(not {e})")),
        ]
    })
}

proptest! {
    #[test]
    fn parse_never_panics(source in "\\PC{0,64}") {
        let _ = FilterExpression::parse(&source);
    }

    #[test]
    fn parse_never_panics_on_parens(source in "[()\" a-z0-9-]{0,48}") {
        let _ = FilterExpression::parse(&source);
    }

    #[test]
    fn source_round_trips(source in filter_source()) {
        let filter = FilterExpression::parse(&source).unwrap();
        prop_assert_eq!(filter.to_string(), source.clone());

        let reparsed = FilterExpression::parse(&filter.to_string()).unwrap();
        prop_assert_eq!(reparsed.source(), filter.source());
        prop_assert_eq!(parse(reparsed.source()).unwrap(), parse(&source).unwrap());
    }

    #[test]
    fn numeric_bases_agree(n in 0i64..=i64::from(u32::MAX)) {
        let decimal = Literal::new(LiteralKind::Number, n.to_string());
        let hex = Literal::new(LiteralKind::Number, format!("{n:#x}"));
        let binary = Literal::new(LiteralKind::Number, format!("{n:#b}"));

        prop_assert_eq!(decimal.must_get_int("f").unwrap(), n);
        prop_assert_eq!(hex.must_get_int("f").unwrap(), n);
        prop_assert_eq!(binary.must_get_int("f").unwrap(), n);
    }

    #[test]
    fn plain_strings_unquote_to_themselves(s in "[^\"\\\\]{0,32}") {
        prop_assert_eq!(unquote(&format!("\"{s}\"")).unwrap(), s.clone());
        let raw = format!("r\"{s}\"");
        prop_assert_eq!(extract_raw(&raw), s.as_str());
    }

    #[test]
    fn vararg_accepts_any_count(names in prop::collection::vec("[A-Za-z][A-Za-z-]{0,8}", 1..8)) {
        let args: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
        let source = format!("(has-header {})", args.join(" "));
        prop_assert!(FilterExpression::parse(&source).is_ok());
    }

    #[test]
    fn fixed_arity_rejects_extra(extra in 1usize..5) {
        let args = vec!["r\"a\""; 1 + extra].join(" ");
        let source = format!("(host-matches {args})");
        let is_too_many = matches!(
            FilterExpression::parse(&source),
            Err(FilterError::TooManyArgs { function: "host-matches", expected: 1 })
        );
        prop_assert!(is_too_many);
    }
}
