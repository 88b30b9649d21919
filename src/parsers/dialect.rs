//! Legacy-dialect detection and textual conversion
//!
//! Detection counts a fixed set of legacy-syntax indicators; conversion is a
//! sequence of deterministic, line-scoped, idempotent text rewrites. The
//! rewrites are best-effort by design: they exist to obtain *some* tree for
//! analysis, not to be a correct legacy-to-current transpiler, and a rewrite
//! that still fails to parse surfaces the original syntax error upstream.
//!
//! None of the rules adds or removes lines, so line numbers survive
//! conversion unchanged.

use regex::Regex;
use std::sync::OnceLock;

static BARE_PRINT: OnceLock<Regex> = OnceLock::new();
static ITER_METHODS: OnceLock<Regex> = OnceLock::new();
static XRANGE: OnceLock<Regex> = OnceLock::new();
static FUTURE_IMPORT: OnceLock<Regex> = OnceLock::new();
static COMMA_EXCEPT: OnceLock<Regex> = OnceLock::new();
static URLLIB2: OnceLock<Regex> = OnceLock::new();
static LAMBDA_TUPLE: OnceLock<Regex> = OnceLock::new();
static LEGACY_SHEBANG: OnceLock<Regex> = OnceLock::new();

static PRINT_REWRITE: OnceLock<Regex> = OnceLock::new();
static LAMBDA_PAIR: OnceLock<Regex> = OnceLock::new();
static LAMBDA_PARENS: OnceLock<Regex> = OnceLock::new();
static UNICODE_PREFIX: OnceLock<Regex> = OnceLock::new();
static URLLIB2_IMPORT: OnceLock<Regex> = OnceLock::new();
static URLLIB2_FROM: OnceLock<Regex> = OnceLock::new();
static RAW_INPUT: OnceLock<Regex> = OnceLock::new();

fn bare_print() -> &'static Regex {
    BARE_PRINT.get_or_init(|| Regex::new(r"(?m)^\s*print\s+[^\s(=]").expect("valid regex"))
}
fn iter_methods() -> &'static Regex {
    ITER_METHODS
        .get_or_init(|| Regex::new(r"\.iter(?:items|keys|values)\s*\(").expect("valid regex"))
}
fn xrange() -> &'static Regex {
    XRANGE.get_or_init(|| Regex::new(r"\bxrange\s*\(").expect("valid regex"))
}
fn future_import() -> &'static Regex {
    FUTURE_IMPORT
        .get_or_init(|| Regex::new(r"(?m)^\s*from\s+__future__\s+import\b").expect("valid regex"))
}
fn comma_except() -> &'static Regex {
    COMMA_EXCEPT.get_or_init(|| {
        Regex::new(r"except\s+(\([^)]*\)|[\w.]+)\s*,\s*(\w+)\s*:").expect("valid regex")
    })
}
fn urllib2() -> &'static Regex {
    URLLIB2.get_or_init(|| Regex::new(r"\burllib2\b").expect("valid regex"))
}
fn lambda_tuple() -> &'static Regex {
    LAMBDA_TUPLE.get_or_init(|| Regex::new(r"\blambda\s*\(").expect("valid regex"))
}
fn legacy_shebang() -> &'static Regex {
    LEGACY_SHEBANG.get_or_init(|| Regex::new(r"(?m)^#!.*python2").expect("valid regex"))
}

fn print_rewrite() -> &'static Regex {
    PRINT_REWRITE.get_or_init(|| {
        Regex::new(r"(?m)^(?P<indent>\s*)print\s+(?P<body>[^\s(=][^#\r\n]*?)\s*(?P<comment>#[^\r\n]*)?$")
            .expect("valid regex")
    })
}
fn lambda_pair() -> &'static Regex {
    LAMBDA_PAIR.get_or_init(|| {
        Regex::new(r"\blambda\s*\(\s*(?P<a>\w+)\s*,\s*(?P<b>\w+)\s*\)\s*:").expect("valid regex")
    })
}
fn lambda_parens() -> &'static Regex {
    LAMBDA_PARENS
        .get_or_init(|| Regex::new(r"\blambda\s*\((?P<params>[^)]*)\)\s*:").expect("valid regex"))
}
fn unicode_prefix() -> &'static Regex {
    UNICODE_PREFIX.get_or_init(|| Regex::new(r#"\bu(?P<quote>['"])"#).expect("valid regex"))
}
fn urllib2_import() -> &'static Regex {
    URLLIB2_IMPORT
        .get_or_init(|| Regex::new(r"(?m)^(?P<indent>\s*)import\s+urllib2\s*$").expect("valid regex"))
}
fn urllib2_from() -> &'static Regex {
    URLLIB2_FROM.get_or_init(|| {
        Regex::new(r"(?m)^(?P<indent>\s*)from\s+urllib2\s+import\b").expect("valid regex")
    })
}
fn raw_input() -> &'static Regex {
    RAW_INPUT.get_or_init(|| Regex::new(r"\braw_input\s*\(").expect("valid regex"))
}

/// Count how many distinct legacy-syntax indicators appear in `source`.
pub fn count_legacy_indicators(source: &str) -> usize {
    [
        bare_print(),
        iter_methods(),
        xrange(),
        future_import(),
        comma_except(),
        urllib2(),
        lambda_tuple(),
        legacy_shebang(),
    ]
    .iter()
    .filter(|re| re.is_match(source))
    .count()
}

/// Check whether the legacy-tolerant structural grammar accepts the source.
///
/// tree-sitter's Python grammar covers legacy constructs like bare `print`
/// statements, which makes it a cheap validity check before textual rewriting.
pub fn structurally_valid_legacy(source: &str) -> bool {
    let mut parser = tree_sitter::Parser::new();
    if parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .is_err()
    {
        return false;
    }
    match parser.parse(source, None) {
        Some(tree) => !tree.root_node().has_error(),
        None => false,
    }
}

/// Apply every textual conversion rule, in order.
///
/// Each rule is idempotent and line-scoped, so converting already-converted
/// text is a no-op.
pub fn convert_legacy_source(source: &str) -> String {
    let text = convert_print_statements(source);
    let text = convert_comma_except(&text);
    let text = convert_lambda_tuples(&text);
    let text = xrange().replace_all(&text, "range(").into_owned();
    let text = convert_iter_methods(&text);
    let text = unicode_prefix().replace_all(&text, "$quote").into_owned();
    let text = convert_urllib2(&text);
    raw_input().replace_all(&text, "input(").into_owned()
}

fn convert_print_statements(source: &str) -> String {
    print_rewrite()
        .replace_all(source, |caps: &regex::Captures| {
            let comment = caps.name("comment").map(|m| m.as_str()).unwrap_or("");
            let sep = if comment.is_empty() { "" } else { "  " };
            format!("{}print({}){}{}", &caps["indent"], &caps["body"], sep, comment)
        })
        .into_owned()
}

fn convert_comma_except(source: &str) -> String {
    comma_except()
        .replace_all(source, "except $1 as $2:")
        .into_owned()
}

/// Rewrite `lambda (a, b): expr` to a single-parameter lambda with index
/// access into the parameter. Other arities fall back to plain parenthesis
/// removal, which at least yields parseable (if not equivalent) code.
fn convert_lambda_tuples(source: &str) -> String {
    source
        .lines()
        .map(convert_lambda_tuples_in_line)
        .collect::<Vec<_>>()
        .join("\n")
        + if source.ends_with('\n') { "\n" } else { "" }
}

fn convert_lambda_tuples_in_line(line: &str) -> String {
    let mut line = line.to_string();

    // Two-identifier tuples get the index-access rewrite; bail out after a
    // bounded number of passes in case of pathological input.
    for _ in 0..8 {
        let Some(caps) = lambda_pair().captures(&line) else {
            break;
        };
        let a = caps.name("a").map(|m| m.as_str().to_string()).unwrap_or_default();
        let b = caps.name("b").map(|m| m.as_str().to_string()).unwrap_or_default();
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let param = format!("{a}_{b}");

        let head = &line[..whole.0];
        let tail = &line[whole.1..];
        let tail = Regex::new(&format!(r"\b{}\b", regex::escape(&a)))
            .expect("valid regex")
            .replace_all(tail, format!("{param}[0]").as_str())
            .into_owned();
        let tail = Regex::new(&format!(r"\b{}\b", regex::escape(&b)))
            .expect("valid regex")
            .replace_all(&tail, format!("{param}[1]").as_str())
            .into_owned();

        line = format!("{head}lambda {param}:{tail}");
    }

    // Remaining parenthesized parameter lists (other arities) just lose the
    // parentheses.
    lambda_parens()
        .replace_all(&line, "lambda $params:")
        .into_owned()
}

fn convert_iter_methods(source: &str) -> String {
    let text = Regex::new(r"\.iteritems\s*\(")
        .expect("valid regex")
        .replace_all(source, ".items(")
        .into_owned();
    let text = Regex::new(r"\.iterkeys\s*\(")
        .expect("valid regex")
        .replace_all(&text, ".keys(")
        .into_owned();
    Regex::new(r"\.itervalues\s*\(")
        .expect("valid regex")
        .replace_all(&text, ".values(")
        .into_owned()
}

fn convert_urllib2(source: &str) -> String {
    let text = urllib2_import()
        .replace_all(source, "${indent}import urllib.request as urllib2")
        .into_owned();
    urllib2_from()
        .replace_all(&text, "${indent}from urllib.request import")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_counting() {
        let legacy = "#!/usr/bin/env python2\nfor i in xrange(3):\n    print i\n";
        assert!(count_legacy_indicators(legacy) >= 3);

        let current = "for i in range(3):\n    print(i)\n";
        assert_eq!(count_legacy_indicators(current), 0);
    }

    #[test]
    fn test_print_conversion() {
        assert_eq!(convert_print_statements("print x"), "print(x)");
        assert_eq!(
            convert_print_statements("    print 'hi', name"),
            "    print('hi', name)"
        );
        // already a call: unchanged
        assert_eq!(convert_print_statements("print(x)"), "print(x)");
        // assignment to a name called print: unchanged
        assert_eq!(convert_print_statements("print = 5"), "print = 5");
    }

    #[test]
    fn test_print_conversion_preserves_comment() {
        assert_eq!(
            convert_print_statements("print x  # debug"),
            "print(x)  # debug"
        );
    }

    #[test]
    fn test_comma_except_conversion() {
        assert_eq!(
            convert_comma_except("except ValueError, e:"),
            "except ValueError as e:"
        );
        assert_eq!(
            convert_comma_except("except (IOError, OSError), err:"),
            "except (IOError, OSError) as err:"
        );
        // tuple without a binding: unchanged
        assert_eq!(
            convert_comma_except("except (IOError, OSError):"),
            "except (IOError, OSError):"
        );
    }

    #[test]
    fn test_lambda_pair_conversion() {
        assert_eq!(
            convert_lambda_tuples("f = lambda (x, y): x + y"),
            "f = lambda x_y: x_y[0] + x_y[1]"
        );
    }

    #[test]
    fn test_lambda_other_arity_drops_parens() {
        assert_eq!(
            convert_lambda_tuples("f = lambda (x, y, z): x"),
            "f = lambda x, y, z: x"
        );
    }

    #[test]
    fn test_iter_method_conversion() {
        assert_eq!(
            convert_iter_methods("for k, v in d.iteritems():"),
            "for k, v in d.items():"
        );
        assert_eq!(convert_iter_methods("d.iterkeys()"), "d.keys()");
        assert_eq!(convert_iter_methods("d.itervalues()"), "d.values()");
    }

    #[test]
    fn test_urllib2_conversion() {
        assert_eq!(
            convert_urllib2("import urllib2"),
            "import urllib.request as urllib2"
        );
        assert_eq!(
            convert_urllib2("from urllib2 import urlopen"),
            "from urllib.request import urlopen"
        );
    }

    #[test]
    fn test_unicode_prefix_and_raw_input() {
        let converted = convert_legacy_source("name = raw_input(u'who? ')\n");
        assert_eq!(converted, "name = input('who? ')\n");
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let legacy = "for k, v in d.iteritems():\n    print k\nx = xrange(3)\n";
        let once = convert_legacy_source(legacy);
        let twice = convert_legacy_source(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_structural_grammar_accepts_bare_print() {
        assert!(structurally_valid_legacy("print \"hello\"\n"));
        assert!(!structurally_valid_legacy("def f(:\n"));
    }
}
