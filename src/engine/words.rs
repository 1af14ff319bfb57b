//! Identifier word handling
//!
//! Names are compared word by word: `isNotReady`, `is_not_ready` and
//! `IS_NOT_READY` all split into `["is", "not", "ready"]`.

use crate::config::NamingConvention;

/// Words accepted as the leading verb of a function name
pub const ACTION_WORDS: &[&str] = &[
    "add", "append", "apply", "assert", "assign", "attach", "await", "bind", "build", "cache",
    "calculate", "call", "can", "cancel", "check", "clean", "clear", "clone", "close", "collect",
    "compare", "compile", "compose", "compute", "configure", "connect", "convert", "copy",
    "count", "create", "debounce", "decode", "define", "delete", "describe", "deserialize",
    "destroy", "detach", "detect", "disable", "disconnect", "dispatch", "display", "dispose",
    "do", "download", "draw", "emit", "enable", "encode", "ensure", "enqueue", "evaluate",
    "execute", "expand", "export", "extract", "fetch", "filter", "find", "fire", "flush",
    "format", "generate", "get", "go", "group", "handle", "has", "hide", "import", "init",
    "initialize", "insert", "install", "invoke", "is", "join", "list", "listen", "load", "lock",
    "log", "lookup", "make", "map", "mark", "match", "measure", "merge", "mount", "move",
    "navigate", "normalize", "notify", "observe", "on", "open", "parse", "patch", "pick", "pop",
    "post", "prepare", "prepend", "print", "process", "publish", "pull", "push", "put", "query",
    "read", "receive", "redirect", "reduce", "refresh", "register", "reload", "remove", "render",
    "replace", "report", "request", "reset", "resolve", "restore", "retry", "return", "run",
    "save", "scan", "schedule", "search", "select", "send", "serialize", "set", "setup",
    "should", "show", "sort", "split", "start", "stop", "store", "submit", "subscribe", "sync",
    "test", "throttle", "to", "toggle", "track", "transform", "trigger", "trim", "try",
    "unlock", "unmount", "unregister", "unsubscribe", "update", "upload", "use", "validate",
    "verify", "visit", "wait", "watch", "wrap", "write",
];

/// Words marking a negatively phrased boolean
pub const NEGATIVE_WORDS: &[&str] = &[
    "not", "no", "never", "non", "dont", "doesnt", "cannot", "cant", "isnt", "hasnt", "wasnt",
    "didnt", "shouldnt", "wont",
];

/// Strip leading `_` and `$` markers
pub fn strip_markers(name: &str) -> &str {
    name.trim_start_matches(['_', '$'])
}

/// Split an identifier into lowercase words
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '$' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // "fooBar" splits before B; "HTMLParser" splits before P
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// First word of an identifier, lowercased
pub fn first_word(name: &str) -> Option<String> {
    split_words(name).into_iter().next()
}

/// Whether the name starts with one of the given words
pub fn starts_with_any(name: &str, candidates: &[impl AsRef<str>]) -> bool {
    match first_word(name) {
        Some(first) => candidates
            .iter()
            .any(|c| c.as_ref().eq_ignore_ascii_case(&first)),
        None => false,
    }
}

/// The first negative word in the name, if any
pub fn negative_word(name: &str) -> Option<String> {
    split_words(name)
        .into_iter()
        .find(|w| NEGATIVE_WORDS.contains(&w.as_str()))
}

pub fn is_constant_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_lowercase())
        && chars.all(|c| c.is_alphanumeric())
}

fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_uppercase())
        && name.chars().any(|c| c.is_lowercase())
        && chars.all(|c| c.is_alphanumeric())
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_lowercase())
        && !name.contains("__")
        && !name.ends_with('_')
        && name
            .chars()
            .all(|c| c.is_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Whether a (marker-stripped) name follows the convention.
///
/// Under camelCase, PascalCase is also accepted for constructors and components.
pub fn follows_convention(name: &str, convention: NamingConvention) -> bool {
    match convention {
        NamingConvention::Any => true,
        NamingConvention::CamelCase => is_camel_case(name) || is_pascal_case(name),
        NamingConvention::SnakeCase => is_snake_case(name),
        NamingConvention::PascalCase => is_pascal_case(name),
    }
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Join lowercase words in the given convention
pub fn join_words(words: &[String], convention: NamingConvention) -> String {
    match convention {
        NamingConvention::SnakeCase => words.join("_"),
        NamingConvention::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
        NamingConvention::CamelCase | NamingConvention::Any => {
            let mut out = String::new();
            for (i, w) in words.iter().enumerate() {
                if i == 0 {
                    out.push_str(w);
                } else {
                    out.push_str(&capitalize(w));
                }
            }
            out
        }
    }
}

/// Convention a name is currently written in
pub fn detect_convention(name: &str) -> NamingConvention {
    if is_snake_case(name) && name.contains('_') {
        NamingConvention::SnakeCase
    } else if is_pascal_case(name) {
        NamingConvention::PascalCase
    } else {
        NamingConvention::CamelCase
    }
}

/// Convert a name to the convention, keeping leading markers
pub fn convert_case(name: &str, convention: NamingConvention) -> String {
    let stripped = strip_markers(name);
    let markers = &name[..name.len() - stripped.len()];
    format!("{}{}", markers, join_words(&split_words(stripped), convention))
}
