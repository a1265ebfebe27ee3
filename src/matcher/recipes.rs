//! Text rules for the known page templates, matched against the output of
//! [`crate::utils::script::format`].

use std::sync::OnceLock;

use regex::Regex;

use crate::utils::script::quote_string;

macro_rules! cached_regex {
    ($pattern:expr) => {{
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($pattern).unwrap()).clone()
    }};
}

#[derive(Debug, Clone)]
pub enum Step {
    Strip { pattern: Regex, all: bool },
    Substitute {
        pattern: Regex,
        replacement: String,
        all: bool,
    },
    /// No match fails the whole rule.
    Capture { pattern: Regex, template: String },
    Literal(String),
}

impl Step {
    fn strip(pattern: Regex) -> Step {
        Step::Strip {
            pattern,
            all: false,
        }
    }

    fn strip_all(pattern: Regex) -> Step {
        Step::Strip { pattern, all: true }
    }

    fn capture(pattern: Regex) -> Step {
        Step::Capture {
            pattern,
            template: "$1".into(),
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        let result = match self {
            Step::Strip { pattern, all: true } => pattern.replace_all(text, "").into_owned(),
            Step::Strip { pattern, all: false } => pattern.replace(text, "").into_owned(),
            Step::Substitute {
                pattern,
                replacement,
                all: true,
            } => pattern.replace_all(text, replacement.as_str()).into_owned(),
            Step::Substitute {
                pattern,
                replacement,
                all: false,
            } => pattern.replace(text, replacement.as_str()).into_owned(),
            Step::Capture { pattern, template } => {
                let caps = pattern.captures(text)?;
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            }
            Step::Literal(value) => value.clone(),
        };
        Some(result)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub steps: Vec<Step>,
}

impl Rule {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn apply(&self, script: &str) -> Option<String> {
        self.steps
            .iter()
            .try_fold(script.to_owned(), |text, step| step.apply(&text))
    }
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: &'static str,
    pub variable: Rule,
    pub data: Rule,
}

impl Recipe {
    pub fn folder() -> Recipe {
        Recipe {
            name: "folder",
            variable: Rule::new(vec![
                strip_sms_helper(),
                strip_keyup_handler(),
                Step::capture(cached_regex!(r"([\s\S]+?)(?:function )?file\(\)")),
                strip_document_writes(),
            ]),
            data: Rule::new(vec![
                Step::strip(cached_regex!(r"function more\(\) \{[\s\S]+\}")),
                capture_ajax_greedy(),
            ]),
        }
    }

    pub fn folder_with_password(password: &str) -> Recipe {
        Recipe {
            name: "folder_with_password",
            variable: Rule::new(vec![
                strip_sms_helper(),
                strip_keyup_handler(),
                // every `pwd` line, so nothing outside `file()` can shadow it
                Step::Substitute {
                    pattern: cached_regex!(r"(?m)^([ \t]*)(var )?pwd = .*$"),
                    replacement: format!("${{1}}${{2}}pwd = {};", escape_replacement(password)),
                    all: true,
                },
                Step::Capture {
                    pattern: cached_regex!(r"^([\s\S]*?)function file\(\) \{\n([\s\S]*?)\$\.ajax"),
                    template: "${1}${2}".into(),
                },
                strip_document_writes(),
            ]),
            data: Rule::new(vec![
                Step::capture(cached_regex!(r"function file\(\) \{\n([\s\S]+?)\n\}\n")),
                capture_ajax_greedy(),
            ]),
        }
    }

    pub fn file() -> Recipe {
        Recipe {
            name: "file",
            variable: Rule::new(vec![
                strip_named_functions(),
                Step::capture(cached_regex!(r"([\s\S]+)\$\.ajax")),
            ]),
            data: Rule::new(vec![
                strip_named_functions(),
                Step::capture(cached_regex!(r"\$\.ajax\(([\s\S]+)\)")),
            ]),
        }
    }

    pub fn file_with_password(password: &str) -> Recipe {
        Recipe {
            name: "file_with_password",
            variable: Rule::new(vec![
                isolate_down_p(),
                Step::Substitute {
                    pattern: cached_regex!(r"var pwd.*?\n"),
                    replacement: format!("var pwd = {};\n", escape_replacement(password)),
                    all: false,
                },
                Step::capture(cached_regex!(r"([\s\S]+)\$\.ajax")),
            ]),
            data: Rule::new(vec![isolate_down_p(), capture_ajax_lazy()]),
        }
    }

    /// `param` is bound to the argument text of the challenge button's
    /// `onclick` handler.
    pub fn validation(param: &str, args: &str) -> Recipe {
        Recipe {
            name: "validation",
            variable: Rule::new(vec![Step::Literal(format!("var {param} = {args};"))]),
            data: Rule::new(vec![capture_ajax_greedy()]),
        }
    }

    pub fn file_more() -> Recipe {
        Recipe {
            name: "file_more",
            variable: Rule::new(vec![Step::Literal(
                "var pgs = 1; var folder_id = \"\";".into(),
            )]),
            data: Rule::new(vec![
                Step::strip_all(cached_regex!(r"\$\.each\([\s\S]+?\}\);")),
                capture_ajax_lazy(),
            ]),
        }
    }
}

fn strip_sms_helper() -> Step {
    Step::strip(cached_regex!(r"function sms[\s\S]+?\}"))
}

fn strip_keyup_handler() -> Step {
    Step::strip(cached_regex!(r"\$\(document\)\.keyup[\s\S]+?\}\);"))
}

fn strip_document_writes() -> Step {
    Step::strip_all(cached_regex!(r"document\..+?;"))
}

fn strip_named_functions() -> Step {
    Step::strip_all(cached_regex!(r"function .+?\(\) \{[\s\S]+?\}\n"))
}

fn isolate_down_p() -> Step {
    Step::capture(cached_regex!(r"function down_p\(\) \{([\s\S]+?)\n\}\n"))
}

fn capture_ajax_greedy() -> Step {
    Step::capture(cached_regex!(r"\$\.ajax\((\{[\s\S]+\})\);"))
}

fn capture_ajax_lazy() -> Step {
    Step::capture(cached_regex!(r"\$\.ajax\((\{[\s\S]+?\})\);"))
}

fn escape_replacement(value: &str) -> String {
    quote_string(value).replace('$', "$$")
}

/// Parameter name of the first function declared on a challenge page.
pub fn validation_param(page: &str) -> Option<&str> {
    static PARAM_RE: OnceLock<Regex> = OnceLock::new();
    PARAM_RE
        .get_or_init(|| Regex::new(r"function .+?\((.+?)\)").unwrap())
        .captures(page)
        .and_then(|caps| Some(caps.get(1)?.as_str()))
}

/// Selector of the element whose text switches to the "submitting" banner.
pub fn validation_target(page: &str) -> Option<&str> {
    static TARGET_RE: OnceLock<Regex> = OnceLock::new();
    TARGET_RE
        .get_or_init(|| Regex::new(r#"\$\("(.+)"\).+提交中"#).unwrap())
        .captures(page)
        .and_then(|caps| Some(caps.get(1)?.as_str()))
}

/// Argument list of an inline handler such as `down_r(2)`.
pub fn handler_arguments(onclick: &str) -> Option<&str> {
    static ARGS_RE: OnceLock<Regex> = OnceLock::new();
    ARGS_RE
        .get_or_init(|| Regex::new(r"\((.+)\)").unwrap())
        .captures(onclick)
        .and_then(|caps| Some(caps.get(1)?.as_str()))
}
