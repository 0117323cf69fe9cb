//! [RFC 6570](https://www.rfc-editor.org/rfc/rfc6570) URI template expansion, up to level 4
//! modifiers (`*` and `:n`) for string and list values.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

const fn operator(
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
) -> Operator {
    Operator {
        first,
        separator,
        named,
        if_empty,
        allow_reserved,
    }
}

fn split_operator(expression: &str) -> (Operator, &str) {
    let tail = expression.get(1..).unwrap_or_default();
    match expression.chars().next() {
        Some('+') => (operator("", ",", false, "", true), tail),
        Some('#') => (operator("#", ",", false, "", true), tail),
        Some('.') => (operator(".", ".", false, "", false), tail),
        Some('/') => (operator("/", "/", false, "", false), tail),
        Some(';') => (operator(";", ";", true, "", false), tail),
        Some('?') => (operator("?", "&", true, "=", false), tail),
        Some('&') => (operator("&", "&", true, "=", false), tail),
        _ => (operator("", ",", false, "", false), expression),
    }
}

/// Expands `template`, asking `values` for the values of every variable.
///
/// Variables without values are left out, as required for undefined variables. An unterminated
/// expression is copied verbatim.
pub fn expand(template: &str, values: impl Fn(&str) -> Vec<String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let Some(length) = rest[start..].find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };
        expand_expression(&rest[start + 1..start + length], &values, &mut output);
        rest = &rest[start + length + 1..];
    }
    output.push_str(rest);
    output
}

/// Returns the names of the variables used in `template`, in order of appearance.
pub fn variables(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(length) = rest[start..].find('}') else {
            break;
        };
        let (_, specs) = split_operator(&rest[start + 1..start + length]);
        names.extend(specs.split(',').map(|spec| parse_varspec(spec).0));
        rest = &rest[start + length + 1..];
    }
    names
}

fn parse_varspec(spec: &str) -> (&str, bool, Option<usize>) {
    let spec = spec.trim();
    if let Some(name) = spec.strip_suffix('*') {
        return (name, true, None);
    }
    match spec.split_once(':') {
        Some((name, length)) => (name, false, length.parse().ok()),
        None => (spec, false, None),
    }
}

fn expand_expression(
    expression: &str,
    values: &impl Fn(&str) -> Vec<String>,
    output: &mut String,
) {
    let (operator, specs) = split_operator(expression);
    let mut first = true;
    for spec in specs.split(',') {
        let (name, explode, prefix) = parse_varspec(spec);
        let values = values(name);
        if values.is_empty() {
            continue;
        }
        output.push_str(if first {
            operator.first
        } else {
            operator.separator
        });
        first = false;

        let encoded = values
            .iter()
            .map(|value| encode(truncate(value, prefix), operator.allow_reserved))
            .collect::<Vec<_>>();
        if let [value] = encoded.as_slice() {
            push_value(output, &operator, name, value);
        } else if explode {
            for (i, value) in encoded.iter().enumerate() {
                if i > 0 {
                    output.push_str(operator.separator);
                }
                push_value(output, &operator, name, value);
            }
        } else {
            if operator.named {
                output.push_str(name);
                output.push('=');
            }
            output.push_str(&encoded.join(","));
        }
    }
}

fn push_value(output: &mut String, operator: &Operator, name: &str, value: &str) {
    if operator.named {
        output.push_str(name);
        if value.is_empty() {
            output.push_str(operator.if_empty);
            return;
        }
        output.push('=');
    }
    output.push_str(value);
}

fn truncate(value: &str, prefix: Option<usize>) -> &str {
    match prefix.and_then(|length| value.char_indices().nth(length)) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Everything except RFC 3986 unreserved characters is encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reserved expansion (`+` and `#`) additionally keeps the gen-delims and sub-delims.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

fn encode(value: &str, allow_reserved: bool) -> String {
    if !allow_reserved {
        return utf8_percent_encode(value, UNRESERVED).to_string();
    }
    // Existing pct-encoded triplets are copied as is.
    let mut output = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = find_triplet(rest) {
        output.extend(utf8_percent_encode(&rest[..start], RESERVED));
        output.push_str(&rest[start..start + 3]);
        rest = &rest[start + 3..];
    }
    output.extend(utf8_percent_encode(rest, RESERVED));
    output
}

fn find_triplet(value: &str) -> Option<usize> {
    let bytes = value.as_bytes();
    value.match_indices('%').map(|(i, _)| i).find(|&i| {
        bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
    })
}
