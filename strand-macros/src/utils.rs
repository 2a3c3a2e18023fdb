use proc_macro::{Spacing, TokenStream, TokenTree};

/// Options accepted by `#[main]` and `#[test]`.
#[derive(Default)]
pub(crate) struct EntryOptions {
    /// Runtime name, as a string literal token.
    pub(crate) name: Option<String>,
}

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
///
/// Commas nested inside groups (parentheses, brackets, braces) belong to a
/// single token tree and are therefore never split on.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens into a Rust source string.
///
/// Tokens are separated by a space, except after a punctuation character
/// that was joined to the next one in the input (the first `:` of `::`, the
/// `-` of `->`, the quote of a lifetime).
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut joint = true;

    for t in tokens {
        if !joint {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        joint = matches!(t, TokenTree::Punct(p) if p.spacing() == Spacing::Joint);
    }

    out
}

/// Returns `true` if the tokens at position `i` form a `=>` arrow.
fn is_arrow(tokens: &[TokenTree], i: usize) -> bool {
    if i + 1 >= tokens.len() {
        return false;
    }

    matches!(
        (&tokens[i], &tokens[i + 1]),
        (TokenTree::Punct(p1), TokenTree::Punct(p2))
            if p1.as_char() == '=' && p2.as_char() == '>'
    )
}

/// Branches of a `select!` invocation.
#[derive(Default)]
pub(crate) struct SelectBranches {
    /// `(future, handler)` pairs, in source order.
    pub(crate) futures: Vec<(String, String)>,

    /// Expression of the `complete => ...` branch.
    pub(crate) complete: Option<String>,

    /// Expression of the `default => ...` branch.
    pub(crate) default: Option<String>,
}

/// Parses `select`-style branches from a token stream.
///
/// Each branch is expected to have the form:
///
/// ```text
/// future_expr => handler_expr
/// ```
///
/// Multiple branches must be separated by commas. A branch whose left side
/// is the bare word `complete` or `default` is kept apart from the future
/// branches, and may appear at most once.
///
/// Incomplete branches are ignored.
pub(crate) fn parse_select_branches(input: TokenStream) -> Result<SelectBranches, String> {
    let mut branches = SelectBranches::default();

    for tokens in split_args(input) {
        let Some(arrow) = (0..tokens.len()).find(|&i| is_arrow(&tokens, i)) else {
            continue;
        };

        let future = tokens_to_string(&tokens[..arrow]);
        let handler = tokens_to_string(&tokens[arrow + 2..]);

        if future.trim().is_empty() || handler.trim().is_empty() {
            continue;
        }

        let keyword = match &tokens[..arrow] {
            [TokenTree::Ident(id)] => Some(id.to_string()),
            _ => None,
        };

        let slot = match keyword.as_deref() {
            Some("complete") => &mut branches.complete,
            Some("default") => &mut branches.default,
            _ => {
                branches.futures.push((future, handler));
                continue;
            }
        };

        if slot.replace(handler).is_some() {
            return Err(format!("duplicate `{future}` branch in select"));
        }
    }

    Ok(branches)
}

/// Parses the `name = "..."` option of the entry-point attributes.
pub(crate) fn parse_entry_options(attr: TokenStream) -> Result<EntryOptions, String> {
    let mut options = EntryOptions::default();

    for arg in split_args(attr) {
        match arg.as_slice() {
            [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)]
                if key.to_string() == "name" && eq.as_char() == '=' =>
            {
                let value = value.to_string();
                if !value.starts_with('"') {
                    return Err(String::from("`name` must be a string literal"));
                }
                options.name = Some(value);
            }
            other => {
                return Err(format!(
                    "unknown option `{}`, expected `name = \"...\"`",
                    tokens_to_string(other)
                ));
            }
        }
    }

    Ok(options)
}

/// Extracts the return type from the tokens between a function's argument
/// list and its body, stopping at a `where` clause.
pub(crate) fn return_type(tokens: &[TokenTree]) -> Option<String> {
    let [TokenTree::Punct(dash), TokenTree::Punct(gt), rest @ ..] = tokens else {
        return None;
    };

    if dash.as_char() != '-' || gt.as_char() != '>' {
        return None;
    }

    let end = rest
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "where"))
        .unwrap_or(rest.len());

    Some(tokens_to_string(&rest[..end]))
}

/// Parses generated source, or turns the failure into a `compile_error!`.
pub(crate) fn parse_or_error(source: &str, macro_name: &str) -> TokenStream {
    source
        .parse()
        .unwrap_or_else(|err| compile_error(&format!("{macro_name} macro error: {err}")))
}

pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
